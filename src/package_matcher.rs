//! # Package Matcher Module
//!
//! Static catalog of funeral service packages and the scoring used to
//! recommend one of them from a completed funeral intake form.

use serde::{Deserialize, Serialize};

use crate::localization::t_lang;

/// Kind of funeral the client asks for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuneralType {
    Traditional,
    Cremation,
}

impl FuneralType {
    pub const ALL: [FuneralType; 2] = [FuneralType::Traditional, FuneralType::Cremation];

    pub fn as_str(self) -> &'static str {
        match self {
            FuneralType::Traditional => "traditional",
            FuneralType::Cremation => "cremation",
        }
    }

    /// Accepts the button tag or a typed answer such as "кремация"
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "traditional" => return Some(FuneralType::Traditional),
            "cremation" => return Some(FuneralType::Cremation),
            _ => {}
        }
        if normalized.contains("кремац") || normalized.contains("cremat") {
            Some(FuneralType::Cremation)
        } else if normalized.contains("традиц") || normalized.contains("погреб") || normalized.contains("tradition") {
            Some(FuneralType::Traditional)
        } else {
            None
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            FuneralType::Traditional => "funeral-type-traditional",
            FuneralType::Cremation => "funeral-type-cremation",
        }
    }
}

/// Individual service that can be requested or bundled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceTag {
    Transport,
    Documents,
    Service,
    Coffin,
    Wreaths,
    Music,
    Hall,
    Flowers,
}

impl ServiceTag {
    pub const ALL: [ServiceTag; 8] = [
        ServiceTag::Transport,
        ServiceTag::Documents,
        ServiceTag::Service,
        ServiceTag::Coffin,
        ServiceTag::Wreaths,
        ServiceTag::Music,
        ServiceTag::Hall,
        ServiceTag::Flowers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceTag::Transport => "transport",
            ServiceTag::Documents => "documents",
            ServiceTag::Service => "service",
            ServiceTag::Coffin => "coffin",
            ServiceTag::Wreaths => "wreaths",
            ServiceTag::Music => "music",
            ServiceTag::Hall => "hall",
            ServiceTag::Flowers => "flowers",
        }
    }

    /// Accepts the tag itself or a Russian word stem of the service
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_lowercase();
        if let Some(tag) = Self::ALL.iter().find(|tag| tag.as_str() == normalized) {
            return Some(*tag);
        }

        const STEMS: [(&str, ServiceTag); 10] = [
            ("транспорт", ServiceTag::Transport),
            ("перевоз", ServiceTag::Transport),
            ("документ", ServiceTag::Documents),
            ("отпеван", ServiceTag::Service),
            ("гроб", ServiceTag::Coffin),
            ("венк", ServiceTag::Wreaths),
            ("венок", ServiceTag::Wreaths),
            ("музык", ServiceTag::Music),
            ("зал", ServiceTag::Hall),
            ("цвет", ServiceTag::Flowers),
        ];
        STEMS
            .iter()
            .find(|(stem, _)| normalized.contains(stem))
            .map(|(_, tag)| *tag)
    }

    pub fn label_key(self) -> &'static str {
        match self {
            ServiceTag::Transport => "service-transport",
            ServiceTag::Documents => "service-documents",
            ServiceTag::Service => "service-service",
            ServiceTag::Coffin => "service-coffin",
            ServiceTag::Wreaths => "service-wreaths",
            ServiceTag::Music => "service-music",
            ServiceTag::Hall => "service-hall",
            ServiceTag::Flowers => "service-flowers",
        }
    }
}

/// Budget bracket of a request or a package
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetTier {
    #[serde(rename = "less_30k")]
    Less30k,
    #[serde(rename = "30k_60k")]
    From30kTo60k,
    #[serde(rename = "more_60k")]
    More60k,
}

impl BudgetTier {
    pub const ALL: [BudgetTier; 3] = [BudgetTier::Less30k, BudgetTier::From30kTo60k, BudgetTier::More60k];

    pub fn as_str(self) -> &'static str {
        match self {
            BudgetTier::Less30k => "less_30k",
            BudgetTier::From30kTo60k => "30k_60k",
            BudgetTier::More60k => "more_60k",
        }
    }

    /// Accepts the tier tag or a plain amount in rubles
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_lowercase();
        if let Some(tier) = Self::ALL.iter().find(|tier| tier.as_str() == normalized) {
            return Some(*tier);
        }

        let digits: String = normalized.chars().filter(|c| !c.is_whitespace()).collect();
        let amount = digits.parse::<u64>().ok()?;
        Some(if amount < 30_000 {
            BudgetTier::Less30k
        } else if amount <= 60_000 {
            BudgetTier::From30kTo60k
        } else {
            BudgetTier::More60k
        })
    }

    pub fn label_key(self) -> &'static str {
        match self {
            BudgetTier::Less30k => "budget-less-30k",
            BudgetTier::From30kTo60k => "budget-30k-60k",
            BudgetTier::More60k => "budget-more-60k",
        }
    }
}

/// A pre-priced bundle of services
#[derive(Debug, Clone, PartialEq)]
pub struct ServicePackage {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: u32,
    pub services: &'static [ServiceTag],
    pub funeral_type: FuneralType,
    pub budget: BudgetTier,
}

pub static PACKAGES: [ServicePackage; 6] = [
    ServicePackage {
        id: "basic_traditional",
        name: "Базовый пакет (Традиционные похороны)",
        description: "Включает: транспортировку, оформление документов, гроб стандартный, венок, зал прощания",
        price: 25_000,
        services: &[
            ServiceTag::Transport,
            ServiceTag::Documents,
            ServiceTag::Coffin,
            ServiceTag::Wreaths,
            ServiceTag::Hall,
        ],
        funeral_type: FuneralType::Traditional,
        budget: BudgetTier::Less30k,
    },
    ServicePackage {
        id: "premium_traditional",
        name: "Премиум пакет (Традиционные похороны)",
        description: "Включает: транспортировку, оформление документов, гроб премиум, венки, зал прощания, отпевание, музыка",
        price: 45_000,
        services: &[
            ServiceTag::Transport,
            ServiceTag::Documents,
            ServiceTag::Coffin,
            ServiceTag::Wreaths,
            ServiceTag::Hall,
            ServiceTag::Service,
            ServiceTag::Music,
        ],
        funeral_type: FuneralType::Traditional,
        budget: BudgetTier::From30kTo60k,
    },
    ServicePackage {
        id: "luxury_traditional",
        name: "Люкс пакет (Традиционные похороны)",
        description: "Включает: все услуги + премиум гроб, цветы, расширенное отпевание",
        price: 75_000,
        services: &[
            ServiceTag::Transport,
            ServiceTag::Documents,
            ServiceTag::Coffin,
            ServiceTag::Wreaths,
            ServiceTag::Hall,
            ServiceTag::Service,
            ServiceTag::Music,
            ServiceTag::Flowers,
        ],
        funeral_type: FuneralType::Traditional,
        budget: BudgetTier::More60k,
    },
    ServicePackage {
        id: "basic_cremation",
        name: "Базовый пакет (Кремация)",
        description: "Включает: транспортировку, оформление документов, урну стандартную",
        price: 20_000,
        services: &[ServiceTag::Transport, ServiceTag::Documents],
        funeral_type: FuneralType::Cremation,
        budget: BudgetTier::Less30k,
    },
    ServicePackage {
        id: "premium_cremation",
        name: "Премиум пакет (Кремация)",
        description: "Включает: транспортировку, оформление документов, урну премиум, зал прощания",
        price: 35_000,
        services: &[ServiceTag::Transport, ServiceTag::Documents, ServiceTag::Hall],
        funeral_type: FuneralType::Cremation,
        budget: BudgetTier::From30kTo60k,
    },
    ServicePackage {
        id: "luxury_cremation",
        name: "Люкс пакет (Кремация)",
        description: "Включает: все услуги + премиум урна, отпевание, музыка",
        price: 55_000,
        services: &[
            ServiceTag::Transport,
            ServiceTag::Documents,
            ServiceTag::Hall,
            ServiceTag::Service,
            ServiceTag::Music,
        ],
        funeral_type: FuneralType::Cremation,
        budget: BudgetTier::More60k,
    },
];

/// Scores how well a package fits the requested services and budget
pub fn score_package(package: &ServicePackage, services: &[ServiceTag], budget: BudgetTier) -> f64 {
    let mut score = 0.0;

    if package.budget == budget {
        score += 3.0;
    } else if package.budget == BudgetTier::From30kTo60k
        && matches!(budget, BudgetTier::Less30k | BudgetTier::More60k)
    {
        // only the middle tier counts as adjacent to an extreme request
        score += 1.0;
    }

    for service in services {
        if package.services.contains(service) {
            score += 1.0;
        }
    }

    for service in package.services {
        if !services.contains(service) {
            score += 0.5;
        }
    }

    score
}

/// Picks the best package of the requested funeral type.
///
/// Ties keep the package that comes first in [`PACKAGES`].
pub fn select_package(
    funeral_type: FuneralType,
    services: &[ServiceTag],
    budget: BudgetTier,
) -> Option<&'static ServicePackage> {
    let mut best: Option<(&'static ServicePackage, f64)> = None;

    for package in PACKAGES.iter().filter(|p| p.funeral_type == funeral_type) {
        let score = score_package(package, services, budget);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((package, score)),
        }
    }

    best.map(|(package, _)| package)
}

/// Formats a price with thin grouping, e.g. `35 000`
pub fn format_price(price: f64) -> String {
    let whole = price.trunc() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        grouped.insert(0, '-');
    }

    let cents = ((price.fract().abs()) * 100.0).round() as i64;
    if cents > 0 {
        format!("{grouped},{cents:02}")
    } else {
        grouped
    }
}

/// Renders a package card as HTML for Telegram
pub fn format_package(package: &ServicePackage, language_code: Option<&str>) -> String {
    let services = package
        .services
        .iter()
        .map(|s| format!("• {}", t_lang(s.label_key(), language_code)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "📦 <b>{}</b>\n\n{}\n\n💰 <b>{}:</b> {} ₽\n\n<b>{}:</b>\n{}",
        package.name,
        package.description,
        t_lang("package-price", language_code),
        format_price(package.price as f64),
        t_lang("package-services", language_code),
        services
    )
}
