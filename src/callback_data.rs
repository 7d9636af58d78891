//! # Callback Data Module
//!
//! Typed inline button payloads. Payloads are short colon-delimited tokens
//! such as `shop:category:coffin`, `product:select:42` or
//! `add_product:price:confirm`, kept well under Telegram's 64 byte limit.

use std::fmt;
use std::str::FromStr;

use crate::conversation::Input;
use crate::dialogue::{Flow, FuneralField, ProductCategory, ProductField, RemovalStep};
use crate::package_matcher::{BudgetTier, FuneralType, ServiceTag};

/// Which memory records a listing shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordScope {
    Mine,
    All,
}

impl RecordScope {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordScope::Mine => "my",
            RecordScope::All => "all",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "my" => Some(RecordScope::Mine),
            "all" => Some(RecordScope::All),
            _ => None,
        }
    }
}

/// Buttons shared by the summary screens of the forms
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormAction {
    Confirm,
    Edit,
    EditField(String),
    Cancel,
}

impl FormAction {
    fn to_input(&self) -> Input {
        match self {
            FormAction::Confirm => Input::Confirm,
            FormAction::Edit => Input::Change,
            FormAction::EditField(key) => Input::EditField(key.clone()),
            FormAction::Cancel => Input::Cancel,
        }
    }

    fn parse(parts: &[&str]) -> Option<Self> {
        match parts {
            ["confirm"] => Some(FormAction::Confirm),
            ["edit"] => Some(FormAction::Edit),
            ["edit", field] => Some(FormAction::EditField(field.to_string())),
            ["cancel"] => Some(FormAction::Cancel),
            _ => None,
        }
    }

    fn encode(&self, prefix: &str) -> String {
        match self {
            FormAction::Confirm => format!("{prefix}:confirm"),
            FormAction::Edit => format!("{prefix}:edit"),
            FormAction::EditField(field) => format!("{prefix}:edit:{field}"),
            FormAction::Cancel => format!("{prefix}:cancel"),
        }
    }
}

/// Every inline button the bot sends
#[derive(Clone, Debug, PartialEq)]
pub enum CallbackData {
    /// `None` lists every category
    ShopCategory(Option<ProductCategory>),
    ShopNav {
        category: Option<ProductCategory>,
        index: usize,
    },
    ShopInfo,
    ShopBack,
    ProductSelect(i64),

    MemoryCreate,
    MemoryRecords(RecordScope),
    MemoryNav { scope: RecordScope, index: usize },
    MemoryCandle(i64),
    MemoryBack,
    MemoryInfo,
    MemoryForm(FormAction),

    RegistrationStart,
    RegistrationMyData,
    RegistrationVerify,
    RegistrationBack,
    Registration(FormAction),

    FuneralType(FuneralType),
    FuneralService(ServiceTag),
    FuneralServicesDone,
    FuneralBudget(BudgetTier),
    Funeral(FormAction),

    AddProductCategory(ProductCategory),
    AddProductField { field: ProductField, confirm: bool },
    RemoveProductCategory(ProductCategory),
    RemoveProductDelete(i64),

    AiAskAgain,
    AiToMain,

    VoiceConfirm,
    VoiceEdit,
    VoiceCancel,
}

fn category_token(category: Option<ProductCategory>) -> &'static str {
    category.map(ProductCategory::as_str).unwrap_or("all")
}

fn parse_category_filter(token: &str) -> Option<Option<ProductCategory>> {
    if token == "all" {
        Some(None)
    } else {
        ProductCategory::parse(token).map(Some)
    }
}

fn funeral_choice(field: FuneralField, value: &str) -> (Flow, Input) {
    (Flow::Funeral, Input::choice(field.key(), value))
}

impl CallbackData {
    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn parse(data: &str) -> Option<Self> {
        let parts: Vec<&str> = data.split(':').collect();
        let data = match parts.as_slice() {
            ["shop", "category", c] => CallbackData::ShopCategory(parse_category_filter(c)?),
            ["shop", "nav", c, i] => CallbackData::ShopNav {
                category: parse_category_filter(c)?,
                index: i.parse().ok()?,
            },
            ["shop", "info"] => CallbackData::ShopInfo,
            ["shop", "back"] => CallbackData::ShopBack,
            ["product", "select", id] => CallbackData::ProductSelect(id.parse().ok()?),

            ["memory", "create"] => CallbackData::MemoryCreate,
            ["memory", "my_records"] => CallbackData::MemoryRecords(RecordScope::Mine),
            ["memory", "all_records"] => CallbackData::MemoryRecords(RecordScope::All),
            ["memory", "nav", scope, i] => CallbackData::MemoryNav {
                scope: RecordScope::parse(scope)?,
                index: i.parse().ok()?,
            },
            ["memory", "candle", id] => CallbackData::MemoryCandle(id.parse().ok()?),
            ["memory", "back"] => CallbackData::MemoryBack,
            ["memory", "info"] => CallbackData::MemoryInfo,
            ["memory_form", rest @ ..] => CallbackData::MemoryForm(FormAction::parse(rest)?),

            ["registration", "start"] => CallbackData::RegistrationStart,
            ["registration", "my_data"] => CallbackData::RegistrationMyData,
            ["registration", "verify"] => CallbackData::RegistrationVerify,
            ["registration", "back"] => CallbackData::RegistrationBack,
            ["registration", rest @ ..] => CallbackData::Registration(FormAction::parse(rest)?),

            ["funeral", "type", t] => CallbackData::FuneralType(FuneralType::parse(t)?),
            ["funeral", "service", tag] => CallbackData::FuneralService(ServiceTag::parse(tag)?),
            ["funeral", "services", "done"] => CallbackData::FuneralServicesDone,
            ["funeral", "budget", tier] => CallbackData::FuneralBudget(BudgetTier::parse(tier)?),
            ["funeral", rest @ ..] => CallbackData::Funeral(FormAction::parse(rest)?),

            ["add_product", "category", c] => CallbackData::AddProductCategory(ProductCategory::parse(c)?),
            ["add_product", field, action] => CallbackData::AddProductField {
                field: ProductField::from_key(field)?,
                confirm: match *action {
                    "confirm" => true,
                    "change" => false,
                    _ => return None,
                },
            },
            ["remove_product", "category", c] => {
                CallbackData::RemoveProductCategory(ProductCategory::parse(c)?)
            }
            ["remove_product", "delete", id] => CallbackData::RemoveProductDelete(id.parse().ok()?),

            ["ai_lawyer", "ask_again"] => CallbackData::AiAskAgain,
            ["ai_lawyer", "to_main"] => CallbackData::AiToMain,

            ["voice", "confirm"] => CallbackData::VoiceConfirm,
            ["voice", "edit"] => CallbackData::VoiceEdit,
            ["voice", "cancel"] => CallbackData::VoiceCancel,
            _ => return None,
        };
        Some(data)
    }

    /// The flow a form button belongs to and the input it stands for.
    ///
    /// Buttons that only navigate return `None`.
    pub fn form_input(&self) -> Option<(Flow, Input)> {
        let pair = match self {
            CallbackData::MemoryForm(action) => (Flow::Memory, action.to_input()),
            CallbackData::Registration(action) => (Flow::Registration, action.to_input()),
            CallbackData::Funeral(action) => (Flow::Funeral, action.to_input()),
            CallbackData::FuneralType(t) => funeral_choice(FuneralField::FuneralType, t.as_str()),
            CallbackData::FuneralService(s) => funeral_choice(FuneralField::Services, s.as_str()),
            CallbackData::FuneralServicesDone => (Flow::Funeral, Input::Done),
            CallbackData::FuneralBudget(b) => funeral_choice(FuneralField::Budget, b.as_str()),
            CallbackData::AddProductCategory(c) => {
                (Flow::AddProduct, Input::choice(ProductField::Category.key(), c.as_str()))
            }
            CallbackData::AddProductField { field, confirm } => {
                let key = field.key().to_string();
                (
                    Flow::AddProduct,
                    if *confirm { Input::ConfirmField(key) } else { Input::ChangeField(key) },
                )
            }
            CallbackData::RemoveProductCategory(c) => {
                (Flow::RemoveProduct, Input::choice(RemovalStep::ChooseCategory.key(), c.as_str()))
            }
            CallbackData::RemoveProductDelete(id) => {
                (Flow::RemoveProduct, Input::choice(RemovalStep::ID_KEY, &id.to_string()))
            }
            _ => return None,
        };
        Some(pair)
    }
}

impl fmt::Display for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackData::ShopCategory(c) => write!(f, "shop:category:{}", category_token(*c)),
            CallbackData::ShopNav { category, index } => {
                write!(f, "shop:nav:{}:{index}", category_token(*category))
            }
            CallbackData::ShopInfo => write!(f, "shop:info"),
            CallbackData::ShopBack => write!(f, "shop:back"),
            CallbackData::ProductSelect(id) => write!(f, "product:select:{id}"),

            CallbackData::MemoryCreate => write!(f, "memory:create"),
            CallbackData::MemoryRecords(RecordScope::Mine) => write!(f, "memory:my_records"),
            CallbackData::MemoryRecords(RecordScope::All) => write!(f, "memory:all_records"),
            CallbackData::MemoryNav { scope, index } => write!(f, "memory:nav:{}:{index}", scope.as_str()),
            CallbackData::MemoryCandle(id) => write!(f, "memory:candle:{id}"),
            CallbackData::MemoryBack => write!(f, "memory:back"),
            CallbackData::MemoryInfo => write!(f, "memory:info"),
            CallbackData::MemoryForm(action) => f.write_str(&action.encode("memory_form")),

            CallbackData::RegistrationStart => write!(f, "registration:start"),
            CallbackData::RegistrationMyData => write!(f, "registration:my_data"),
            CallbackData::RegistrationVerify => write!(f, "registration:verify"),
            CallbackData::RegistrationBack => write!(f, "registration:back"),
            CallbackData::Registration(action) => f.write_str(&action.encode("registration")),

            CallbackData::FuneralType(t) => write!(f, "funeral:type:{}", t.as_str()),
            CallbackData::FuneralService(s) => write!(f, "funeral:service:{}", s.as_str()),
            CallbackData::FuneralServicesDone => write!(f, "funeral:services:done"),
            CallbackData::FuneralBudget(b) => write!(f, "funeral:budget:{}", b.as_str()),
            CallbackData::Funeral(action) => f.write_str(&action.encode("funeral")),

            CallbackData::AddProductCategory(c) => write!(f, "add_product:category:{}", c.as_str()),
            CallbackData::AddProductField { field, confirm } => write!(
                f,
                "add_product:{}:{}",
                field.key(),
                if *confirm { "confirm" } else { "change" }
            ),
            CallbackData::RemoveProductCategory(c) => write!(f, "remove_product:category:{}", c.as_str()),
            CallbackData::RemoveProductDelete(id) => write!(f, "remove_product:delete:{id}"),

            CallbackData::AiAskAgain => write!(f, "ai_lawyer:ask_again"),
            CallbackData::AiToMain => write!(f, "ai_lawyer:to_main"),

            CallbackData::VoiceConfirm => write!(f, "voice:confirm"),
            CallbackData::VoiceEdit => write!(f, "voice:edit"),
            CallbackData::VoiceCancel => write!(f, "voice:cancel"),
        }
    }
}

impl FromStr for CallbackData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CallbackData::parse(s).ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payloads_from_the_wire() {
        assert_eq!(
            CallbackData::parse("shop:category:coffin"),
            Some(CallbackData::ShopCategory(Some(ProductCategory::Coffin)))
        );
        assert_eq!(CallbackData::parse("shop:category:all"), Some(CallbackData::ShopCategory(None)));
        assert_eq!(CallbackData::parse("product:select:42"), Some(CallbackData::ProductSelect(42)));
        assert_eq!(CallbackData::parse("memory:candle:7"), Some(CallbackData::MemoryCandle(7)));
        assert_eq!(
            CallbackData::parse("add_product:price:confirm"),
            Some(CallbackData::AddProductField {
                field: ProductField::Price,
                confirm: true
            })
        );
        assert_eq!(
            CallbackData::parse("registration:edit:phone"),
            Some(CallbackData::Registration(FormAction::EditField("phone".into())))
        );
        assert_eq!(CallbackData::parse("registration:start"), Some(CallbackData::RegistrationStart));
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        assert_eq!(CallbackData::parse(""), None);
        assert_eq!(CallbackData::parse("product:select:abc"), None);
        assert_eq!(CallbackData::parse("shop:category:urns"), None);
        assert_eq!(CallbackData::parse("add_product:price:maybe"), None);
        assert_eq!(CallbackData::parse("memory:nav:others:1"), None);
        assert!("voice:shout".parse::<CallbackData>().is_err());
    }

    #[test]
    fn test_encoded_payloads_parse_back() {
        let samples = [
            CallbackData::ShopNav {
                category: Some(ProductCategory::Wreath),
                index: 3,
            },
            CallbackData::MemoryNav {
                scope: RecordScope::Mine,
                index: 0,
            },
            CallbackData::FuneralBudget(BudgetTier::From30kTo60k),
            CallbackData::MemoryForm(FormAction::EditField("death_date".into())),
            CallbackData::RemoveProductDelete(12),
        ];
        for data in samples {
            let encoded = data.encode();
            assert!(encoded.len() <= 64, "{encoded} exceeds the payload limit");
            assert_eq!(CallbackData::parse(&encoded), Some(data));
        }
    }

    #[test]
    fn test_form_inputs() {
        assert_eq!(
            CallbackData::FuneralService(ServiceTag::Hall).form_input(),
            Some((Flow::Funeral, Input::choice("services", "hall")))
        );
        assert_eq!(
            CallbackData::AddProductField {
                field: ProductField::Name,
                confirm: true
            }
            .form_input(),
            Some((Flow::AddProduct, Input::ConfirmField("name".into())))
        );
        assert_eq!(
            CallbackData::Registration(FormAction::Cancel).form_input(),
            Some((Flow::Registration, Input::Cancel))
        );
        assert_eq!(CallbackData::ShopBack.form_input(), None);
    }
}
