//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import domain types
use crate::callback_data::{CallbackData, FormAction, RecordScope};
use crate::db::{ClientData, MemoryRecord, Product, UserStats};
use crate::dialogue::{
    FuneralDraft, FuneralField, MemoryDraft, MemoryField, ProductCategory, ProductField, RegistrationDraft,
    RegistrationField,
};
use crate::package_matcher::{format_price, BudgetTier, FuneralType, ServiceTag};
use crate::validation::ValidationError;

/// Escapes text for Telegram HTML messages
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn callback_button(text: impl Into<String>, data: CallbackData) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.into(), data.encode())
}

/// Main reply keyboard, two buttons per row
pub fn main_menu_keyboard(is_admin: bool, language_code: Option<&str>) -> KeyboardMarkup {
    let mut keys = vec![
        "menu-funeral",
        "menu-assistant",
        "menu-shop",
        "menu-memory",
        "menu-registration",
    ];
    if is_admin {
        keys.push("menu-admin");
    }
    keys.push("menu-main");
    keys.push("menu-help");

    let rows = keys
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|key| KeyboardButton::new(t_lang(key, language_code)))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    KeyboardMarkup::new(rows).resize_keyboard()
}

pub fn admin_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    let rows = ["admin-add-product", "admin-remove-product", "admin-stats", "admin-back"]
        .iter()
        .map(|key| vec![KeyboardButton::new(t_lang(key, language_code))])
        .collect::<Vec<_>>();

    KeyboardMarkup::new(rows).resize_keyboard()
}

pub fn cancel_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(t_lang("button-cancel", language_code))]])
        .resize_keyboard()
}

/// Keyboard of a step that may be skipped
pub fn skip_cancel_keyboard(language_code: Option<&str>) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(t_lang("button-skip", language_code)),
        KeyboardButton::new(t_lang("button-cancel", language_code)),
    ]])
    .resize_keyboard()
}

/// Confirm / edit / cancel buttons under a form summary
pub fn form_confirm_keyboard(wrap: fn(FormAction) -> CallbackData, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            callback_button(t_lang("button-confirm", language_code), wrap(FormAction::Confirm)),
            callback_button(t_lang("button-edit", language_code), wrap(FormAction::Edit)),
        ],
        vec![callback_button(t_lang("button-cancel", language_code), wrap(FormAction::Cancel))],
    ])
}

/// One button per editable field, two per row
pub fn field_choice_keyboard(
    fields: &[(&str, String)],
    wrap: fn(FormAction) -> CallbackData,
) -> InlineKeyboardMarkup {
    let rows = fields
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|(key, label)| callback_button(label.clone(), wrap(FormAction::EditField(key.to_string()))))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(rows)
}

pub fn registration_field_label(field: RegistrationField, language_code: Option<&str>) -> String {
    t_lang(&format!("reg-field-{}", field.key()), language_code)
}

pub fn funeral_field_label(field: FuneralField, language_code: Option<&str>) -> String {
    t_lang(&format!("funeral-field-{}", field.key()), language_code)
}

pub fn memory_field_label(field: MemoryField, language_code: Option<&str>) -> String {
    t_lang(&format!("memory-field-{}", field.key()), language_code)
}

pub fn product_field_label(field: ProductField, language_code: Option<&str>) -> String {
    t_lang(&format!("product-field-{}", field.key()), language_code)
}

pub fn registration_fields_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    let fields = RegistrationField::ALL
        .iter()
        .map(|f| (f.key(), registration_field_label(*f, language_code)))
        .collect::<Vec<_>>();
    field_choice_keyboard(&fields, CallbackData::Registration)
}

pub fn funeral_fields_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    let fields = FuneralField::ALL
        .iter()
        .map(|f| (f.key(), funeral_field_label(*f, language_code)))
        .collect::<Vec<_>>();
    field_choice_keyboard(&fields, CallbackData::Funeral)
}

pub fn memory_fields_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    let fields = MemoryField::ALL
        .iter()
        .map(|f| (f.key(), memory_field_label(*f, language_code)))
        .collect::<Vec<_>>();
    field_choice_keyboard(&fields, CallbackData::MemoryForm)
}

/// Localized text of a rejected input
pub fn validation_message(error: &ValidationError, language_code: Option<&str>) -> String {
    let args = error.message_args();
    let args = args.iter().map(|(k, v)| (*k, v.as_str())).collect::<Vec<_>>();
    format!("⚠️ {}", t_args_lang(error.message_key(), &args, language_code))
}

// ---- Registration ----

pub fn registration_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![callback_button(t_lang("registration-button-start", language_code), CallbackData::RegistrationStart)],
        vec![callback_button(t_lang("registration-button-my-data", language_code), CallbackData::RegistrationMyData)],
    ])
}

pub fn client_data_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            callback_button(t_lang("button-edit", language_code), CallbackData::Registration(FormAction::Edit)),
            callback_button(t_lang("registration-button-verify", language_code), CallbackData::RegistrationVerify),
        ],
        vec![callback_button(t_lang("button-back", language_code), CallbackData::RegistrationBack)],
    ])
}

fn registration_lines(draft: &RegistrationDraft, language_code: Option<&str>) -> String {
    let not_set = t_lang("value-not-set", language_code);
    RegistrationField::ALL
        .iter()
        .map(|field| {
            format!(
                "<b>{}:</b> {}",
                registration_field_label(*field, language_code),
                draft.value(*field).map(html_escape).unwrap_or_else(|| not_set.clone())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summary shown before a registration is saved
pub fn format_registration_summary(draft: &RegistrationDraft, language_code: Option<&str>) -> String {
    format!(
        "📋 <b>{}</b>\n\n{}\n\n{}",
        t_lang("registration-summary-title", language_code),
        registration_lines(draft, language_code),
        t_lang("summary-confirm-hint", language_code)
    )
}

/// Stored profile as shown by "my data"
pub fn format_client_data(data: &ClientData, is_verified: bool, language_code: Option<&str>) -> String {
    let draft = RegistrationDraft::from(data);
    let status = if is_verified {
        t_lang("registration-status-verified", language_code)
    } else {
        t_lang("registration-status-unverified", language_code)
    };
    format!(
        "👤 <b>{}</b>\n\n{}\n\n{}",
        t_lang("registration-my-data-title", language_code),
        registration_lines(&draft, language_code),
        status
    )
}

// ---- Funeral ----

pub fn funeral_type_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        FuneralType::ALL
            .iter()
            .map(|t| vec![callback_button(t_lang(t.label_key(), language_code), CallbackData::FuneralType(*t))])
            .collect::<Vec<_>>(),
    )
}

/// Service toggles, selected ones marked with a check
pub fn services_keyboard(selected: &[ServiceTag], language_code: Option<&str>) -> InlineKeyboardMarkup {
    let mut rows = ServiceTag::ALL
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|service| {
                    let label = t_lang(service.label_key(), language_code);
                    let text = if selected.contains(service) {
                        format!("✅ {label}")
                    } else {
                        label
                    };
                    callback_button(text, CallbackData::FuneralService(*service))
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    rows.push(vec![callback_button(
        t_lang("funeral-services-done", language_code),
        CallbackData::FuneralServicesDone,
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub fn budget_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        BudgetTier::ALL
            .iter()
            .map(|b| vec![callback_button(t_lang(b.label_key(), language_code), CallbackData::FuneralBudget(*b))])
            .collect::<Vec<_>>(),
    )
}

fn services_list(services: &[ServiceTag], language_code: Option<&str>) -> String {
    services
        .iter()
        .map(|s| t_lang(s.label_key(), language_code))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_funeral_summary(draft: &FuneralDraft, language_code: Option<&str>) -> String {
    let not_set = t_lang("value-not-set", language_code);
    let services = if draft.services.is_empty() {
        not_set.clone()
    } else {
        services_list(&draft.services, language_code)
    };

    let lines = [
        (
            FuneralField::BodyLocation,
            draft.body_location.as_deref().map(html_escape).unwrap_or_else(|| not_set.clone()),
        ),
        (
            FuneralField::FuneralType,
            draft
                .funeral_type
                .map(|t| t_lang(t.label_key(), language_code))
                .unwrap_or_else(|| not_set.clone()),
        ),
        (FuneralField::Services, services),
        (
            FuneralField::Budget,
            draft
                .budget
                .map(|b| t_lang(b.label_key(), language_code))
                .unwrap_or_else(|| not_set.clone()),
        ),
    ]
    .iter()
    .map(|(field, value)| format!("<b>{}:</b> {}", funeral_field_label(*field, language_code), value))
    .collect::<Vec<_>>()
    .join("\n");

    format!(
        "📋 <b>{}</b>\n\n{}\n\n{}",
        t_lang("funeral-summary-title", language_code),
        lines,
        t_lang("summary-confirm-hint", language_code)
    )
}

// ---- Memory corner ----

pub fn memory_menu_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![callback_button(t_lang("memory-button-create", language_code), CallbackData::MemoryCreate)],
        vec![callback_button(
            t_lang("memory-button-my-records", language_code),
            CallbackData::MemoryRecords(RecordScope::Mine),
        )],
        vec![callback_button(
            t_lang("memory-button-all-records", language_code),
            CallbackData::MemoryRecords(RecordScope::All),
        )],
    ])
}

pub fn format_memory_summary(draft: &MemoryDraft, language_code: Option<&str>) -> String {
    let not_set = t_lang("value-not-set", language_code);
    let photo = if draft.photo_file_id.is_some() {
        t_lang("memory-photo-attached", language_code)
    } else {
        t_lang("memory-photo-none", language_code)
    };
    let text_value = |value: &Option<String>| value.as_deref().map(html_escape).unwrap_or_else(|| not_set.clone());

    let lines = [
        (MemoryField::Photo, photo),
        (MemoryField::Name, text_value(&draft.name)),
        (MemoryField::BirthDate, text_value(&draft.birth_date)),
        (MemoryField::DeathDate, text_value(&draft.death_date)),
        (MemoryField::MemoryText, text_value(&draft.memory_text)),
    ]
    .iter()
    .map(|(field, value)| format!("<b>{}:</b> {}", memory_field_label(*field, language_code), value))
    .collect::<Vec<_>>()
    .join("\n");

    format!(
        "📋 <b>{}</b>\n\n{}\n\n{}",
        t_lang("memory-summary-title", language_code),
        lines,
        t_lang("summary-confirm-hint", language_code)
    )
}

pub fn format_memory_record(record: &MemoryRecord, language_code: Option<&str>) -> String {
    let name = html_escape(&record.name);
    let candles = record.candles_count.to_string();
    [
        format!(
            "🕯️ <b>{}</b>",
            t_args_lang("memory-record-title", &[("name", name.as_str())], language_code)
        ),
        format!(
            "📅 <b>{}:</b> {} — {}",
            t_lang("memory-record-years", language_code),
            html_escape(&record.birth_date),
            html_escape(&record.death_date)
        ),
        format!("💭 <b>{}:</b>\n{}", t_lang("memory-record-text", language_code), html_escape(&record.memory_text)),
        format!("🕯️ {}", t_args_lang("memory-record-candles", &[("count", candles.as_str())], language_code)),
    ]
    .join("\n\n")
}

/// Buttons of a memory record card; paging shows only for several records
pub fn memory_record_keyboard(
    record_id: i64,
    scope: Option<RecordScope>,
    index: usize,
    total: usize,
    can_light: bool,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();

    if let Some(scope) = scope.filter(|_| total > 1) {
        rows.push(vec![
            callback_button(
                "⬅️",
                CallbackData::MemoryNav {
                    scope,
                    index: (index + total - 1) % total,
                },
            ),
            callback_button(format!("{}/{}", index + 1, total), CallbackData::MemoryInfo),
            callback_button(
                "➡️",
                CallbackData::MemoryNav {
                    scope,
                    index: (index + 1) % total,
                },
            ),
        ]);
    }
    if can_light {
        rows.push(vec![callback_button(
            t_lang("memory-button-candle", language_code),
            CallbackData::MemoryCandle(record_id),
        )]);
    }
    rows.push(vec![callback_button(t_lang("button-back", language_code), CallbackData::MemoryBack)]);

    InlineKeyboardMarkup::new(rows)
}

// ---- Shop ----

pub fn shop_categories_keyboard(categories: &[String], language_code: Option<&str>) -> InlineKeyboardMarkup {
    let mut buttons = categories
        .iter()
        .filter_map(|c| ProductCategory::parse(c))
        .map(|c| callback_button(t_lang(c.label_key(), language_code), CallbackData::ShopCategory(Some(c))))
        .collect::<Vec<_>>();
    buttons.push(callback_button(t_lang("shop-all-products", language_code), CallbackData::ShopCategory(None)));

    InlineKeyboardMarkup::new(buttons.chunks(2).map(|c| c.to_vec()).collect::<Vec<_>>())
}

pub fn format_product(product: &Product, language_code: Option<&str>) -> String {
    format!(
        "🛍️ <b>{}</b>\n\n{}\n\n💰 <b>{}:</b> {} ₽",
        html_escape(&product.name),
        html_escape(&product.description),
        t_lang("shop-price", language_code),
        format_price(product.price)
    )
}

/// Buttons of a product card with wrap-around paging
pub fn product_keyboard(
    product: &Product,
    category: Option<ProductCategory>,
    index: usize,
    total: usize,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();

    if total > 1 {
        rows.push(vec![
            callback_button(
                "⬅️",
                CallbackData::ShopNav {
                    category,
                    index: (index + total - 1) % total,
                },
            ),
            callback_button(format!("{}/{}", index + 1, total), CallbackData::ShopInfo),
            callback_button(
                "➡️",
                CallbackData::ShopNav {
                    category,
                    index: (index + 1) % total,
                },
            ),
        ]);
    }
    let price = format_price(product.price);
    rows.push(vec![callback_button(
        t_args_lang("shop-select", &[("price", price.as_str())], language_code),
        CallbackData::ProductSelect(product.id),
    )]);
    rows.push(vec![callback_button(t_lang("button-back", language_code), CallbackData::ShopBack)]);

    InlineKeyboardMarkup::new(rows)
}

// ---- Admin ----

pub fn product_category_keyboard(wrap: fn(ProductCategory) -> CallbackData, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        ProductCategory::ALL
            .iter()
            .map(|c| vec![callback_button(t_lang(c.label_key(), language_code), wrap(*c))])
            .collect::<Vec<_>>(),
    )
}

pub fn product_field_confirm_keyboard(field: ProductField, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        callback_button(
            t_lang("button-confirm", language_code),
            CallbackData::AddProductField { field, confirm: true },
        ),
        callback_button(
            t_lang("button-edit", language_code),
            CallbackData::AddProductField { field, confirm: false },
        ),
    ]])
}

/// Products offered for removal, one delete button each
pub fn removal_candidates_keyboard(products: &[Product]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        products
            .iter()
            .map(|p| {
                vec![callback_button(
                    format!("🗑 #{} {}", p.id, p.name),
                    CallbackData::RemoveProductDelete(p.id),
                )]
            })
            .collect::<Vec<_>>(),
    )
}

pub fn format_removal_candidates(products: &[Product], language_code: Option<&str>) -> String {
    let list = products
        .iter()
        .map(|p| format!("#{} {} ({} ₽)", p.id, html_escape(&p.name), format_price(p.price)))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n\n{}", t_lang("remove-product-list", language_code), list)
}

pub fn format_stats(stats: &UserStats, language_code: Option<&str>) -> String {
    let total = stats.total_users.to_string();
    let active = stats.active_users_7d.to_string();
    let forms = stats.funeral_forms.to_string();
    let records = stats.memory_records.to_string();
    t_args_lang(
        "admin-stats-text",
        &[
            ("total", total.as_str()),
            ("active", active.as_str()),
            ("forms", forms.as_str()),
            ("records", records.as_str()),
        ],
        language_code,
    )
}

// ---- AI assistant and voice ----

pub fn ai_actions_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![callback_button(t_lang("assistant-button-ask-again", language_code), CallbackData::AiAskAgain)],
        vec![callback_button(t_lang("assistant-button-to-main", language_code), CallbackData::AiToMain)],
    ])
}

pub fn voice_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![callback_button(t_lang("button-confirm", language_code), CallbackData::VoiceConfirm)],
        vec![callback_button(t_lang("button-edit", language_code), CallbackData::VoiceEdit)],
        vec![callback_button(t_lang("button-cancel", language_code), CallbackData::VoiceCancel)],
    ])
}
