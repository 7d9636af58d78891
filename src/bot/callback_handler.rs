//! Callback Handler module for processing inline keyboard callback queries

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId, ParseMode};
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::t_args_lang;

use crate::callback_data::{CallbackData, FormAction, RecordScope};
use crate::conversation::{
    advance, ai_question_start, memory_start, registration_edit, registration_start, Input, Reply,
};
use crate::db::{self, CandleOutcome};
use crate::dialogue::{BotDialogue, ConversationState, Flow, ProductCategory, RegistrationDraft};
use crate::package_matcher::format_price;

// Import dialogue manager functions
use super::dialogue_manager::{apply_step, main_menu, send_prompt, store_state};
use super::message_handler::show_memory_menu;

// Import UI builder functions
use super::ui_builder::{
    client_data_keyboard, format_client_data, format_memory_record, format_product, memory_menu_keyboard,
    memory_record_keyboard, product_keyboard, registration_fields_keyboard, services_keyboard,
    shop_categories_keyboard,
};
use super::{AppState, ChatContext};

/// Text of the alert answering a callback, `None` for a silent answer
type CallbackAnswer = Option<String>;

async fn edit_card(
    ctx: &ChatContext<'_>,
    message_id: MessageId,
    text: String,
    keyboard: InlineKeyboardMarkup,
) -> Result<()> {
    ctx.bot
        .edit_message_text(ctx.chat_id, message_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

/// Removes the inline keyboard of an answered message
async fn clear_buttons(ctx: &ChatContext<'_>, message_id: MessageId) {
    if let Err(e) = ctx.bot.edit_message_reply_markup(ctx.chat_id, message_id).await {
        debug!(user_id = ctx.user_id, error = %e, "Could not remove inline keyboard");
    }
}

async fn show_product(
    ctx: &ChatContext<'_>,
    message_id: MessageId,
    category: Option<ProductCategory>,
    index: usize,
) -> Result<CallbackAnswer> {
    let products = db::get_products(&ctx.app.pool, category.map(ProductCategory::as_str)).await?;

    if products.is_empty() {
        return Ok(Some(ctx.t("shop-empty")));
    }

    let index = index % products.len();
    let product = &products[index];
    debug!(user_id = ctx.user_id, product_id = product.id, index, "Showing product card");

    edit_card(
        ctx,
        message_id,
        format_product(product, ctx.language_code),
        product_keyboard(product, category, index, products.len(), ctx.language_code),
    )
    .await?;
    Ok(None)
}

async fn show_shop_categories(ctx: &ChatContext<'_>, message_id: MessageId) -> Result<CallbackAnswer> {
    let categories = db::get_categories(&ctx.app.pool).await?;
    edit_card(
        ctx,
        message_id,
        format!("🛍️ <b>{}</b>\n\n{}", ctx.t("shop-title"), ctx.t("shop-choose-category")),
        shop_categories_keyboard(&categories, ctx.language_code),
    )
    .await?;
    Ok(None)
}

async fn select_product(ctx: &ChatContext<'_>, product_id: i64) -> Result<CallbackAnswer> {
    let answer = match db::get_product(&ctx.app.pool, product_id).await? {
        Some(product) => {
            info!(user_id = ctx.user_id, product_id, "Product selected");
            let price = format_price(product.price);
            t_args_lang(
                "shop-selected",
                &[("name", product.name.as_str()), ("price", price.as_str())],
                ctx.language_code,
            )
        }
        None => ctx.t("product-not-found"),
    };
    Ok(Some(answer))
}

async fn show_memory_record(
    ctx: &ChatContext<'_>,
    message_id: MessageId,
    scope: RecordScope,
    index: usize,
) -> Result<CallbackAnswer> {
    let owner = match scope {
        RecordScope::Mine => Some(ctx.user_id),
        RecordScope::All => None,
    };
    let records = db::get_memory_records(&ctx.app.pool, owner).await?;

    if records.is_empty() {
        return Ok(Some(ctx.t("memory-no-records")));
    }

    let index = index % records.len();
    let record = &records[index];
    edit_card(
        ctx,
        message_id,
        format_memory_record(record, ctx.language_code),
        memory_record_keyboard(record.id, Some(scope), index, records.len(), true, ctx.language_code),
    )
    .await?;
    Ok(None)
}

async fn light_candle(ctx: &ChatContext<'_>, message_id: MessageId, record_id: i64) -> Result<CallbackAnswer> {
    match db::light_candle(&ctx.app.pool, record_id, ctx.user_id).await? {
        CandleOutcome::Lit { candles_count } => {
            info!(user_id = ctx.user_id, record_id, candles_count, "Candle lit");
            if let Some(record) = db::get_memory_record(&ctx.app.pool, record_id).await? {
                edit_card(
                    ctx,
                    message_id,
                    format_memory_record(&record, ctx.language_code),
                    memory_record_keyboard(record.id, None, 0, 1, false, ctx.language_code),
                )
                .await?;
            }
            let count = candles_count.to_string();
            Ok(Some(t_args_lang(
                "memory-candle-lit",
                &[("count", count.as_str())],
                ctx.language_code,
            )))
        }
        CandleOutcome::AlreadyLit => Ok(Some(ctx.t("memory-candle-already"))),
        CandleOutcome::RecordNotFound => Ok(Some(ctx.t("memory-record-not-found"))),
    }
}

async fn show_client_data(ctx: &ChatContext<'_>, message_id: Option<MessageId>) -> Result<CallbackAnswer> {
    let Some(client) = db::get_client(&ctx.app.pool, ctx.user_id).await? else {
        return Ok(Some(ctx.t("registration-not-found")));
    };

    let text = format_client_data(&client.data(), client.is_verified, ctx.language_code);
    let keyboard = client_data_keyboard(ctx.language_code);
    match message_id {
        Some(message_id) => edit_card(ctx, message_id, text, keyboard).await?,
        None => {
            ctx.send(text, Some(keyboard.into())).await?;
        }
    }
    Ok(None)
}

async fn verify_registration(ctx: &ChatContext<'_>, message_id: MessageId) -> Result<CallbackAnswer> {
    if !db::verify_client(&ctx.app.pool, ctx.user_id).await? {
        return Ok(Some(ctx.t("registration-not-found")));
    }
    info!(user_id = ctx.user_id, "Client data verified");
    show_client_data(ctx, Some(message_id)).await?;
    Ok(Some(ctx.t("registration-verified")))
}

/// Opens the field choice for a stored profile outside a running registration
async fn edit_stored_registration(ctx: &ChatContext<'_>) -> Result<CallbackAnswer> {
    let Some(client) = db::get_client(&ctx.app.pool, ctx.user_id).await? else {
        return Ok(Some(ctx.t("registration-not-found")));
    };

    store_state(ctx, registration_edit(RegistrationDraft::from(&client.data()))).await?;
    ctx.send(
        ctx.t("choose-field"),
        Some(registration_fields_keyboard(ctx.language_code).into()),
    )
    .await?;
    Ok(None)
}

/// Feeds a form button into the conversation of its flow
async fn handle_form_button(
    ctx: &ChatContext<'_>,
    message_id: MessageId,
    data: &CallbackData,
    flow: Flow,
    input: Input,
) -> Result<CallbackAnswer> {
    let state = ctx.dialogue.get_or_default().await?;

    if *data == CallbackData::Registration(FormAction::Edit) && state.flow() != Some(Flow::Registration) {
        return edit_stored_registration(ctx).await;
    }

    // a pending transcript is dropped when a button answers the step instead
    let state = match state {
        ConversationState::VoiceConfirm { resume, .. } | ConversationState::VoiceEdit { resume } => *resume,
        other => other,
    };

    if state.flow() != Some(flow) {
        warn!(user_id = ctx.user_id, flow = ?flow, "Button of an inactive flow pressed");
        return Ok(Some(ctx.t("callback-outdated")));
    }

    let step = advance(state, input);

    if matches!(data, CallbackData::FuneralService(_)) && step.reply == Reply::Prompt && step.effect.is_none() {
        if let ConversationState::Funeral(form) = &step.next {
            let keyboard = services_keyboard(&form.draft.services, ctx.language_code);
            store_state(ctx, step.next.clone()).await?;
            ctx.bot
                .edit_message_reply_markup(ctx.chat_id, message_id)
                .reply_markup(keyboard)
                .await?;
            return Ok(None);
        }
    }

    if !matches!(data, CallbackData::FuneralService(_)) {
        clear_buttons(ctx, message_id).await;
    }
    apply_step(ctx, step).await?;
    Ok(None)
}

/// Confirm, edit or cancel of a pending voice transcript. Cancel works from any state.
async fn handle_voice_button(ctx: &ChatContext<'_>, message_id: MessageId, input: Input) -> Result<CallbackAnswer> {
    let state = ctx.dialogue.get_or_default().await?;
    if input != Input::Cancel && !matches!(state, ConversationState::VoiceConfirm { .. }) {
        return Ok(Some(ctx.t("callback-outdated")));
    }

    clear_buttons(ctx, message_id).await;
    apply_step(ctx, advance(state, input)).await?;
    Ok(None)
}

async fn handle_callback(ctx: &ChatContext<'_>, message_id: MessageId, data: CallbackData) -> Result<CallbackAnswer> {
    if let Some((flow, input)) = data.form_input() {
        return handle_form_button(ctx, message_id, &data, flow, input).await;
    }

    match data {
        CallbackData::ShopCategory(category) => show_product(ctx, message_id, category, 0).await,
        CallbackData::ShopNav { category, index } => show_product(ctx, message_id, category, index).await,
        CallbackData::ShopBack => show_shop_categories(ctx, message_id).await,
        CallbackData::ProductSelect(product_id) => select_product(ctx, product_id).await,
        CallbackData::ShopInfo | CallbackData::MemoryInfo => Ok(None),

        CallbackData::MemoryCreate => {
            let state = memory_start();
            store_state(ctx, state.clone()).await?;
            send_prompt(ctx, &state).await?;
            Ok(None)
        }
        CallbackData::MemoryRecords(scope) => show_memory_record(ctx, message_id, scope, 0).await,
        CallbackData::MemoryNav { scope, index } => show_memory_record(ctx, message_id, scope, index).await,
        CallbackData::MemoryCandle(record_id) => light_candle(ctx, message_id, record_id).await,
        CallbackData::MemoryBack => {
            let edited = edit_card(
                ctx,
                message_id,
                format!("🕯️ <b>{}</b>\n\n{}", ctx.t("memory-title"), ctx.t("memory-description")),
                memory_menu_keyboard(ctx.language_code),
            )
            .await;
            if edited.is_err() {
                show_memory_menu(ctx).await?;
            }
            Ok(None)
        }

        CallbackData::RegistrationStart => {
            let state = registration_start();
            store_state(ctx, state.clone()).await?;
            send_prompt(ctx, &state).await?;
            Ok(None)
        }
        CallbackData::RegistrationMyData => show_client_data(ctx, Some(message_id)).await,
        CallbackData::RegistrationVerify => verify_registration(ctx, message_id).await,
        CallbackData::RegistrationBack => {
            clear_buttons(ctx, message_id).await;
            ctx.send(ctx.t("main-menu-returned"), Some(main_menu(ctx))).await?;
            Ok(None)
        }

        CallbackData::AiAskAgain => {
            let state = ai_question_start(ctx.app.config.ai.max_question_chars);
            store_state(ctx, state.clone()).await?;
            send_prompt(ctx, &state).await?;
            Ok(None)
        }
        CallbackData::AiToMain => {
            store_state(ctx, ConversationState::Idle).await?;
            ctx.send(ctx.t("main-menu-returned"), Some(main_menu(ctx))).await?;
            Ok(None)
        }

        CallbackData::VoiceConfirm => handle_voice_button(ctx, message_id, Input::Confirm).await,
        CallbackData::VoiceEdit => handle_voice_button(ctx, message_id, Input::Change).await,
        CallbackData::VoiceCancel => handle_voice_button(ctx, message_id, Input::Cancel).await,

        // form buttons are answered through `form_input` above
        _ => Ok(Some(ctx.t("callback-outdated"))),
    }
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, app: Arc<AppState>, dialogue: BotDialogue) -> Result<()> {
    let user_id = q.from.id.0 as i64;
    let language_code = q.from.language_code.as_deref();
    debug!(user_id, data = ?q.data, "Received callback query from user");

    let Some(message) = q.message.as_ref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let ctx = ChatContext {
        bot: &bot,
        app: &app,
        dialogue: &dialogue,
        chat_id: message.chat().id,
        user_id,
        language_code,
    };

    let answer = match q.data.as_deref().and_then(CallbackData::parse) {
        Some(data) => match handle_callback(&ctx, message.id(), data).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(user_id, error = %e, "Failed to handle callback query");
                Some(ctx.t("error-processing-failed"))
            }
        },
        None => {
            warn!(user_id, data = ?q.data, "Unknown callback payload");
            Some(ctx.t("callback-outdated"))
        }
    };

    match answer {
        Some(text) => {
            bot.answer_callback_query(q.id.clone())
                .text(text)
                .show_alert(true)
                .await?;
        }
        None => {
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }
    Ok(())
}
