//! Message Handler module for processing incoming Telegram messages

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{debug, error, warn};

// Import conversation routing
use crate::conversation::{
    add_product_start, advance, ai_question_start, funeral_start, route_message, Event, MenuCommand,
    Route,
};
use crate::db;
use crate::dialogue::{BotDialogue, ConversationState, RemovalStep};

// Import dialogue manager functions
use super::dialogue_manager::{apply_step, main_menu, send_prompt, send_unrecognized, store_state};
use super::voice_handler::handle_voice;

// Import UI builder functions
use super::ui_builder::{
    admin_keyboard, client_data_keyboard, format_client_data, format_stats, memory_menu_keyboard,
    registration_keyboard, shop_categories_keyboard,
};
use super::{AppState, ChatContext};

/// Reduces a Telegram message to the event the router works with
pub fn message_event(msg: &Message) -> Event {
    if let Some(text) = msg.text() {
        Event::Text(text.to_string())
    } else if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        Event::Photo {
            file_id: photo.file.id.0.clone(),
        }
    } else if msg.voice().is_some() {
        Event::Voice
    } else {
        Event::Other
    }
}

fn event_kind(event: &Event) -> &'static str {
    match event {
        Event::Text(_) => "text",
        Event::Photo { .. } => "photo",
        Event::Voice => "voice",
        Event::Other => "other",
    }
}

/// Category keyboard of the shop
pub async fn show_shop(ctx: &ChatContext<'_>) -> Result<()> {
    let categories = db::get_categories(&ctx.app.pool).await?;
    ctx.send(
        format!("🛍️ <b>{}</b>\n\n{}", ctx.t("shop-title"), ctx.t("shop-choose-category")),
        Some(shop_categories_keyboard(&categories, ctx.language_code).into()),
    )
    .await?;
    Ok(())
}

pub async fn show_memory_menu(ctx: &ChatContext<'_>) -> Result<()> {
    ctx.send(
        format!("🕯️ <b>{}</b>\n\n{}", ctx.t("memory-title"), ctx.t("memory-description")),
        Some(memory_menu_keyboard(ctx.language_code).into()),
    )
    .await?;
    Ok(())
}

/// Stored profile or the registration introduction
pub async fn show_registration(ctx: &ChatContext<'_>) -> Result<()> {
    match db::get_client(&ctx.app.pool, ctx.user_id).await? {
        Some(client) => {
            ctx.send(
                format_client_data(&client.data(), client.is_verified, ctx.language_code),
                Some(client_data_keyboard(ctx.language_code).into()),
            )
            .await?;
        }
        None => {
            ctx.send(
                format!(
                    "📝 <b>{}</b>\n\n{}",
                    ctx.t("registration-title"),
                    ctx.t("registration-description")
                ),
                Some(registration_keyboard(ctx.language_code).into()),
            )
            .await?;
        }
    }
    Ok(())
}

async fn show_help(ctx: &ChatContext<'_>) -> Result<()> {
    let help_message = [
        format!("ℹ️ <b>{}</b>", ctx.t("help-title")),
        ctx.t("help-description"),
        ctx.t("help-sections"),
        ctx.t("help-commands"),
        ctx.t("help-voice"),
        ctx.t("help-contacts"),
    ]
    .join("\n\n");
    ctx.send(help_message, Some(main_menu(ctx))).await?;
    Ok(())
}

/// Opens the section a menu command points at
pub async fn handle_menu(ctx: &ChatContext<'_>, command: MenuCommand) -> Result<()> {
    debug!(user_id = ctx.user_id, command = ?command, "Menu command");

    match command {
        MenuCommand::Start => {
            let welcome_message = format!(
                "👋 <b>{}</b>\n\n{}\n\n{}",
                ctx.t("welcome-title"),
                ctx.t("welcome-description"),
                ctx.t("welcome-features")
            );
            ctx.send(welcome_message, Some(main_menu(ctx))).await?;
            ctx.send(ctx.t("welcome-choose-section"), None).await?;
        }
        MenuCommand::MainMenu => {
            ctx.send(ctx.t("main-menu-returned"), Some(main_menu(ctx))).await?;
        }
        MenuCommand::Help => show_help(ctx).await?,
        MenuCommand::Funeral => {
            let state = funeral_start();
            store_state(ctx, state.clone()).await?;
            ctx.send(
                format!("🏛️ <b>{}</b>\n\n{}", ctx.t("funeral-title"), ctx.t("funeral-description")),
                None,
            )
            .await?;
            send_prompt(ctx, &state).await?;
        }
        MenuCommand::Assistant => {
            let state = ai_question_start(ctx.app.config.ai.max_question_chars);
            store_state(ctx, state.clone()).await?;
            send_prompt(ctx, &state).await?;
        }
        MenuCommand::Shop => show_shop(ctx).await?,
        MenuCommand::Memory => show_memory_menu(ctx).await?,
        MenuCommand::Registration => show_registration(ctx).await?,
        MenuCommand::Admin => {
            if ctx.is_admin() {
                ctx.send(
                    format!("🔧 <b>{}</b>", ctx.t("admin-panel-title")),
                    Some(admin_keyboard(ctx.language_code).into()),
                )
                .await?;
            } else {
                warn!(user_id = ctx.user_id, "Admin panel requested by non-admin");
                ctx.send(ctx.t("admin-no-access"), Some(main_menu(ctx))).await?;
            }
        }
        MenuCommand::AdminAddProduct => {
            let state = add_product_start();
            store_state(ctx, state.clone()).await?;
            send_prompt(ctx, &state).await?;
        }
        MenuCommand::AdminRemoveProduct => {
            let state = ConversationState::RemoveProduct(RemovalStep::ChooseCategory);
            store_state(ctx, state.clone()).await?;
            send_prompt(ctx, &state).await?;
        }
        MenuCommand::AdminStats => {
            let stats = db::get_user_stats(&ctx.app.pool).await?;
            ctx.send(
                format!(
                    "📊 <b>{}</b>\n\n{}",
                    ctx.t("admin-stats-title"),
                    format_stats(&stats, ctx.language_code)
                ),
                Some(admin_keyboard(ctx.language_code).into()),
            )
            .await?;
        }
        MenuCommand::AdminBack => {
            ctx.send(ctx.t("main-menu-returned"), Some(main_menu(ctx))).await?;
        }
    }
    Ok(())
}

async fn dispatch_message(ctx: &ChatContext<'_>, msg: &Message, event: Event) -> Result<()> {
    let state = ctx.dialogue.get_or_default().await?;

    match route_message(&state, &event, ctx.is_admin()) {
        Route::Menu(command) => {
            store_state(ctx, ConversationState::Idle).await?;
            handle_menu(ctx, command).await
        }
        Route::Advance(input) => apply_step(ctx, advance(state, input)).await,
        Route::Voice => handle_voice(ctx, msg, state).await,
        Route::Unrecognized => send_unrecognized(ctx).await,
    }
}

pub async fn message_handler(bot: Bot, msg: Message, app: Arc<AppState>, dialogue: BotDialogue) -> Result<()> {
    let user = msg.from.as_ref();
    let user_id = user.map(|u| u.id.0 as i64).unwrap_or(msg.chat.id.0);

    // Extract user's language code from Telegram
    let language_code = user.and_then(|u| u.language_code.as_deref());

    let ctx = ChatContext {
        bot: &bot,
        app: &app,
        dialogue: &dialogue,
        chat_id: msg.chat.id,
        user_id,
        language_code,
    };

    if let Some(user) = user {
        if let Err(e) = db::upsert_user(
            &app.pool,
            user_id,
            user.username.as_deref(),
            Some(user.first_name.as_str()),
            user.last_name.as_deref(),
        )
        .await
        {
            warn!(user_id, error = %e, "Failed to update user record");
        }
    }

    let event = message_event(&msg);
    debug!(user_id, kind = event_kind(&event), "Received message from user");

    if let Err(e) =
        db::log_chat_message(&app.pool, user_id, event_kind(&event), msg.text(), "message_handler", true).await
    {
        warn!(user_id, error = %e, "Failed to log chat message");
    }

    if let Err(e) = dispatch_message(&ctx, &msg, event).await {
        error!(user_id, error = %e, "Failed to handle message");
        ctx.send(ctx.t("error-processing-failed"), Some(main_menu(&ctx))).await?;
    } else {
        debug!(user_id, "Message handled");
    }

    Ok(())
}
