//! Dialogue Manager module applying conversation steps
//!
//! [`apply_step`] stores the next state, renders the reply and runs the
//! persistence effect a terminal step asks for.

use anyhow::{anyhow, Context, Result};
use teloxide::prelude::*;
use teloxide::types::{FileId, ParseMode, ReplyMarkup};
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::t_args_lang;

// Import conversation types
use crate::conversation::{Effect, Reply, Step};
use crate::dialogue::{
    ConversationState, Cursor, Flow, FuneralDraft, FuneralField, MemoryDraft, MemoryField, ProductCategory, ProductDraft,
    ProductField, RegistrationDraft, RegistrationField, RemovalStep,
};

// Import database functions
use crate::db::{self, ClientData, NewMemoryRecord};
use crate::memory_page::MemoryPage;
use crate::package_matcher::{format_package, format_price, select_package};

// Import UI builder functions
use super::ui_builder::{
    admin_keyboard, ai_actions_keyboard, budget_keyboard, cancel_keyboard, form_confirm_keyboard,
    format_funeral_summary, format_memory_summary, format_registration_summary, format_removal_candidates,
    funeral_fields_keyboard, funeral_type_keyboard, html_escape, main_menu_keyboard, memory_fields_keyboard,
    memory_record_keyboard, product_category_keyboard, product_field_confirm_keyboard, product_field_label,
    registration_fields_keyboard, removal_candidates_keyboard, services_keyboard, skip_cancel_keyboard,
    validation_message, voice_keyboard,
};
use super::voice_handler::download_file;
use super::ChatContext;
use crate::callback_data::CallbackData;

pub fn main_menu(ctx: &ChatContext<'_>) -> ReplyMarkup {
    main_menu_keyboard(ctx.is_admin(), ctx.language_code).into()
}

/// Persists the state; idle conversations are removed from storage
pub async fn store_state(ctx: &ChatContext<'_>, state: ConversationState) -> Result<()> {
    if state.is_idle() {
        ctx.dialogue.exit().await?;
    } else {
        ctx.dialogue.update(state).await?;
    }
    Ok(())
}

/// Applies a step returned by [`crate::conversation::advance`]
pub async fn apply_step(ctx: &ChatContext<'_>, step: Step) -> Result<()> {
    let Step { next, reply, effect } = step;

    match effect {
        Some(effect) => {
            let state = execute_effect(ctx, next, effect).await?;
            store_state(ctx, state).await
        }
        None => {
            store_state(ctx, next.clone()).await?;
            render_reply(ctx, &next, reply).await
        }
    }
}

/// Tells the user what happened and what the new state waits for
pub async fn render_reply(ctx: &ChatContext<'_>, next: &ConversationState, reply: Reply) -> Result<()> {
    match reply {
        Reply::Prompt => send_prompt(ctx, next).await,
        Reply::Rejected(error) => {
            debug!(user_id = ctx.user_id, reason = %error, "Input rejected");
            ctx.send(validation_message(&error, ctx.language_code), None).await?;
            send_prompt(ctx, next).await
        }
        Reply::Cancelled => {
            ctx.send(ctx.t("action-cancelled"), Some(main_menu(ctx))).await?;
            Ok(())
        }
        Reply::ChooseField => {
            let keyboard = match next.flow() {
                Some(Flow::Registration) => registration_fields_keyboard(ctx.language_code),
                Some(Flow::Funeral) => funeral_fields_keyboard(ctx.language_code),
                Some(Flow::Memory) => memory_fields_keyboard(ctx.language_code),
                _ => return send_prompt(ctx, next).await,
            };
            ctx.send(ctx.t("choose-field"), Some(keyboard.into())).await?;
            Ok(())
        }
        Reply::Handled => Ok(()),
        Reply::Echo(transcript) => {
            let text = t_args_lang(
                "voice-transcript-echo",
                &[("text", html_escape(&transcript).as_str())],
                ctx.language_code,
            );
            ctx.send(text, Some(main_menu(ctx))).await?;
            Ok(())
        }
        Reply::Unrecognized => send_unrecognized(ctx).await,
    }
}

pub async fn send_unrecognized(ctx: &ChatContext<'_>) -> Result<()> {
    ctx.send(ctx.t("unrecognized-message"), Some(main_menu(ctx))).await?;
    Ok(())
}

fn editing_prefix(ctx: &ChatContext<'_>, editing: bool) -> String {
    if editing {
        format!("✏️ <b>{}</b>\n\n", ctx.t("editing-title"))
    } else {
        String::new()
    }
}

/// Sends the question the state is waiting for
pub async fn send_prompt(ctx: &ChatContext<'_>, state: &ConversationState) -> Result<()> {
    let lang = ctx.language_code;

    match state {
        ConversationState::Idle => {
            ctx.send(ctx.t("main-menu-returned"), Some(main_menu(ctx))).await?;
        }
        ConversationState::Registration(form) => match form.cursor {
            Cursor::Field { field, editing } | Cursor::ConfirmField { field, editing } => {
                send_registration_prompt(ctx, field, editing).await?;
            }
            Cursor::Summary => {
                ctx.send(
                    format_registration_summary(&form.draft, lang),
                    Some(form_confirm_keyboard(CallbackData::Registration, lang).into()),
                )
                .await?;
            }
        },
        ConversationState::Funeral(form) => match form.cursor {
            Cursor::Field { field, editing } | Cursor::ConfirmField { field, editing } => {
                send_funeral_prompt(ctx, &form.draft, field, editing).await?;
            }
            Cursor::Summary => {
                ctx.send(
                    format_funeral_summary(&form.draft, lang),
                    Some(form_confirm_keyboard(CallbackData::Funeral, lang).into()),
                )
                .await?;
            }
        },
        ConversationState::Memory(form) => match form.cursor {
            Cursor::Field { field, editing } | Cursor::ConfirmField { field, editing } => {
                let text = format!(
                    "{}{}",
                    editing_prefix(ctx, editing),
                    ctx.t(&format!("memory-prompt-{}", field.key()))
                );
                let keyboard = if field == MemoryField::Photo {
                    skip_cancel_keyboard(lang)
                } else {
                    cancel_keyboard(lang)
                };
                ctx.send(text, Some(keyboard.into())).await?;
            }
            Cursor::Summary => {
                ctx.send(
                    format_memory_summary(&form.draft, lang),
                    Some(form_confirm_keyboard(CallbackData::MemoryForm, lang).into()),
                )
                .await?;
            }
        },
        ConversationState::AddProduct(form) => match form.cursor {
            Cursor::Field { field, .. } => {
                let text = ctx.t(&format!("product-prompt-{}", field.key()));
                let keyboard: ReplyMarkup = match field {
                    ProductField::Category => {
                        product_category_keyboard(CallbackData::AddProductCategory, lang).into()
                    }
                    ProductField::Description => skip_cancel_keyboard(lang).into(),
                    ProductField::Name | ProductField::Price => cancel_keyboard(lang).into(),
                };
                ctx.send(text, Some(keyboard)).await?;
            }
            Cursor::ConfirmField { field, .. } => {
                let value = product_value(ctx, &form.draft, field);
                let text = t_args_lang(
                    "product-confirm-value",
                    &[
                        ("field", product_field_label(field, lang).as_str()),
                        ("value", value.as_str()),
                    ],
                    lang,
                );
                ctx.send(text, Some(product_field_confirm_keyboard(field, lang).into()))
                    .await?;
            }
            Cursor::Summary => {
                ctx.send(ctx.t("admin-panel-title"), Some(admin_keyboard(lang).into()))
                    .await?;
            }
        },
        ConversationState::RemoveProduct(RemovalStep::ChooseCategory) => {
            ctx.send(
                ctx.t("remove-product-choose-category"),
                Some(product_category_keyboard(CallbackData::RemoveProductCategory, lang).into()),
            )
            .await?;
        }
        ConversationState::RemoveProduct(RemovalStep::EnterId { .. }) => {
            ctx.send(ctx.t("remove-product-enter-id"), Some(cancel_keyboard(lang).into()))
                .await?;
        }
        ConversationState::AiQuestion { .. } => {
            ctx.send(ctx.t("assistant-intro"), Some(cancel_keyboard(lang).into()))
                .await?;
        }
        ConversationState::VoiceConfirm { transcript, .. } => {
            let text = t_args_lang(
                "voice-recognized",
                &[("text", html_escape(transcript).as_str())],
                lang,
            );
            ctx.send(text, Some(voice_keyboard(lang).into())).await?;
        }
        ConversationState::VoiceEdit { .. } => {
            ctx.send(ctx.t("voice-edit-prompt"), Some(cancel_keyboard(lang).into()))
                .await?;
        }
    }
    Ok(())
}

async fn send_registration_prompt(ctx: &ChatContext<'_>, field: RegistrationField, editing: bool) -> Result<()> {
    let text = format!(
        "{}{}",
        editing_prefix(ctx, editing),
        ctx.t(&format!("reg-prompt-{}", field.key()))
    );
    let keyboard = if field == RegistrationField::Email {
        skip_cancel_keyboard(ctx.language_code)
    } else {
        cancel_keyboard(ctx.language_code)
    };
    ctx.send(text, Some(keyboard.into())).await?;
    Ok(())
}

async fn send_funeral_prompt(
    ctx: &ChatContext<'_>,
    draft: &FuneralDraft,
    field: FuneralField,
    editing: bool,
) -> Result<()> {
    let lang = ctx.language_code;
    let text = format!(
        "{}{}",
        editing_prefix(ctx, editing),
        ctx.t(&format!("funeral-prompt-{}", field.key()))
    );
    let keyboard: ReplyMarkup = match field {
        FuneralField::BodyLocation => cancel_keyboard(lang).into(),
        FuneralField::FuneralType => funeral_type_keyboard(lang).into(),
        FuneralField::Services => services_keyboard(&draft.services, lang).into(),
        FuneralField::Budget => budget_keyboard(lang).into(),
    };
    ctx.send(text, Some(keyboard)).await?;
    Ok(())
}

fn product_value(ctx: &ChatContext<'_>, draft: &ProductDraft, field: ProductField) -> String {
    let value = match field {
        ProductField::Category => draft.category.map(|c| ctx.t(c.label_key())),
        ProductField::Name => draft.name.as_deref().map(html_escape),
        ProductField::Description => draft.description.as_deref().map(html_escape),
        ProductField::Price => draft.price.map(|p| format!("{} ₽", format_price(p))),
    };
    value.unwrap_or_else(|| ctx.t("value-not-set"))
}

/// Runs the effect and returns the state the conversation ends up in
async fn execute_effect(ctx: &ChatContext<'_>, next: ConversationState, effect: Effect) -> Result<ConversationState> {
    let result = match effect {
        Effect::SaveClient(draft) => save_client(ctx, &draft).await.map(|_| next.clone()),
        Effect::SaveFuneralForm(draft) => save_funeral_form(ctx, &draft).await.map(|_| next.clone()),
        Effect::CreateMemory(draft) => create_memory(ctx, draft).await.map(|_| next.clone()),
        Effect::AddProduct(draft) => add_product(ctx, &draft).await.map(|_| next.clone()),
        Effect::AskAssistant { question } => ask_assistant(ctx, &question).await.map(|_| next.clone()),
        Effect::ListRemovalCandidates { category } => list_removal_candidates(ctx, category, next.clone()).await,
        Effect::RemoveProduct { category, id } => remove_product(ctx, category, id, next.clone()).await,
    };

    match result {
        Ok(state) => Ok(state),
        Err(e) => {
            error!(user_id = ctx.user_id, error = %e, "Failed to complete conversation step");
            ctx.send(ctx.t("error-processing-failed"), Some(main_menu(ctx))).await?;
            Ok(ConversationState::Idle)
        }
    }
}

async fn save_client(ctx: &ChatContext<'_>, draft: &RegistrationDraft) -> Result<()> {
    db::save_client_data(&ctx.app.pool, ctx.user_id, &ClientData::from(draft)).await?;
    info!(user_id = ctx.user_id, "Registration saved");
    ctx.send(ctx.t("registration-saved"), Some(main_menu(ctx))).await?;
    Ok(())
}

async fn save_funeral_form(ctx: &ChatContext<'_>, draft: &FuneralDraft) -> Result<()> {
    let (Some(body_location), Some(funeral_type), Some(budget)) =
        (draft.body_location.as_deref(), draft.funeral_type, draft.budget)
    else {
        return Err(anyhow!("Funeral form finished without all answers"));
    };

    db::save_funeral_form(&ctx.app.pool, ctx.user_id, body_location, funeral_type, &draft.services, budget).await?;

    let recommendation = match select_package(funeral_type, &draft.services, budget) {
        Some(package) => {
            info!(user_id = ctx.user_id, package = package.id, "Package recommended");
            format!(
                "{}\n\n{}",
                ctx.t("funeral-recommendation"),
                format_package(package, ctx.language_code)
            )
        }
        None => ctx.t("funeral-no-package"),
    };

    ctx.send(
        format!("{}\n\n{}", ctx.t("funeral-saved"), recommendation),
        Some(main_menu(ctx)),
    )
    .await?;
    Ok(())
}

/// Downloads a memory photo into the photos directory
async fn save_memory_photo(ctx: &ChatContext<'_>, file_id: &str) -> Result<String> {
    let bytes = download_file(ctx.bot, &ctx.app.http, FileId(file_id.to_string())).await?;
    let dir = &ctx.app.config.memory_photos_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(format!("{file_id}.jpg"));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(user_id = ctx.user_id, path = %path.display(), "Memory photo saved");
    Ok(path.to_string_lossy().into_owned())
}

async fn create_memory(ctx: &ChatContext<'_>, draft: MemoryDraft) -> Result<()> {
    let (Some(name), Some(birth_date), Some(death_date), Some(memory_text)) = (
        draft.name.as_deref(),
        draft.birth_date.as_deref(),
        draft.death_date.as_deref(),
        draft.memory_text.as_deref(),
    ) else {
        return Err(anyhow!("Memory form finished without all answers"));
    };

    let photo_path = match draft.photo_file_id.as_deref() {
        Some(file_id) => match save_memory_photo(ctx, file_id).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(user_id = ctx.user_id, error = %e, "Memory photo could not be saved, continuing without it");
                None
            }
        },
        None => None,
    };

    let record_id = db::create_memory_record(
        &ctx.app.pool,
        &NewMemoryRecord {
            telegram_id: ctx.user_id,
            name,
            birth_date,
            death_date,
            memory_text,
            photo_path: photo_path.as_deref(),
        },
    )
    .await?;

    let page = MemoryPage {
        record_id,
        name,
        birth_date,
        death_date,
        memory_text,
        photo_path: photo_path.as_deref(),
        candles_count: 0,
    };
    match ctx.app.pages.write_page(&page, chrono::Local::now().naive_local()).await {
        Ok(path) => db::set_memory_page_path(&ctx.app.pool, record_id, &path.to_string_lossy()).await?,
        Err(e) => error!(user_id = ctx.user_id, record_id, error = %e, "Failed to write memory page"),
    }

    let text = t_args_lang(
        "memory-created",
        &[
            ("name", html_escape(name).as_str()),
            ("birth", birth_date),
            ("death", death_date),
        ],
        ctx.language_code,
    );
    ctx.send(
        text,
        Some(memory_record_keyboard(record_id, None, 0, 1, true, ctx.language_code).into()),
    )
    .await?;
    ctx.send(ctx.t("main-menu-returned"), Some(main_menu(ctx))).await?;
    Ok(())
}

async fn add_product(ctx: &ChatContext<'_>, draft: &ProductDraft) -> Result<()> {
    let (Some(category), Some(name), Some(price)) = (draft.category, draft.name.as_deref(), draft.price) else {
        return Err(anyhow!("Product form finished without all answers"));
    };

    let id = db::add_product(
        &ctx.app.pool,
        name,
        draft.description.as_deref().unwrap_or_default(),
        price,
        category.as_str(),
        None,
    )
    .await?;

    let id = id.to_string();
    let text = t_args_lang(
        "product-added",
        &[("name", html_escape(name).as_str()), ("id", id.as_str())],
        ctx.language_code,
    );
    ctx.send(text, Some(admin_keyboard(ctx.language_code).into())).await?;
    Ok(())
}

async fn ask_assistant(ctx: &ChatContext<'_>, question: &str) -> Result<()> {
    if let Err(e) = db::log_request(&ctx.app.pool, ctx.user_id, "ai_lawyer", question, "").await {
        warn!(user_id = ctx.user_id, error = %e, "Failed to log assistant request");
    }

    let processing = ctx.send(ctx.t("assistant-processing"), None).await?;

    match ctx.app.assistant.answer(question).await {
        Ok(answer) => {
            if let Err(e) =
                db::log_request(&ctx.app.pool, ctx.user_id, "ai_lawyer_response", question, &answer).await
            {
                warn!(user_id = ctx.user_id, error = %e, "Failed to log assistant response");
            }

            let text = format!(
                "🤖 <b>{}</b>\n\n{}\n\n{}",
                ctx.t("assistant-answer-title"),
                html_escape(&answer),
                ctx.t("assistant-next-action")
            );
            ctx.bot
                .edit_message_text(ctx.chat_id, processing.id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(ai_actions_keyboard(ctx.language_code))
                .await?;
        }
        Err(e) => {
            error!(user_id = ctx.user_id, error = %e, "Assistant request failed");
            ctx.bot
                .edit_message_text(ctx.chat_id, processing.id, ctx.t("assistant-error"))
                .await?;
        }
    }
    Ok(())
}

async fn list_removal_candidates(
    ctx: &ChatContext<'_>,
    category: ProductCategory,
    current: ConversationState,
) -> Result<ConversationState> {
    let products = db::get_products(&ctx.app.pool, Some(category.as_str())).await?;

    if products.is_empty() {
        ctx.send(ctx.t("remove-product-empty"), None).await?;
        return Ok(current);
    }

    ctx.send(
        format_removal_candidates(&products, ctx.language_code),
        Some(removal_candidates_keyboard(&products).into()),
    )
    .await?;
    ctx.send(ctx.t("remove-product-enter-id"), Some(cancel_keyboard(ctx.language_code).into()))
        .await?;
    Ok(ConversationState::RemoveProduct(RemovalStep::EnterId { category }))
}

async fn remove_product(
    ctx: &ChatContext<'_>,
    category: ProductCategory,
    id: i64,
    current: ConversationState,
) -> Result<ConversationState> {
    if db::delete_product(&ctx.app.pool, id, category.as_str()).await? {
        let id = id.to_string();
        let text = t_args_lang("product-removed", &[("id", id.as_str())], ctx.language_code);
        ctx.send(text, Some(admin_keyboard(ctx.language_code).into())).await?;
        Ok(ConversationState::Idle)
    } else {
        ctx.send(ctx.t("remove-product-not-found"), None).await?;
        Ok(current)
    }
}
