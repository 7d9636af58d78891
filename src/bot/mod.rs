//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Routes incoming messages and opens menu sections
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `voice_handler`: Transcribes voice messages for confirmation
//! - `dialogue_manager`: Applies conversation steps, prompts and effects
//! - `ui_builder`: Creates keyboards and formats messages

pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;
pub mod voice_handler;

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyMarkup};

use crate::ai::{CompletionService, TranscriptionService};
use crate::config::Config;
use crate::dialogue::BotDialogue;
use crate::localization::t_lang;
use crate::memory_page::MemoryPageWriter;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// Shared services injected into every handler
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub assistant: Arc<dyn CompletionService>,
    pub transcriber: Arc<dyn TranscriptionService>,
    pub pages: MemoryPageWriter,
    /// Client for Telegram file downloads
    pub http: reqwest::Client,
}

impl AppState {
    pub fn is_admin(&self, telegram_id: i64) -> bool {
        self.config.admins.is_admin(telegram_id)
    }
}

/// Everything a handler needs to answer one chat
pub struct ChatContext<'a> {
    pub bot: &'a Bot,
    pub app: &'a AppState,
    pub dialogue: &'a BotDialogue,
    pub chat_id: ChatId,
    pub user_id: i64,
    pub language_code: Option<&'a str>,
}

impl ChatContext<'_> {
    pub fn is_admin(&self) -> bool {
        self.app.is_admin(self.user_id)
    }

    pub fn t(&self, key: &str) -> String {
        t_lang(key, self.language_code)
    }

    /// Sends an HTML message, optionally with a keyboard
    pub async fn send(&self, text: impl Into<String>, markup: Option<ReplyMarkup>) -> Result<Message> {
        let request = self.bot.send_message(self.chat_id, text).parse_mode(ParseMode::Html);
        let message = match markup {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(message)
    }
}
