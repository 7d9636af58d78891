//! # Configuration Module
//!
//! Settings read from the environment (optionally via a `.env` file).

use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::ai_config::{
    AiConfig, DEFAULT_API_BASE, DEFAULT_COMPLETION_MODEL, DEFAULT_TRANSCRIPTION_MODEL, MAX_QUESTION_CHARS,
};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://bot_database.db";
pub const DEFAULT_MEMORY_PAGES_DIR: &str = "memory_pages";
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";
pub const DEFAULT_MEMORY_PHOTOS_DIR: &str = "memory_photos";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid admin id: {0}")]
    InvalidAdminId(String),
    #[error("{0} must be a positive number, got {1}")]
    InvalidNumber(&'static str, String),
}

/// Telegram ids allowed to use the admin panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminList(HashSet<i64>);

impl AdminList {
    /// Parses a comma or whitespace separated id list
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        raw.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>()
                    .map_err(|_| ConfigError::InvalidAdminId(part.to_string()))
            })
            .collect::<Result<HashSet<_>, _>>()
            .map(Self)
    }

    pub fn is_admin(&self, telegram_id: i64) -> bool {
        self.0.contains(&telegram_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub openai_api_key: String,
    pub admins: AdminList,
    pub database_url: String,
    pub memory_pages_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub memory_photos_dir: PathBuf,
    pub ai: AiConfig,
}

impl Config {
    /// Reads the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("BOT_TOKEN"))
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        let openai_api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;

        let admins = match get("ADMIN_IDS").or_else(|| get("ADMIN_ID")) {
            Some(raw) => AdminList::parse(&raw)?,
            None => AdminList::default(),
        };

        let max_question_chars = match get("AI_MAX_QUESTION_CHARS") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidNumber("AI_MAX_QUESTION_CHARS", raw))?,
            None => MAX_QUESTION_CHARS,
        };

        let ai = AiConfig {
            api_base: get("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            completion_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
            transcription_model: get("OPENAI_TRANSCRIPTION_MODEL")
                .unwrap_or_else(|| DEFAULT_TRANSCRIPTION_MODEL.to_string()),
            max_question_chars,
            ..AiConfig::default()
        };

        Ok(Self {
            bot_token,
            openai_api_key,
            admins,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            memory_pages_dir: get("MEMORY_PAGES_DIR")
                .unwrap_or_else(|| DEFAULT_MEMORY_PAGES_DIR.to_string())
                .into(),
            templates_dir: get("TEMPLATES_DIR")
                .unwrap_or_else(|| DEFAULT_TEMPLATES_DIR.to_string())
                .into(),
            memory_photos_dir: get("MEMORY_PHOTOS_DIR")
                .unwrap_or_else(|| DEFAULT_MEMORY_PHOTOS_DIR.to_string())
                .into(),
            ai,
        })
    }
}
