//! # EuroService Telegram Bot
//!
//! A Telegram bot for the «ЕвроСервис» funeral agency: funeral order intake
//! with package recommendations, client registration, a product catalog,
//! a memory corner with candles and an AI documents assistant.

pub mod ai;
pub mod ai_config;
pub mod ai_errors;
pub mod bot;
pub mod callback_data;
pub mod config;
pub mod conversation;
pub mod db;
pub mod dialogue;
pub mod localization;
pub mod memory_page;
pub mod package_matcher;
pub mod validation;
