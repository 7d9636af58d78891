use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::dispatching::dialogue::{self, InMemStorage};
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use euroservice::ai::OpenAiClient;
use euroservice::bot::{callback_handler, message_handler, AppState};
use euroservice::config::Config;
use euroservice::db;
use euroservice::dialogue::ConversationState;
use euroservice::localization::init_localization;
use euroservice::memory_page::MemoryPageWriter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Главное меню"),
        BotCommand::new("services", "Организация похорон"),
        BotCommand::new("shop", "Магазин ритуальных товаров"),
        BotCommand::new("memory", "Уголок памяти"),
        BotCommand::new("ask_lawyer", "Помощь с документами"),
        BotCommand::new("help", "Помощь"),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();
    info!("Starting EuroService Telegram Bot");

    init_localization().context("Failed to load localization resources")?;

    let config = Config::from_env().context("Invalid configuration")?;
    if config.admins.is_empty() {
        warn!("No admin ids configured, the admin panel is disabled");
    }

    info!(database_url = %config.database_url, "Initializing database");
    let pool = db::connect(&config.database_url).await?;
    db::init_database_schema(&pool).await?;
    let seeded = db::seed_products(&pool).await?;
    if seeded > 0 {
        info!(products = seeded, "Product catalog seeded");
    }

    let ai_client = Arc::new(OpenAiClient::new(config.openai_api_key.clone(), config.ai.clone())?);
    let pages = MemoryPageWriter::new(&config.templates_dir, &config.memory_pages_dir);

    let bot = Bot::new(config.bot_token.clone());

    let app = Arc::new(AppState {
        pool,
        config,
        assistant: ai_client.clone(),
        transcriber: ai_client,
        pages,
        http: reqwest::Client::new(),
    });

    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    info!("Bot initialized, starting dispatcher");

    let handler = dialogue::enter::<Update, InMemStorage<ConversationState>, ConversationState, _>()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<ConversationState>::new(), app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
