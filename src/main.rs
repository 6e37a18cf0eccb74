mod bot;
mod config;
mod logging;
mod platform;

use std::path::PathBuf;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::info;

use crate::config::{Config, UpdateMode};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply
    dotenvy::dotenv().ok();

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    // Initialize logging; the guard flushes the log file when main returns
    let _log_guard = logging::init(&config.logging)?;

    info!("Configuration loaded successfully");
    info!(
        "  Log file: {} (rotation: {})",
        config.logging.directory.join(&config.logging.file_name).display(),
        config.logging.rotation
    );

    let mode = config.update_mode()?;
    match &mode {
        UpdateMode::Polling => info!("  Update mode: polling"),
        UpdateMode::Webhook { listen, .. } => info!(
            "  Update mode: webhook at {} (listening on {})",
            config.webhook_base().unwrap_or_default(),
            listen
        ),
    }

    let bot = Bot::new(&config.telegram.bot_token);
    let me = bot
        .get_me()
        .await
        .context("Failed to fetch bot identity (is TELEGRAM_TOKEN valid?)")?;
    info!("Authorized as @{} (ID: {})", me.username(), me.id);

    info!("Bot is starting...");
    platform::telegram::run(bot, me, mode).await?;

    info!("Bot stopped");
    Ok(())
}
