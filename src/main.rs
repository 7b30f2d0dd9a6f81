use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;

use badex::core::{config, init_logger, SessionStore};
use badex::storage::create_pool;
use badex::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Anything that fails here (logging, database schema, bot creation) is
/// fatal: the process logs the error and exits.
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    run_bot().await
}

/// Run the Telegram bot
async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");

    // Receipts land here before their path is attached to an order
    std::fs::create_dir_all(config::RECEIPTS_DIR.as_str())
        .map_err(|e| anyhow::anyhow!("Failed to create receipts directory: {}", e))?;

    // Create database connection pool; runs idempotent schema init
    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH, &config::admin::ADMIN_IDS)
            .map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );

    // Create bot instance
    let bot = create_bot()?;

    let me = bot.get_me().await?;
    let bot_username = me.user.username.clone();
    log::info!("Bot username: {:?}, Bot ID: {}", bot_username, me.id);

    setup_bot_commands(&bot).await?;

    let handler_deps = HandlerDeps::new(Arc::clone(&db_pool), SessionStore::new(), bot_username);
    let handler = schema(handler_deps);

    log::info!("================================================");
    log::info!("🎯 BAD Exchanger started");
    log::info!("👑 Admins: {:?}", &*config::admin::ADMIN_IDS);
    log::info!("================================================");

    Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
