mod bot;
mod config;
mod deepseek;
mod error;
mod prompt;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::{Config, Mode};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,prodbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // .env is optional; deployments set the environment directly
    let _ = dotenvy::dotenv();

    // Load configuration; a missing token or key is fatal
    let config = Config::from_env()?;

    info!("Configuration loaded successfully");
    match &config.mode {
        Mode::Polling => info!("  Mode: long polling"),
        Mode::Webhook(webhook) => {
            info!("  Mode: webhook on {}:{}", webhook.host, webhook.port)
        }
    }

    let state = Arc::new(AppState::new(config));

    info!("Bot is starting...");
    bot::run(state).await?;

    Ok(())
}
