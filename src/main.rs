//! # Reading Plan Bot Main Entry Point
//!
//! Initializes logging, loads configuration, wires the sheet-backed
//! stores to the dispatch engine, starts the broadcast scheduler, and
//! runs the polling loop next to the health server.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod bot;
mod config;
mod notify;
mod services;
mod storage;
mod utils;

use crate::bot::engine::Engine;
use crate::bot::polling::PollingLoop;
use crate::config::Config;
use crate::notify::telegram::TelegramNotifier;
use crate::services::broadcast::BroadcastService;
use crate::services::health::HealthService;
use crate::storage::sheets::SheetsClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reading_plan_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Reading Plan Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - plan sheet: {}, start date: {}, timezone: {}",
        config.plan_sheet, config.start_date, config.timezone
    );
    if config.dry_run {
        info!("DRY_RUN is on - outbound delivery is suppressed");
    }

    let store = Arc::new(SheetsClient::new(
        &config.spreadsheet_id,
        &config.google_api_token,
        Duration::from_secs(config.request_timeout_secs),
    )?);

    // The client-side wait must exceed the server-side long-poll wait,
    // or every quiet poll would time out locally first.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(config.poll_timeout_secs) + 10))
        .build()?;
    let bot = Bot::with_client(&config.telegram_bot_token, client);

    let request_timeout = Duration::from_secs(config.request_timeout_secs);
    let notifier = TelegramNotifier::new(
        bot.clone(),
        &config.telegram_bot_token,
        request_timeout,
        config.dry_run,
    )?;

    // Initialize the dispatch engine
    let mut engine = Engine::new(config.clone(), store.clone(), notifier.clone());
    engine.warm_up().await;
    let mut polling = PollingLoop::new(bot, engine, config.poll_timeout_secs);
    polling.resolve_identity().await;
    info!("Dispatch engine initialized");

    // Initialize and start the broadcast service
    let mut broadcast = match BroadcastService::new(config.clone(), store, notifier).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to create broadcast service: {}", e);
            return Err(anyhow::anyhow!("Failed to create broadcast service: {}", e));
        }
    };
    if let Err(e) = broadcast.start().await {
        tracing::error!("Failed to start broadcast service: {}", e);
    } else {
        info!("Broadcast service started");
    }

    // Health endpoints
    let health = HealthService::new();
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;
    info!("Health check server starting on port {}", config.http_port);

    // Run both the polling loop and health server concurrently
    let bot_task = tokio::spawn(async move {
        polling.run().await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    // Wait for either task to complete (which would indicate shutdown)
    tokio::select! {
        result1 = bot_task => {
            if let Err(e) = result1 {
                tracing::error!("Polling task error: {}", e);
            }
        }
        result2 = health_task => {
            if let Err(e) = result2 {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    // Stop the broadcast scheduler on shutdown
    if let Err(e) = broadcast.stop().await {
        tracing::warn!("Error stopping broadcast service: {}", e);
    }

    info!("Application stopped");
    Ok(())
}
