//! Escola sweep daemon entry point.
//!
//! Loads configuration, connects to the database, runs migrations, and
//! keeps the periodic sweeps (consent expiry, invoice overdue,
//! subscription delinquency, monthly transfer aggregation) running
//! until shutdown.

use std::sync::Arc;

use escola_common::Config;
use escola_queue::{run_scheduler, SchedulerConfig, SweepExecutor};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before reading configuration
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "escola=debug".into()),
        )
        .init();

    info!("Starting escola sweep daemon...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = escola_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    escola_db::migrate(&db).await?;
    info!("Migrations completed");

    // Start the sweep scheduler
    let db = Arc::new(db);
    let executor = Arc::new(SweepExecutor::new(
        Arc::clone(&db),
        config.billing.clone(),
    ));
    let scheduler_config = SchedulerConfig::from(&config.sweeps);
    run_scheduler(scheduler_config, executor).await;
    info!("Sweep scheduler started");

    // Wait for shutdown
    shutdown_signal().await;
    info!("Shutdown complete");

    Ok(())
}
