//! AuthHub server: centralized sign-on for tenant applications.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use authhub_api::{AppState, run_server};
use authhub_auth::jwt::SigningKeys;
use authhub_auth::session::SessionCleanup;
use authhub_core::config::AppConfig;
use authhub_core::result::AppResult;
use authhub_database::CredentialStore;
use authhub_service::NotificationDispatcher;
use authhub_worker::{CronScheduler, SessionSweepJob};

#[tokio::main]
async fn main() {
    let env = std::env::var("AUTHHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting AuthHub v{}", env!("CARGO_PKG_VERSION"));

    let store = CredentialStore::open(&config.database).await?;
    let keys = Arc::new(SigningKeys::load(&config.auth)?);
    let notifier = NotificationDispatcher::from_config(&config.mail)?;

    let mut scheduler = if config.worker.enabled {
        let scheduler = CronScheduler::new().await?;
        let job = SessionSweepJob::new(SessionCleanup::new(store.sessions.clone()));
        scheduler.register_session_sweep(&config.worker, job).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    let state = AppState::build(config, store, keys, notifier.clone())?;
    let served = run_server(state).await;

    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler did not stop cleanly");
        }
    }
    notifier.flush().await;

    tracing::info!("AuthHub server shut down gracefully");
    served
}
