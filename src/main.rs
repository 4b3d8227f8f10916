//! FPL Tracker Server
//!
//! Run with: cargo run --bin fpl-tracker
//!
//! # Configuration
//!
//! Read from `$FPL_CONFIG`, `./config.toml` or the user config directory,
//! then overridden by environment variables (a `.env` file is honoured):
//! - `ADMIN_USERNAME` / `ADMIN_PASSWORD`: Admin credential (default: admin/password)
//! - `FPL_DATABASE_PATH`: SQLite file (default: fpl.db)
//! - `FPL_HOST` / `FPL_PORT`: Bind address (default: 0.0.0.0:8000)
//! - `FPL_STATIC_DIR`: Page and asset directory (default: static)
//! - `FPL_LOG_LEVEL` / `FPL_LOG_FORMAT`: `info`, `debug`, ... / `pretty` or `json`
//! - `RUST_LOG`: Full filter directive, wins over `FPL_LOG_LEVEL`

use fpl_tracker::api::{serve, AppState};
use fpl_tracker::config::{Config, LoggingConfig};
use fpl_tracker::storage::Store;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let loaded = Config::load_default()?;
    init_tracing(&loaded.config.logging);

    tracing::info!("Starting FPL Tracker v{}", env!("CARGO_PKG_VERSION"));
    match &loaded.source {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::info!("Using default config with environment overrides"),
    }
    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }
    let config = loaded.config;

    if config.auth.uses_default_credentials() {
        tracing::warn!(
            "Using the default admin credentials; set ADMIN_USERNAME and ADMIN_PASSWORD"
        );
    }

    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Static files: {}", config.server.static_dir);

    let store = Arc::new(Store::open(&config.database)?);
    let stats = store.stats().await?;
    tracing::info!("Store ready: {}", stats);

    let state = AppState::new(store, config.auth.clone(), config.server.clone());
    serve(state, &config.server).await?;

    tracing::info!("FPL Tracker stopped");
    Ok(())
}

/// Install the global subscriber: `RUST_LOG` wins, else the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "fpl_tracker={level},tower_http={level}",
            level = logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}
