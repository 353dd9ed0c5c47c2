//! # kampus-server
//!
//! HTTP backend for the KampusSepeti student marketplace.
//!
//! This binary provides:
//! - **REST API** (axum) for accounts, listings, messaging, ratings, reports
//!   and the admin panel
//! - **Bearer-token authentication** with argon2 password hashes
//! - **Per-IP rate limiting** to protect against abuse
//!
//! All state lives in a single SQLite database owned by `kampus-store`.

mod api;
mod auth;
mod config;
mod error;
mod rate_limit;
mod services;

use tracing::info;
use tracing_subscriber::EnvFilter;

use kampus_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,kampus_server=debug")),
        )
        .init();

    info!("Starting KampusSepeti server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration (.env first, then the process environment)
    // -----------------------------------------------------------------------
    if let Ok(path) = dotenvy::dotenv() {
        info!(path = %path.display(), "Loaded .env file");
    }
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the database (runs pending migrations)
    // -----------------------------------------------------------------------
    let db_path = match &config.database_path {
        Some(path) => path.clone(),
        None => Database::default_path()?,
    };
    let db = Database::open_at(&db_path)?;
    if let Some(path) = db.path() {
        info!(path = %path.display(), "Database ready");
    }

    let http_addr = config.http_addr;
    let app_state = AppState::new(db, config);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let rl = app_state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rl.purge_stale(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
