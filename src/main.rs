use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use project_management_api::config;
use project_management_api::database::{DatabaseManager, MemoryStore, PgStore, Store};
use project_management_api::{server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, CLERK_* keys, etc.
    let _ = dotenvy::dotenv();

    init_tracing();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    config.validate().context("invalid configuration")?;
    info!("Starting Project Management API in {:?} mode", config.environment);

    let store = open_store(config).await?;
    report_auth_setup(config);

    let state = AppState::new(config.clone(), store).context("failed to initialise application state")?;

    let bind_addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!(addr = %bind_addr, sync_mode = ?config.webhook.sync_mode, "Server running");

    server::serve(listener, state).await.context("server error")?;

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

/// Postgres when DATABASE_URL is set, otherwise an in-memory store (refused in production by `validate`)
async fn open_store(config: &config::AppConfig) -> Result<Arc<dyn Store>> {
    if config.database.url.is_none() {
        warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = DatabaseManager::connect_lazy(&config.database).context("failed to create database pool")?;

    if config.database.run_migrations {
        // The server still starts when the database is down; liveness must not depend on it
        if let Err(e) = DatabaseManager::migrate(&pool).await {
            warn!("Skipping migrations, database not ready: {}", e);
        }
    }

    Ok(Arc::new(PgStore::new(pool)))
}

fn report_auth_setup(config: &config::AppConfig) {
    let security = &config.security;
    if security.secret_key.is_none() || security.publishable_key.is_none() {
        warn!("CLERK_SECRET_KEY / CLERK_PUBLISHABLE_KEY not set");
    }
    if security.jwt_key.is_none() {
        warn!("CLERK_JWT_KEY not set; requests carrying bearer tokens will be rejected");
    }
    if config.webhook.signing_secret.is_none() {
        warn!("CLERK_WEBHOOK_SECRET not set; webhook signatures are not verified");
    }
}
