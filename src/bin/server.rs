//! Course marketplace API server.

use anyhow::Context;
use tracing::info;

use coursehub::config::AppConfig;
use coursehub::database::{create_pool, run_migrations};
use coursehub::logging::init_logging;
use coursehub::web::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(environment = %config.environment, "Starting coursehub API server");

    let pool = create_pool(&config.database)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let bind_address = config.server.bind_address.clone();
    let state = AppState::new(config, pool);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!(address = %bind_address, "Listening");

    axum::serve(listener, router)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
