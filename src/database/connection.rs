//! Database connection management.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DatabaseConfig;

/// Create a connection pool and verify connectivity.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout = config.acquire_timeout_seconds,
        idle_timeout = config.idle_timeout_seconds,
        "Creating database pool"
    );

    pool_options(config).connect(&config.url).await
}

/// Create a pool without connecting eagerly.
///
/// Connections are established on first use. Used by the test harness and by
/// environments where the database may come up after the service.
pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    pool_options(config).connect_lazy(&config.url)
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .test_before_acquire(true)
}

/// Run embedded migrations to bring the schema up to date.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations complete");
    Ok(())
}
