//! # Configuration
//!
//! Layered configuration for the API service: built-in defaults, then an
//! optional per-environment TOML file, then `COURSEHUB_`-prefixed environment
//! variables (double underscore as the section separator, e.g.
//! `COURSEHUB_DATABASE__URL`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub cors: CorsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub request_timeout_ms: u64,
}

/// Database pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

/// Authentication configuration for the managed identity provider.
///
/// Session tokens are RS256 JWTs verified locally against the provider's
/// public key. When disabled (local development) a fixed dev identity is
/// injected instead.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    pub jwt_public_key: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub dev_user_id: String,
}

/// Payment processor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    /// "stripe" for the real provider, "mock" for local development
    pub provider: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
    pub currency: String,
    /// Public base URL of the frontend, used for checkout redirect URLs
    pub app_url: String,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Load configuration for the current environment.
    ///
    /// The environment name comes from `APP_ENV` (default "development") and
    /// selects the optional `config/<env>.toml` overlay.
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        Self::load_for_environment(&environment)
    }

    /// Load configuration for a specific named environment.
    pub fn load_for_environment(environment: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("environment", environment)?
            .set_default("server.bind_address", "0.0.0.0:3000")?
            .set_default("server.request_timeout_ms", 30_000_i64)?
            .set_default(
                "database.url",
                "postgres://localhost/coursehub_development",
            )?
            .set_default("database.max_connections", 10_i64)?
            .set_default("database.min_connections", 2_i64)?
            .set_default("database.acquire_timeout_seconds", 10_i64)?
            .set_default("database.idle_timeout_seconds", 300_i64)?
            .set_default("auth.enabled", false)?
            .set_default("auth.jwt_public_key", "")?
            .set_default("auth.jwt_issuer", "")?
            .set_default("auth.jwt_audience", "")?
            .set_default("auth.dev_user_id", "user_dev")?
            .set_default("payments.provider", "mock")?
            .set_default("payments.secret_key", "")?
            .set_default("payments.webhook_secret", "")?
            .set_default("payments.api_base", "https://api.stripe.com")?
            .set_default("payments.currency", "usd")?
            .set_default("payments.app_url", "http://localhost:3000")?
            .set_default("cors.enabled", true)?
            .set_default("cors.allowed_origins", vec!["*".to_string()])?
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(Environment::with_prefix("COURSEHUB").separator("__"));

        builder.build()?.try_deserialize()
    }
}
