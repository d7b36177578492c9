//! Shared application state for the HTTP layer.

use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::payments::{MockPaymentProvider, PaymentProvider, StripeClient};

use super::auth::JwtVerifier;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: PgPool,
    pub payments: Arc<dyn PaymentProvider>,
    pub jwt: Arc<JwtVerifier>,
}

impl AppState {
    /// Build state from loaded configuration and a connected pool.
    ///
    /// Selects the payment provider from `payments.provider`: anything other
    /// than "stripe" gets the mock, so a misconfigured dev box never talks to
    /// the real processor by accident.
    pub fn new(config: AppConfig, db_pool: PgPool) -> Self {
        let payments: Arc<dyn PaymentProvider> = if config.payments.provider == "stripe" {
            info!("Using Stripe payment provider");
            Arc::new(StripeClient::from_config(&config.payments))
        } else {
            info!(provider = %config.payments.provider, "Using mock payment provider");
            Arc::new(MockPaymentProvider::new())
        };

        let jwt = Arc::new(JwtVerifier::from_config(&config.auth));

        Self {
            config: Arc::new(config),
            db_pool,
            payments,
            jwt,
        }
    }

    /// Build state with an explicit payment provider (tests).
    pub fn with_provider(
        config: AppConfig,
        db_pool: PgPool,
        payments: Arc<dyn PaymentProvider>,
    ) -> Self {
        let jwt = Arc::new(JwtVerifier::from_config(&config.auth));
        Self {
            config: Arc::new(config),
            db_pool,
            payments,
            jwt,
        }
    }
}
