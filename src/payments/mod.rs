//! # Payment Processor Integration
//!
//! The processor owns the checkout-session lifecycle; this module is the thin
//! client side of it: creating hosted checkout sessions and verifying the
//! signed webhook events the processor posts back.

pub mod mock;
pub mod stripe;
pub mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use mock::MockPaymentProvider;
pub use stripe::StripeClient;

/// Payment operation errors.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Payment provider error: {0}")]
    ProviderError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing webhook signature")]
    MissingSignature,

    #[error("Invalid webhook signature")]
    InvalidSignature,
}

/// A hosted checkout session created at the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider-assigned session id
    pub id: String,
    /// Redirect URL for the customer
    pub url: String,
}

/// Parameters for creating a checkout session for a course purchase.
#[derive(Debug, Clone)]
pub struct CheckoutSessionParams {
    pub course_id: Uuid,
    pub user_id: String,
    pub course_title: String,
    pub course_description: String,
    /// Price in minor units (cents)
    pub amount_minor: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Interface to the managed payment processor.
///
/// The course id and user id travel as opaque metadata on the session and
/// come back on the completion webhook, which is how payment events are
/// reconciled with enrollments.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted checkout session and return its redirect URL.
    async fn create_checkout_session(
        &self,
        params: CheckoutSessionParams,
    ) -> Result<CheckoutSession, PaymentError>;
}
