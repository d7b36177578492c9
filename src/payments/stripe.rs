//! Stripe-compatible checkout session client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::PaymentsConfig;

use super::{CheckoutSession, CheckoutSessionParams, PaymentError, PaymentProvider};

/// HTTP client for the processor's checkout-session API.
///
/// Talks the form-encoded v1 API; `api_base` is configurable so tests and
/// staging environments can point it elsewhere.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

/// Session fields we read back from the create response.
#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

/// Error envelope returned by the provider on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.into(),
            api_base: api_base.into(),
        }
    }

    pub fn from_config(config: &PaymentsConfig) -> Self {
        Self::new(config.secret_key.clone(), config.api_base.clone())
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(
        &self,
        params: CheckoutSessionParams,
    ) -> Result<CheckoutSession, PaymentError> {
        if params.amount_minor < 0 {
            return Err(PaymentError::InvalidParameters(
                "Amount must not be negative".to_string(),
            ));
        }

        let amount = params.amount_minor.to_string();
        let course_id = params.course_id.to_string();
        let form: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", &params.currency),
            ("line_items[0][price_data][unit_amount]", &amount),
            (
                "line_items[0][price_data][product_data][name]",
                &params.course_title,
            ),
            (
                "line_items[0][price_data][product_data][description]",
                &params.course_description,
            ),
            ("success_url", &params.success_url),
            ("cancel_url", &params.cancel_url),
            ("metadata[course_id]", &course_id),
            ("metadata[user_id]", &params.user_id),
        ];

        debug!(
            course_id = %params.course_id,
            user_id = %params.user_id,
            amount_minor = params.amount_minor,
            "Creating checkout session"
        );

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            error!(status = %status, message = %message, "Checkout session creation failed");
            return Err(PaymentError::ProviderError(message));
        }

        let session: SessionResponse = response.json().await?;
        let url = session.url.ok_or_else(|| {
            PaymentError::ProviderError("Session response missing redirect URL".to_string())
        })?;

        debug!(session_id = %session.id, "Checkout session created");

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }
}
