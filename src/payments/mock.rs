//! In-memory payment provider for local development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{CheckoutSession, CheckoutSessionParams, PaymentError, PaymentProvider};

/// Mock provider that fabricates checkout sessions without network calls.
///
/// Used when `payments.provider = "mock"` so the checkout flow can be
/// exercised without processor credentials. Can be configured to fail the
/// next operation for error-path testing.
#[derive(Default)]
pub struct MockPaymentProvider {
    sessions: Arc<RwLock<HashMap<String, CheckoutSessionParams>>>,
    fail_next: Arc<RwLock<bool>>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure whether the next operation should fail.
    pub async fn set_fail_next(&self, fail: bool) {
        *self.fail_next.write().await = fail;
    }

    /// Number of sessions created so far.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(
        &self,
        params: CheckoutSessionParams,
    ) -> Result<CheckoutSession, PaymentError> {
        if std::mem::take(&mut *self.fail_next.write().await) {
            return Err(PaymentError::ProviderError(
                "Mock configured to fail".to_string(),
            ));
        }

        if params.amount_minor < 0 {
            return Err(PaymentError::InvalidParameters(
                "Amount must not be negative".to_string(),
            ));
        }

        let id = format!("cs_mock_{}", Uuid::new_v4());
        let url = format!("https://checkout.mock.local/pay/{id}");

        info!(
            session_id = %id,
            course_id = %params.course_id,
            user_id = %params.user_id,
            "Created mock checkout session"
        );

        self.sessions.write().await.insert(id.clone(), params);

        Ok(CheckoutSession { id, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> CheckoutSessionParams {
        CheckoutSessionParams {
            course_id: Uuid::new_v4(),
            user_id: "user_1".to_string(),
            course_title: "Intro to Rust".to_string(),
            course_description: "Ownership and borrowing".to_string(),
            amount_minor: 4999,
            currency: "usd".to_string(),
            success_url: "http://localhost/success".to_string(),
            cancel_url: "http://localhost/cancel".to_string(),
        }
    }

    #[tokio::test]
    async fn test_creates_session_with_redirect_url() {
        let provider = MockPaymentProvider::new();

        let session = provider
            .create_checkout_session(sample_params())
            .await
            .expect("session created");

        assert!(session.id.starts_with("cs_mock_"));
        assert!(session.url.contains(&session.id));
        assert_eq!(provider.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_fail_next_fails_once() {
        let provider = MockPaymentProvider::new();
        provider.set_fail_next(true).await;

        let err = provider
            .create_checkout_session(sample_params())
            .await
            .expect_err("configured to fail");
        assert!(matches!(err, PaymentError::ProviderError(_)));

        // Next call succeeds again
        provider
            .create_checkout_session(sample_params())
            .await
            .expect("recovered");
    }
}
