//! API error type and its HTTP mapping.
//!
//! Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl is
//! the single place where errors become the `{"error": {"code", "message"}}`
//! envelope clients see.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::payments::PaymentError;
use crate::web::auth::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            ApiError::Payment(inner) => match inner {
                PaymentError::InvalidParameters(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                PaymentError::MissingSignature | PaymentError::InvalidSignature => {
                    (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE")
                }
                _ => (StatusCode::BAD_GATEWAY, "PAYMENT_PROVIDER_ERROR"),
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Client-safe message. Server-side failures get a generic message; the
    /// detail goes to the logs instead.
    fn public_message(&self) -> String {
        match self {
            ApiError::Database(_) => "Internal server error".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
            ApiError::Payment(PaymentError::NetworkError(_))
            | ApiError::Payment(PaymentError::ProviderError(_)) => {
                "Payment provider unavailable".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        ApiError::Unauthorized
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            error!(code = code, error = %self, "Request failed");
        } else {
            warn!(code = code, error = %self, "Request rejected");
        }

        let body = json!({
            "error": {
                "code": code,
                "message": self.public_message(),
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status_and_code().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized.status_and_code().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_and_code().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::PoolClosed).status_and_code().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_database_detail_not_leaked() {
        let err = ApiError::Database(sqlx::Error::PoolClosed);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_signature_errors_are_bad_request() {
        let err = ApiError::Payment(PaymentError::InvalidSignature);
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "INVALID_SIGNATURE");
    }
}
