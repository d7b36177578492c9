//! Newsletter subscription handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::models::newsletter::NewsletterSubscription;
use crate::web::errors::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: Option<String>,
}

/// `POST /api/newsletter`
pub async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body
        .email
        .map(|email| email.trim().to_lowercase())
        .filter(|email| email.contains('@') && email.len() > 3)
        .ok_or_else(|| ApiError::BadRequest("A valid email address is required".to_string()))?;

    if NewsletterSubscription::find_by_email(&state.db_pool, &email)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "This email is already subscribed".to_string(),
        ));
    }

    let subscription = NewsletterSubscription::create(&state.db_pool, &email).await?;

    info!(subscription_id = %subscription.id, "Newsletter subscription created");

    Ok((StatusCode::CREATED, Json(subscription)))
}

/// `GET /api/newsletter`
pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let subscriptions = NewsletterSubscription::list_all(&state.db_pool).await?;
    let count = subscriptions.len();

    Ok(Json(json!({
        "subscriptions": subscriptions,
        "count": count,
    })))
}
