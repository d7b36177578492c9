//! Hosted checkout session creation.

use axum::extract::{Extension, State};
use axum::Json;
use bigdecimal::{BigDecimal, ToPrimitive};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::models::course::Course;
use crate::models::enrollment::Enrollment;
use crate::payments::CheckoutSessionParams;
use crate::web::auth::CurrentUser;
use crate::web::errors::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub course_id: Option<Uuid>,
}

/// Course price in the processor's minor units (cents).
fn amount_minor(price: &BigDecimal) -> Result<i64, ApiError> {
    (price * BigDecimal::from(100))
        .with_scale(0)
        .to_i64()
        .ok_or_else(|| ApiError::Internal("Course price out of range".to_string()))
}

/// `POST /api/checkout`
///
/// Validates eligibility, then asks the payment provider for a hosted
/// checkout session. The course and user ids ride along as session metadata
/// and come back on the completion webhook.
pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let course_id = body
        .course_id
        .ok_or_else(|| ApiError::BadRequest("Missing required field: course_id".to_string()))?;

    let course = Course::find_published(&state.db_pool, course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    if Enrollment::exists(&state.db_pool, &user.user_id, "course", course_id).await? {
        return Err(ApiError::BadRequest(
            "Already enrolled in this course".to_string(),
        ));
    }

    if course.is_full() {
        return Err(ApiError::BadRequest("Course is full".to_string()));
    }

    let app_url = &state.config.payments.app_url;
    let params = CheckoutSessionParams {
        course_id,
        user_id: user.user_id.clone(),
        course_title: course.title.clone(),
        course_description: course.description.clone(),
        amount_minor: amount_minor(&course.price)?,
        currency: state.config.payments.currency.clone(),
        success_url: format!("{app_url}/courses/{course_id}?checkout=success"),
        cancel_url: format!("{app_url}/courses/{course_id}?checkout=cancelled"),
    };

    let session = state.payments.create_checkout_session(params).await?;

    info!(
        course_id = %course_id,
        user_id = %user.user_id,
        session_id = %session.id,
        "Checkout session created"
    );

    Ok(Json(json!({
        "session_id": session.id,
        "url": session.url,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::FromPrimitive;

    #[test]
    fn test_amount_minor() {
        let price = BigDecimal::from_f64(49.99).unwrap().with_scale(2);
        assert_eq!(amount_minor(&price).unwrap(), 4999);

        let free = BigDecimal::from(0);
        assert_eq!(amount_minor(&free).unwrap(), 0);

        let whole = BigDecimal::from(120);
        assert_eq!(amount_minor(&whole).unwrap(), 12000);
    }
}
