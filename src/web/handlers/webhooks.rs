//! Payment-processor webhook handler.
//!
//! The processor is the source of truth for payment outcomes; this endpoint
//! reconciles its events into enrollments and payment records. Deliveries can
//! arrive more than once, so every mutation here is idempotent.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use bigdecimal::BigDecimal;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::course::Course;
use crate::models::enrollment::Enrollment;
use crate::models::payment::{NewPayment, Payment};
use crate::payments::webhook::{
    self, CheckoutSessionObject, WebhookEvent, EVENT_CHECKOUT_COMPLETED, EVENT_PAYMENT_FAILED,
    EVENT_PAYMENT_SUCCEEDED,
};
use crate::payments::PaymentError;
use crate::web::errors::ApiError;
use crate::web::state::AppState;

/// `POST /api/webhooks/stripe`
///
/// Nothing is mutated before the signature verifies against the raw body.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Payment(PaymentError::MissingSignature))?;

    let event = webhook::construct_event(
        &body,
        signature,
        &state.config.payments.webhook_secret,
    )?;

    debug!(event_id = %event.id, event_type = %event.event_type, "Webhook event verified");

    match event.event_type.as_str() {
        EVENT_CHECKOUT_COMPLETED => handle_checkout_completed(&state, &event).await?,
        EVENT_PAYMENT_SUCCEEDED => {
            let intent = event.payment_intent()?;
            let updated =
                Payment::update_status_by_intent(&state.db_pool, &intent.id, "succeeded").await?;
            info!(payment_intent = %intent.id, updated, "Payment intent succeeded");
        }
        EVENT_PAYMENT_FAILED => {
            let intent = event.payment_intent()?;
            Payment::update_status_by_intent(&state.db_pool, &intent.id, "failed").await?;
            let failed = Enrollment::mark_payment_failed(&state.db_pool, &intent.id).await?;
            warn!(payment_intent = %intent.id, enrollments = failed, "Payment intent failed");
        }
        other => {
            debug!(event_type = %other, "Ignoring unhandled webhook event type");
        }
    }

    Ok(Json(json!({ "received": true })))
}

/// Reconcile a completed checkout into an enrollment and payment record.
///
/// Runs in one transaction: the enrollment upsert, the payment insert, and
/// the seat-counter increment land together or not at all. Redeliveries are
/// detected by the locked enrollment row (the seat is claimed only when no
/// row exists yet) and by the unique session key on payments. Unusable
/// events (missing metadata, vanished course) are logged and dropped rather
/// than errored, since a non-2xx would only make the processor redeliver
/// them.
async fn handle_checkout_completed(
    state: &AppState,
    event: &WebhookEvent,
) -> Result<(), ApiError> {
    let session: CheckoutSessionObject = event.checkout_session()?;

    let (course_id, user_id) = match session_metadata(&session) {
        Some(ids) => ids,
        None => {
            warn!(
                session_id = %session.id,
                "Checkout session missing course/user metadata, dropping event"
            );
            return Ok(());
        }
    };

    let mut tx = state.db_pool.begin().await?;

    let course = match Course::find_by_id(&mut *tx, course_id).await? {
        Some(course) => course,
        None => {
            warn!(
                session_id = %session.id,
                course_id = %course_id,
                "Checkout completed for unknown course, dropping event"
            );
            return Ok(());
        }
    };

    let amount = session
        .amount_total
        .map(|total| (BigDecimal::from(total) / BigDecimal::from(100)).with_scale(2))
        .unwrap_or_else(|| course.price.clone());

    // An existing row means a seat was already claimed, either by the direct
    // enrollment path or by an earlier delivery of this event.
    let existing_status =
        Enrollment::payment_status_for_update(&mut *tx, &user_id, "course", course_id).await?;

    if existing_status.is_none() {
        // The money is already captured; a course that filled between
        // checkout and completion still gets the enrollment, with the drift
        // logged.
        if !Course::try_claim_seat(&mut *tx, course_id).await? {
            warn!(
                course_id = %course_id,
                "Course at capacity during payment reconciliation, honoring paid enrollment"
            );
            Course::claim_seat_unchecked(&mut *tx, course_id).await?;
        }
    }

    let payment_intent_id = session
        .payment_intent
        .clone()
        .unwrap_or_else(|| session.id.clone());

    let enrollment = Enrollment::upsert_paid(
        &mut *tx,
        &user_id,
        "course",
        course_id,
        Some(&payment_intent_id),
        &amount,
    )
    .await?;

    let payment = Payment::create(
        &mut *tx,
        NewPayment {
            enrollment_id: enrollment.id,
            provider_payment_intent_id: payment_intent_id.clone(),
            provider_session_id: Some(session.id.clone()),
            amount,
            currency: session
                .currency
                .clone()
                .unwrap_or_else(|| state.config.payments.currency.clone()),
            status: "succeeded".to_string(),
            payment_method: session.payment_method_types.first().cloned(),
        },
    )
    .await?;

    if payment.is_none() {
        debug!(
            session_id = %session.id,
            "Payment record already exists for this session, treating as redelivery"
        );
    }

    tx.commit().await?;

    info!(
        course_id = %course_id,
        user_id = %user_id,
        enrollment_id = %enrollment.id,
        payment_intent = %payment_intent_id,
        "Checkout payment reconciled"
    );

    // TODO: queue the welcome email once an email delivery path exists.

    Ok(())
}

fn session_metadata(session: &CheckoutSessionObject) -> Option<(Uuid, String)> {
    let course_id = session
        .metadata
        .get("course_id")
        .and_then(|raw| Uuid::parse_str(raw).ok())?;
    let user_id = session.metadata.get("user_id")?.clone();

    Some((course_id, user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn session_with(metadata: HashMap<String, String>) -> CheckoutSessionObject {
        CheckoutSessionObject {
            id: "cs_1".to_string(),
            payment_intent: Some("pi_1".to_string()),
            amount_total: Some(4999),
            currency: Some("usd".to_string()),
            metadata,
            payment_method_types: vec!["card".to_string()],
        }
    }

    #[test]
    fn test_session_metadata_extraction() {
        let course_id = Uuid::new_v4();
        let mut metadata = HashMap::new();
        metadata.insert("course_id".to_string(), course_id.to_string());
        metadata.insert("user_id".to_string(), "user_1".to_string());

        let (parsed_course, parsed_user) = session_metadata(&session_with(metadata)).unwrap();
        assert_eq!(parsed_course, course_id);
        assert_eq!(parsed_user, "user_1");
    }

    #[test]
    fn test_session_metadata_missing_or_malformed() {
        assert!(session_metadata(&session_with(HashMap::new())).is_none());

        let mut metadata = HashMap::new();
        metadata.insert("course_id".to_string(), "not-a-uuid".to_string());
        metadata.insert("user_id".to_string(), "user_1".to_string());
        assert!(session_metadata(&session_with(metadata)).is_none());
    }
}
