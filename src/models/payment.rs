//! Append-style records of payment-processor events.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

/// A payment record. Maps to the `payments` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub provider_payment_intent_id: String,
    pub provider_session_id: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
    pub status: String,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for recording a processor event.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub enrollment_id: Uuid,
    pub provider_payment_intent_id: String,
    pub provider_session_id: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
    pub status: String,
    pub payment_method: Option<String>,
}

impl Payment {
    /// Record a payment event.
    ///
    /// Keyed on the checkout session: a redelivered webhook for the same
    /// session lands on the conflict and returns `None` instead of inserting
    /// a second row.
    pub async fn create<'e, E>(
        executor: E,
        new_payment: NewPayment,
    ) -> Result<Option<Payment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments
                (enrollment_id, provider_payment_intent_id, provider_session_id,
                 amount, currency, status, payment_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (provider_session_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(new_payment.enrollment_id)
        .bind(&new_payment.provider_payment_intent_id)
        .bind(&new_payment.provider_session_id)
        .bind(&new_payment.amount)
        .bind(&new_payment.currency)
        .bind(&new_payment.status)
        .bind(&new_payment.payment_method)
        .fetch_optional(executor)
        .await
    }

    /// Update the status of payments matching a payment intent.
    pub async fn update_status_by_intent(
        pool: &PgPool,
        payment_intent_id: &str,
        status: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $2, updated_at = NOW()
            WHERE provider_payment_intent_id = $1
            "#,
        )
        .bind(payment_intent_id)
        .bind(status)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
