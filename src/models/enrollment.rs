//! Enrollments: the record linking a user to purchased/joined content.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

/// Content kinds an enrollment can reference.
pub const CONTENT_TYPES: &[&str] = &["course", "event", "project"];

/// An enrollment row. One per (user, content item), enforced by a database
/// UNIQUE constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: String,
    pub content_type: String,
    pub content_id: Uuid,
    pub enrollment_date: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
    pub progress: i32,
    pub status: String,
    pub payment_status: String,
    pub provider_payment_intent_id: Option<String>,
    pub amount_paid: Option<BigDecimal>,
}

impl Enrollment {
    /// Whether the user already holds an enrollment for this content item.
    pub async fn exists(
        pool: &PgPool,
        user_id: &str,
        content_type: &str,
        content_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM enrollments
                WHERE user_id = $1 AND content_type = $2 AND content_id = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(content_type)
        .bind(content_id)
        .fetch_one(pool)
        .await?;

        Ok(row.0)
    }

    /// Create an enrollment awaiting payment (direct enrollment path).
    pub async fn create_pending<'e, E>(
        executor: E,
        user_id: &str,
        content_type: &str,
        content_id: Uuid,
    ) -> Result<Enrollment, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments (user_id, content_type, content_id, status, payment_status)
            VALUES ($1, $2, $3, 'enrolled', 'pending')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(content_type)
        .bind(content_id)
        .fetch_one(executor)
        .await
    }

    /// Upsert an enrollment as paid after a completed checkout.
    ///
    /// Keyed on the (user, content) uniqueness constraint so a retried
    /// webhook delivery lands on the same row instead of duplicating it.
    pub async fn upsert_paid<'e, E>(
        executor: E,
        user_id: &str,
        content_type: &str,
        content_id: Uuid,
        payment_intent_id: Option<&str>,
        amount_paid: &BigDecimal,
    ) -> Result<Enrollment, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments
                (user_id, content_type, content_id, status, payment_status,
                 provider_payment_intent_id, amount_paid)
            VALUES ($1, $2, $3, 'enrolled', 'paid', $4, $5)
            ON CONFLICT (user_id, content_type, content_id)
            DO UPDATE SET status = 'enrolled',
                          payment_status = 'paid',
                          provider_payment_intent_id = EXCLUDED.provider_payment_intent_id,
                          amount_paid = EXCLUDED.amount_paid
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(content_type)
        .bind(content_id)
        .bind(payment_intent_id)
        .bind(amount_paid)
        .fetch_one(executor)
        .await
    }

    /// The enrollment's payment status, locking the row for the rest of the
    /// transaction. `None` when the user has no enrollment for this content.
    pub async fn payment_status_for_update<'e, E>(
        executor: E,
        user_id: &str,
        content_type: &str,
        content_id: Uuid,
    ) -> Result<Option<String>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT payment_status FROM enrollments
            WHERE user_id = $1 AND content_type = $2 AND content_id = $3
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(content_type)
        .bind(content_id)
        .fetch_optional(executor)
        .await?;

        Ok(row.map(|(status,)| status))
    }

    /// The caller's enrollments, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: &str,
    ) -> Result<Vec<Enrollment>, sqlx::Error> {
        sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT * FROM enrollments
            WHERE user_id = $1
            ORDER BY enrollment_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Mark enrollments failed for a payment intent the processor rejected.
    pub async fn mark_payment_failed(
        pool: &PgPool,
        payment_intent_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE enrollments
            SET payment_status = 'failed'
            WHERE provider_payment_intent_id = $1
            "#,
        )
        .bind(payment_intent_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
