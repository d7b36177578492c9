//! Newsletter subscriptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A newsletter subscription row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NewsletterSubscription {
    pub id: Uuid,
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
    pub is_active: bool,
}

impl NewsletterSubscription {
    /// Find a subscription by email.
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<NewsletterSubscription>, sqlx::Error> {
        sqlx::query_as::<_, NewsletterSubscription>(
            "SELECT * FROM newsletter_subscriptions WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Subscribe an email address.
    pub async fn create(
        pool: &PgPool,
        email: &str,
    ) -> Result<NewsletterSubscription, sqlx::Error> {
        sqlx::query_as::<_, NewsletterSubscription>(
            r#"
            INSERT INTO newsletter_subscriptions (email, is_active)
            VALUES ($1, true)
            RETURNING *
            "#,
        )
        .bind(email)
        .fetch_one(pool)
        .await
    }

    /// All subscriptions, newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<NewsletterSubscription>, sqlx::Error> {
        sqlx::query_as::<_, NewsletterSubscription>(
            "SELECT * FROM newsletter_subscriptions ORDER BY subscribed_at DESC",
        )
        .fetch_all(pool)
        .await
    }
}
