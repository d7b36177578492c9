//! Analytics event ingestion and querying.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A recorded analytics event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AnalyticsEvent {
    pub id: Uuid,
    pub event_name: String,
    pub properties: serde_json::Value,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for recording an event.
#[derive(Debug, Clone)]
pub struct NewAnalyticsEvent {
    pub event_name: String,
    pub properties: serde_json::Value,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Query filters for the analytics read path.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsFilter {
    pub event_name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: i64,
}

impl AnalyticsEvent {
    /// Record an event.
    pub async fn create(
        pool: &PgPool,
        new_event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent, sqlx::Error> {
        sqlx::query_as::<_, AnalyticsEvent>(
            r#"
            INSERT INTO analytics_events
                (event_name, properties, user_agent, referer, ip_address, created_at)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW()))
            RETURNING *
            "#,
        )
        .bind(&new_event.event_name)
        .bind(&new_event.properties)
        .bind(&new_event.user_agent)
        .bind(&new_event.referer)
        .bind(&new_event.ip_address)
        .bind(new_event.created_at)
        .fetch_one(pool)
        .await
    }

    /// Query events, newest first, with optional name and date-range filters.
    pub async fn query(
        pool: &PgPool,
        filter: &AnalyticsFilter,
    ) -> Result<Vec<AnalyticsEvent>, sqlx::Error> {
        sqlx::query_as::<_, AnalyticsEvent>(
            r#"
            SELECT * FROM analytics_events
            WHERE ($1::text IS NULL OR event_name = $1)
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(&filter.event_name)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.limit)
        .fetch_all(pool)
        .await
    }
}
