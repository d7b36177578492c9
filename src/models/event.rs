//! Scheduled events: workshops, webinars, meetups.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Valid values for the `event_type` column.
pub const EVENT_TYPES: &[&str] = &["workshop", "webinar", "meetup", "conference", "seminar"];

/// An event hosted by a tutor. Maps to the `events` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub tutor_id: String,
    pub title: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub location: Option<String>,
    pub event_type: String,
    pub price: BigDecimal,
    pub max_attendees: Option<i32>,
    pub current_attendees: i32,
    pub technologies: Vec<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for event creation.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub tutor_id: String,
    pub title: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub location: Option<String>,
    pub event_type: String,
    pub price: BigDecimal,
    pub max_attendees: Option<i32>,
    pub technologies: Vec<String>,
    pub is_published: bool,
}

impl Event {
    /// Create a new event with zero attendees.
    pub async fn create(pool: &PgPool, new_event: NewEvent) -> Result<Event, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events
                (tutor_id, title, description, event_date, duration_minutes, location,
                 event_type, price, max_attendees, current_attendees, technologies, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&new_event.tutor_id)
        .bind(&new_event.title)
        .bind(&new_event.description)
        .bind(new_event.event_date)
        .bind(new_event.duration_minutes)
        .bind(&new_event.location)
        .bind(&new_event.event_type)
        .bind(&new_event.price)
        .bind(new_event.max_attendees)
        .bind(&new_event.technologies)
        .bind(new_event.is_published)
        .fetch_one(pool)
        .await
    }

    /// List events ordered by date, optionally filtered by tutor.
    pub async fn list(
        pool: &PgPool,
        include_unpublished: bool,
        tutor_id: Option<&str>,
    ) -> Result<Vec<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events
            WHERE ($1 OR is_published = true)
              AND ($2::text IS NULL OR tutor_id = $2)
            ORDER BY event_date ASC
            "#,
        )
        .bind(include_unpublished)
        .bind(tutor_id)
        .fetch_all(pool)
        .await
    }
}

/// Whether an event type string is one of the accepted values.
pub fn is_valid_event_type(event_type: &str) -> bool {
    EVENT_TYPES.contains(&event_type)
}
