//! Event listing and creation handlers.

use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bigdecimal::ToPrimitive;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::event::{self, Event, NewEvent};
use crate::web::auth::CurrentUser;
use crate::web::errors::ApiError;
use crate::web::state::AppState;

use super::courses::parse_price;
use super::require_role;

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub tutor_id: String,
    pub title: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub location: Option<String>,
    pub event_type: String,
    pub price: f64,
    pub max_attendees: Option<i32>,
    pub current_attendees: i32,
    pub technologies: Vec<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            tutor_id: event.tutor_id,
            title: event.title,
            description: event.description,
            event_date: event.event_date,
            duration_minutes: event.duration_minutes,
            location: event.location,
            event_type: event.event_type,
            price: event.price.to_f64().unwrap_or(0.0),
            max_attendees: event.max_attendees,
            current_attendees: event.current_attendees,
            technologies: event.technologies,
            is_published: event.is_published,
            created_at: event.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    #[serde(default)]
    pub include_unpublished: bool,
    pub tutor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub location: Option<String>,
    pub event_type: Option<String>,
    pub price: Option<f64>,
    pub max_attendees: Option<i32>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub is_published: bool,
}

/// `GET /api/events`
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Json<serde_json::Value> {
    match Event::list(
        &state.db_pool,
        query.include_unpublished,
        query.tutor_id.as_deref(),
    )
    .await
    {
        Ok(events) => {
            let events: Vec<EventResponse> = events.into_iter().map(Into::into).collect();
            let count = events.len();
            Json(json!({
                "events": events,
                "_meta": { "source": "database", "count": count },
            }))
        }
        Err(err) => {
            warn!(error = %err, "Event list query failed, serving fallback");
            Json(json!({
                "events": [],
                "_meta": { "source": "fallback", "count": 0 },
            }))
        }
    }
}

/// `POST /api/events`, tutor role required.
pub async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = body
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required field: title".to_string()))?;
    let description = body
        .description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required field: description".to_string()))?;
    let event_date = body
        .event_date
        .ok_or_else(|| ApiError::BadRequest("Missing required field: event_date".to_string()))?;
    let duration_minutes = body.duration_minutes.ok_or_else(|| {
        ApiError::BadRequest("Missing required field: duration_minutes".to_string())
    })?;
    let event_type = body
        .event_type
        .ok_or_else(|| ApiError::BadRequest("Missing required field: event_type".to_string()))?;

    if !event::is_valid_event_type(&event_type) {
        return Err(ApiError::BadRequest(format!(
            "Invalid event_type '{event_type}', expected one of: {}",
            event::EVENT_TYPES.join(", ")
        )));
    }
    if duration_minutes <= 0 {
        return Err(ApiError::BadRequest(
            "duration_minutes must be positive".to_string(),
        ));
    }
    let price = parse_price(body.price.unwrap_or(0.0))?;

    require_role(&state.db_pool, &user.user_id, &["tutor", "admin"]).await?;

    let created = Event::create(
        &state.db_pool,
        NewEvent {
            tutor_id: user.user_id.clone(),
            title,
            description,
            event_date,
            duration_minutes,
            location: body.location,
            event_type,
            price,
            max_attendees: body.max_attendees,
            technologies: body.technologies,
            is_published: body.is_published,
        },
    )
    .await?;

    info!(event_id = %created.id, tutor_id = %user.user_id, "Event created");

    Ok((StatusCode::CREATED, Json(EventResponse::from(created))))
}
