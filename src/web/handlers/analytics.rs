//! Analytics ingestion and reporting.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;

use crate::models::analytics::{AnalyticsEvent, AnalyticsFilter, NewAnalyticsEvent};
use crate::web::errors::ApiError;
use crate::web::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub event: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Value,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub event: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

/// `POST /api/analytics`
///
/// Storage failures are swallowed: tracking must never take a page down with
/// it. The event name is still required, since a nameless event is useless.
pub async fn ingest_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<IngestRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let event_name = body
        .event
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required field: event".to_string()))?;

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    let properties = match body.properties {
        serde_json::Value::Null => json!({}),
        other => other,
    };

    let new_event = NewAnalyticsEvent {
        event_name,
        properties,
        user_agent: header("user-agent"),
        referer: header("referer"),
        ip_address: header("x-forwarded-for")
            .map(|raw| raw.split(',').next().unwrap_or("").trim().to_string()),
        created_at: body.timestamp,
    };

    if let Err(err) = AnalyticsEvent::create(&state.db_pool, new_event).await {
        warn!(error = %err, "Failed to store analytics event, acknowledging anyway");
    }

    Ok(Json(json!({ "success": true })))
}

/// `GET /api/analytics`
pub async fn query_events(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = AnalyticsFilter {
        event_name: query.event,
        start_date: query.start_date,
        end_date: query.end_date,
        limit: query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
    };

    let events = AnalyticsEvent::query(&state.db_pool, &filter).await?;

    let unique_events: Vec<String> = events
        .iter()
        .map(|event| event.event_name.clone())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();

    let summary = json!({
        "total": events.len(),
        "unique_events": unique_events,
        "date_range": {
            "start": filter.start_date,
            "end": filter.end_date,
        },
        "top_events": top_events(&events, 10),
    });

    Ok(Json(json!({
        "events": events,
        "summary": summary,
    })))
}

/// The most frequent event names, descending by count, name as tiebreaker.
fn top_events(events: &[AnalyticsEvent], limit: usize) -> Vec<serde_json::Value> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for event in events {
        *counts.entry(event.event_name.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(name, count)| json!({ "event": name, "count": count }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn event(name: &str) -> AnalyticsEvent {
        AnalyticsEvent {
            id: Uuid::new_v4(),
            event_name: name.to_string(),
            properties: json!({}),
            user_agent: None,
            referer: None,
            ip_address: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_top_events_ranking() {
        let events: Vec<AnalyticsEvent> = ["page_view", "page_view", "signup", "page_view", "click", "signup"]
            .iter()
            .map(|name| event(name))
            .collect();

        let top = top_events(&events, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0]["event"], "page_view");
        assert_eq!(top[0]["count"], 3);
        assert_eq!(top[1]["event"], "signup");
    }

    #[test]
    fn test_top_events_empty() {
        assert!(top_events(&[], 10).is_empty());
    }
}
