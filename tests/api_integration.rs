//! Router-level integration tests.
//!
//! These drive the full router with `tower::ServiceExt::oneshot` against a
//! lazily-connected pool pointed at an unreachable database, which exercises
//! request validation, auth gating, signature checks, and the degraded-read
//! fallbacks without needing Postgres.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use coursehub::config::AppConfig;
use coursehub::database::connect_lazy;
use coursehub::payments::webhook::compute_signature;
use coursehub::web::{build_router, AppState};

const WEBHOOK_SECRET: &str = "whsec_router_tests";

fn test_config() -> AppConfig {
    let mut config = AppConfig::load_for_environment("test").expect("test config loads");
    // Nothing listens here; lazy pools fail fast on first acquire.
    config.database.url = "postgres://127.0.0.1:1/unreachable".to_string();
    config.database.acquire_timeout_seconds = 1;
    config.database.min_connections = 0;
    config.payments.webhook_secret = WEBHOOK_SECRET.to_string();
    config
}

fn test_router(config: AppConfig) -> axum::Router {
    let pool = connect_lazy(&config.database).expect("lazy pool");
    build_router(AppState::new(config, pool))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_is_always_ok() {
    let router = test_router(test_config());

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_reports_degraded_without_database() {
    let router = test_router(test_config());

    let response = router
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_course_list_falls_back_on_database_failure() {
    let router = test_router(test_config());

    let response = router
        .oneshot(Request::get("/api/courses").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["_meta"]["source"], "fallback");
    assert_eq!(body["courses"], json!([]));
}

#[tokio::test]
async fn test_create_course_rejects_invalid_level() {
    let router = test_router(test_config());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/courses",
            json!({
                "title": "Intro to Rust",
                "description": "Ownership and borrowing",
                "duration": "6 weeks",
                "level": "expert",
                "price": 49.99,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_create_course_rejects_negative_price() {
    let router = test_router(test_config());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/courses",
            json!({
                "title": "Intro to Rust",
                "description": "Ownership and borrowing",
                "duration": "6 weeks",
                "level": "beginner",
                "price": -1.0,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_course_rejects_missing_title() {
    let router = test_router(test_config());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/courses",
            json!({
                "description": "Ownership and borrowing",
                "duration": "6 weeks",
                "level": "beginner",
                "price": 49.99,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_event_rejects_invalid_type() {
    let router = test_router(test_config());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/events",
            json!({
                "title": "Rust Night",
                "description": "Monthly meetup",
                "event_date": "2026-09-01T18:00:00Z",
                "duration_minutes": 90,
                "event_type": "hackathon",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_project_rejects_invalid_type() {
    let router = test_router(test_config());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/projects",
            json!({
                "title": "Build a CLI",
                "description": "A guided project",
                "difficulty_level": "beginner",
                "estimated_duration": "2 weeks",
                "project_type": "solo",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_requires_course_id() {
    let router = test_router(test_config());

    let response = router
        .oneshot(json_request("POST", "/api/checkout", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_enrollment_requires_course_id() {
    let router = test_router(test_config());

    let response = router
        .oneshot(json_request("POST", "/api/enrollments", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_newsletter_rejects_invalid_email() {
    let router = test_router(test_config());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/newsletter",
            json!({ "email": "not-an-email" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analytics_requires_event_name() {
    let router = test_router(test_config());

    let response = router
        .oneshot(json_request("POST", "/api/analytics", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analytics_swallows_storage_failure() {
    let router = test_router(test_config());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/analytics",
            json!({ "event": "page_view", "properties": { "path": "/" } }),
        ))
        .await
        .unwrap();

    // The database is unreachable, but ingestion still acknowledges.
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_webhook_rejects_missing_signature() {
    let router = test_router(test_config());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/webhooks/stripe",
            json!({ "id": "evt_1", "type": "noop", "data": { "object": {} } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let router = test_router(test_config());

    let response = router
        .oneshot(
            Request::post("/api/webhooks/stripe")
                .header(header::CONTENT_TYPE, "application/json")
                .header("stripe-signature", "t=1,v1=deadbeef")
                .body(Body::from(
                    json!({ "id": "evt_1", "type": "noop", "data": { "object": {} } }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_SIGNATURE");
}

#[tokio::test]
async fn test_webhook_acknowledges_unhandled_event_type() {
    let router = test_router(test_config());

    let payload =
        json!({ "id": "evt_1", "type": "customer.created", "data": { "object": {} } }).to_string();
    let timestamp = chrono::Utc::now().timestamp();
    let signature = compute_signature(payload.as_bytes(), WEBHOOK_SECRET, timestamp).unwrap();

    let response = router
        .oneshot(
            Request::post("/api/webhooks/stripe")
                .header(header::CONTENT_TYPE, "application/json")
                .header("stripe-signature", format!("t={timestamp},v1={signature}"))
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["received"], true);
}

#[tokio::test]
async fn test_protected_route_rejects_missing_token_when_auth_enabled() {
    let mut config = test_config();
    config.auth.enabled = true;

    let router = test_router(config);

    let response = router
        .oneshot(Request::get("/api/profile").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_protected_route_rejects_garbage_token() {
    let mut config = test_config();
    config.auth.enabled = true;

    let router = test_router(config);

    let response = router
        .oneshot(
            Request::get("/api/profile")
                .header(header::AUTHORIZATION, "Bearer not.a.jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_listing_does_not_require_auth() {
    let mut config = test_config();
    config.auth.enabled = true;

    let router = test_router(config);

    let response = router
        .oneshot(Request::get("/api/events").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
