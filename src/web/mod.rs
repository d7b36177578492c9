//! # HTTP API
//!
//! Axum router, shared state, error mapping, and authentication. Public and
//! protected methods can share a path, so the auth middleware is attached per
//! method router rather than to a whole sub-router.

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::{middleware as axum_middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use errors::ApiError;
pub use state::AppState;

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let auth = axum_middleware::from_fn_with_state(state.clone(), middleware::require_auth);

    let mut router = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route(
            "/api/courses",
            get(handlers::courses::list_courses)
                .merge(post(handlers::courses::create_course).route_layer(auth.clone())),
        )
        .route(
            "/api/courses/:id",
            get(handlers::courses::get_course).merge(
                put(handlers::courses::update_course)
                    .delete(handlers::courses::delete_course)
                    .route_layer(auth.clone()),
            ),
        )
        .route(
            "/api/events",
            get(handlers::events::list_events)
                .merge(post(handlers::events::create_event).route_layer(auth.clone())),
        )
        .route(
            "/api/projects",
            get(handlers::projects::list_projects)
                .merge(post(handlers::projects::create_project).route_layer(auth.clone())),
        )
        .route(
            "/api/profile",
            get(handlers::profile::get_profile)
                .put(handlers::profile::update_profile)
                .route_layer(auth.clone()),
        )
        .route(
            "/api/enrollments",
            get(handlers::enrollments::list_enrollments)
                .post(handlers::enrollments::create_enrollment)
                .route_layer(auth.clone()),
        )
        .route(
            "/api/checkout",
            post(handlers::checkout::create_checkout).route_layer(auth),
        )
        .route(
            "/api/webhooks/stripe",
            post(handlers::webhooks::handle_stripe_webhook),
        )
        .route(
            "/api/newsletter",
            get(handlers::newsletter::list_subscriptions).post(handlers::newsletter::subscribe),
        )
        .route(
            "/api/analytics",
            get(handlers::analytics::query_events).post(handlers::analytics::ingest_event),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    if state.config.cors.enabled {
        router = router.layer(cors_layer(&state.config.cors.allowed_origins));
    }

    router
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}
