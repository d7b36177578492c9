//! Authentication middleware.
//!
//! Applied as a `route_layer` on the protected router; verified identity is
//! inserted as a [`CurrentUser`] extension for handlers to pick up.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::web::auth::{extract_bearer_token, CurrentUser};
use crate::web::errors::ApiError;
use crate::web::state::AppState;

/// Require a verified session on the request.
///
/// With auth disabled (local development) the configured dev identity is
/// injected instead, so protected routes stay exercisable without a running
/// identity provider.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.auth.enabled {
        request.extensions_mut().insert(CurrentUser {
            user_id: state.config.auth.dev_user_id.clone(),
            email: None,
        });
        return Ok(next.run(request).await);
    }

    let token = extract_bearer_token(request.headers()).map_err(|_| ApiError::Unauthorized)?;
    let claims = state.jwt.verify(token).map_err(|err| {
        debug!(error = %err, "Session token rejected");
        ApiError::Unauthorized
    })?;

    request.extensions_mut().insert(CurrentUser {
        user_id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(request).await)
}
