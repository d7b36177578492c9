//! Request handlers, one module per resource.

pub mod analytics;
pub mod checkout;
pub mod courses;
pub mod enrollments;
pub mod events;
pub mod health;
pub mod newsletter;
pub mod profile;
pub mod projects;
pub mod webhooks;

use sqlx::PgPool;

use crate::models::profile::UserProfile;

use super::errors::ApiError;

/// Look up the caller's role and require it to be one of `allowed`.
///
/// A missing profile is treated as the default student role, which fails any
/// tutor/admin gate.
pub(crate) async fn require_role(
    pool: &PgPool,
    user_id: &str,
    allowed: &[&str],
) -> Result<String, ApiError> {
    let role = UserProfile::role_for_user(pool, user_id)
        .await?
        .unwrap_or_else(|| "student".to_string());

    if allowed.contains(&role.as_str()) {
        Ok(role)
    } else {
        Err(ApiError::Forbidden(format!(
            "Requires one of the roles: {}",
            allowed.join(", ")
        )))
    }
}
