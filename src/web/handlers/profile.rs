//! Profile handlers.

use axum::extract::{Extension, State};
use axum::Json;
use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::models::profile::{self, ProfileChanges, UserProfile};
use crate::web::auth::CurrentUser;
use crate::web::errors::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub user_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub website_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: i32,
    pub hourly_rate: Option<f64>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(p: UserProfile) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            email: p.email,
            first_name: p.first_name,
            last_name: p.last_name,
            role: p.role,
            bio: p.bio,
            profile_image_url: p.profile_image_url,
            website_url: p.website_url,
            linkedin_url: p.linkedin_url,
            github_url: p.github_url,
            skills: p.skills,
            experience_years: p.experience_years,
            hourly_rate: p.hourly_rate.and_then(|rate| rate.to_f64()),
            is_verified: p.is_verified,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub website_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub hourly_rate: Option<f64>,
}

/// `GET /api/profile`
///
/// First-time callers get a default student profile created from their
/// identity claims.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ProfileResponse>, ApiError> {
    if let Some(existing) = UserProfile::find_by_user_id(&state.db_pool, &user.user_id).await? {
        return Ok(Json(existing.into()));
    }

    let email = user
        .email
        .clone()
        .unwrap_or_else(|| format!("{}@unknown.invalid", user.user_id));
    let created = UserProfile::create_default(&state.db_pool, &user.user_id, &email).await?;

    info!(user_id = %user.user_id, "Created default profile");

    Ok(Json(created.into()))
}

/// `PUT /api/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    if let Some(role) = body.role.as_deref() {
        if !profile::is_valid_role(role) {
            return Err(ApiError::BadRequest(format!(
                "Invalid role '{role}', expected one of: {}",
                profile::ROLES.join(", ")
            )));
        }
    }

    let hourly_rate = match body.hourly_rate {
        Some(rate) if rate < 0.0 => {
            return Err(ApiError::BadRequest(
                "hourly_rate must not be negative".to_string(),
            ))
        }
        Some(rate) => BigDecimal::from_f64(rate).map(|value| value.with_scale(2)),
        None => None,
    };

    let changes = ProfileChanges {
        first_name: body.first_name,
        last_name: body.last_name,
        role: body.role,
        bio: body.bio,
        profile_image_url: body.profile_image_url,
        website_url: body.website_url,
        linkedin_url: body.linkedin_url,
        github_url: body.github_url,
        skills: body.skills,
        experience_years: body.experience_years,
        hourly_rate,
    };

    let updated = UserProfile::update(&state.db_pool, &user.user_id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    info!(user_id = %user.user_id, "Profile updated");

    Ok(Json(updated.into()))
}
