//! User profiles keyed by the managed identity provider's user id.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Valid values for the `role` column.
pub const ROLES: &[&str] = &["student", "tutor", "admin"];

/// A user's marketplace profile. Maps to the `user_profiles` table.
///
/// The identity itself lives at the auth provider; `user_id` is its external
/// id. Profiles are created lazily on first fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
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
    pub hourly_rate: Option<BigDecimal>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
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
    pub hourly_rate: Option<BigDecimal>,
}

impl UserProfile {
    /// Find a profile by the external user id.
    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: &str,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Create a profile with student defaults for a first-time caller.
    pub async fn create_default(
        pool: &PgPool,
        user_id: &str,
        email: &str,
    ) -> Result<UserProfile, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (user_id, email, role, skills, experience_years, is_verified)
            VALUES ($1, $2, 'student', '{}', 0, false)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(email)
        .fetch_one(pool)
        .await
    }

    /// Fetch the caller's role, if a profile exists.
    pub async fn role_for_user(
        pool: &PgPool,
        user_id: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT role FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        Ok(row.map(|(role,)| role))
    }

    /// Apply a partial update. Returns `None` when no profile exists.
    pub async fn update(
        pool: &PgPool,
        user_id: &str,
        changes: ProfileChanges,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE user_profiles
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                role = COALESCE($4, role),
                bio = COALESCE($5, bio),
                profile_image_url = COALESCE($6, profile_image_url),
                website_url = COALESCE($7, website_url),
                linkedin_url = COALESCE($8, linkedin_url),
                github_url = COALESCE($9, github_url),
                skills = COALESCE($10, skills),
                experience_years = COALESCE($11, experience_years),
                hourly_rate = COALESCE($12, hourly_rate),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.role)
        .bind(&changes.bio)
        .bind(&changes.profile_image_url)
        .bind(&changes.website_url)
        .bind(&changes.linkedin_url)
        .bind(&changes.github_url)
        .bind(&changes.skills)
        .bind(changes.experience_years)
        .bind(&changes.hourly_rate)
        .fetch_optional(pool)
        .await
    }
}

/// Whether a role string is one of the accepted values.
pub fn is_valid_role(role: &str) -> bool {
    ROLES.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_validation() {
        assert!(is_valid_role("student"));
        assert!(is_valid_role("tutor"));
        assert!(is_valid_role("admin"));
        assert!(!is_valid_role("superuser"));
        assert!(!is_valid_role("Tutor"));
    }
}
