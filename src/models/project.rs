//! Guided and mentored projects.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Valid values for the `difficulty_level` column.
pub const DIFFICULTY_LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];

/// Valid values for the `project_type` column.
pub const PROJECT_TYPES: &[&str] = &["guided", "mentored", "collaborative", "individual"];

/// A project offering. Maps to the `projects` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub tutor_id: String,
    pub title: String,
    pub description: String,
    pub difficulty_level: String,
    pub estimated_duration: String,
    pub price: BigDecimal,
    pub technologies: Vec<String>,
    pub requirements: Vec<String>,
    pub deliverables: Vec<String>,
    pub max_participants: Option<i32>,
    pub current_participants: i32,
    pub project_type: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for project creation.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub tutor_id: String,
    pub title: String,
    pub description: String,
    pub difficulty_level: String,
    pub estimated_duration: String,
    pub price: BigDecimal,
    pub technologies: Vec<String>,
    pub requirements: Vec<String>,
    pub deliverables: Vec<String>,
    pub max_participants: Option<i32>,
    pub project_type: String,
    pub is_published: bool,
}

impl Project {
    /// Create a new project with zero participants.
    pub async fn create(pool: &PgPool, new_project: NewProject) -> Result<Project, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects
                (tutor_id, title, description, difficulty_level, estimated_duration, price,
                 technologies, requirements, deliverables, max_participants,
                 current_participants, project_type, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&new_project.tutor_id)
        .bind(&new_project.title)
        .bind(&new_project.description)
        .bind(&new_project.difficulty_level)
        .bind(&new_project.estimated_duration)
        .bind(&new_project.price)
        .bind(&new_project.technologies)
        .bind(&new_project.requirements)
        .bind(&new_project.deliverables)
        .bind(new_project.max_participants)
        .bind(&new_project.project_type)
        .bind(new_project.is_published)
        .fetch_one(pool)
        .await
    }

    /// List projects, newest first, optionally filtered by tutor.
    pub async fn list(
        pool: &PgPool,
        include_unpublished: bool,
        tutor_id: Option<&str>,
    ) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT * FROM projects
            WHERE ($1 OR is_published = true)
              AND ($2::text IS NULL OR tutor_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(include_unpublished)
        .bind(tutor_id)
        .fetch_all(pool)
        .await
    }
}

/// Whether a difficulty string is one of the accepted values.
pub fn is_valid_difficulty(difficulty: &str) -> bool {
    DIFFICULTY_LEVELS.contains(&difficulty)
}

/// Whether a project type string is one of the accepted values.
pub fn is_valid_project_type(project_type: &str) -> bool {
    PROJECT_TYPES.contains(&project_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_validation() {
        assert!(is_valid_difficulty("beginner"));
        assert!(!is_valid_difficulty("impossible"));
    }

    #[test]
    fn test_project_type_validation() {
        for valid in PROJECT_TYPES {
            assert!(is_valid_project_type(valid));
        }
        assert!(!is_valid_project_type("solo"));
        assert!(!is_valid_project_type(""));
    }
}
