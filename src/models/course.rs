//! Course catalog entries.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

/// Valid values for the `level` column.
pub const COURSE_LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];

/// A course offered on the marketplace. Maps to the `courses` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub tutor_id: String,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub level: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub technologies: Vec<String>,
    pub max_students: Option<i32>,
    pub current_students: i32,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for course creation.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub tutor_id: String,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub level: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub technologies: Vec<String>,
    pub max_students: Option<i32>,
    pub is_published: bool,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub level: Option<String>,
    pub price: Option<BigDecimal>,
    pub image_url: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub max_students: Option<i32>,
    pub is_published: Option<bool>,
}

impl Course {
    /// Create a new course with zero enrolled students.
    pub async fn create(pool: &PgPool, new_course: NewCourse) -> Result<Course, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses
                (tutor_id, title, description, duration, level, price, image_url,
                 technologies, max_students, current_students, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, $10)
            RETURNING *
            "#,
        )
        .bind(&new_course.tutor_id)
        .bind(&new_course.title)
        .bind(&new_course.description)
        .bind(&new_course.duration)
        .bind(&new_course.level)
        .bind(&new_course.price)
        .bind(&new_course.image_url)
        .bind(&new_course.technologies)
        .bind(new_course.max_students)
        .bind(new_course.is_published)
        .fetch_one(pool)
        .await
    }

    /// Find a course by id.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Course>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a published course by id.
    pub async fn find_published(pool: &PgPool, id: Uuid) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE id = $1 AND is_published = true",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Find courses by id set, used to join course data onto enrollments.
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// List courses, newest first. Unpublished rows only when requested.
    pub async fn list(pool: &PgPool, include_unpublished: bool) -> Result<Vec<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE ($1 OR is_published = true)
            ORDER BY created_at DESC
            "#,
        )
        .bind(include_unpublished)
        .fetch_all(pool)
        .await
    }

    /// Apply a partial update. Returns `None` when the course does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: CourseChanges,
    ) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                duration = COALESCE($4, duration),
                level = COALESCE($5, level),
                price = COALESCE($6, price),
                image_url = COALESCE($7, image_url),
                technologies = COALESCE($8, technologies),
                max_students = COALESCE($9, max_students),
                is_published = COALESCE($10, is_published),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.duration)
        .bind(&changes.level)
        .bind(&changes.price)
        .bind(&changes.image_url)
        .bind(&changes.technologies)
        .bind(changes.max_students)
        .bind(changes.is_published)
        .fetch_optional(pool)
        .await
    }

    /// Delete a course. Returns whether a row was removed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether any enrollment references this course.
    pub async fn has_enrollments(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM enrollments
                WHERE content_type = 'course' AND content_id = $1
            )
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(row.0)
    }

    /// Atomically claim a seat, failing when the course is at capacity.
    ///
    /// The capacity check and the increment are a single conditional UPDATE;
    /// a return of `false` means the course was full. This replaces the
    /// read-then-write counter update that could oversell under concurrency.
    pub async fn try_claim_seat<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE courses
            SET current_students = current_students + 1, updated_at = NOW()
            WHERE id = $1
              AND (max_students IS NULL OR current_students < max_students)
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Increment the seat counter without a capacity check.
    ///
    /// Only used by the webhook path when a completed payment arrives for a
    /// course that filled up in the meantime: the money is already captured,
    /// so the enrollment is honored and the drift is logged by the caller.
    pub async fn claim_seat_unchecked<'e, E>(executor: E, id: Uuid) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            UPDATE courses
            SET current_students = current_students + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Whether the course has no free seats left.
    pub fn is_full(&self) -> bool {
        match self.max_students {
            Some(max) => self.current_students >= max,
            None => false,
        }
    }
}

/// Whether a level string is one of the accepted values.
pub fn is_valid_level(level: &str) -> bool {
    COURSE_LEVELS.contains(&level)
}
