//! Enrollment handlers: listing the caller's enrollments and the free/direct
//! enrollment path.

use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::course::Course;
use crate::models::enrollment::Enrollment;
use crate::web::auth::CurrentUser;
use crate::web::errors::ApiError;
use crate::web::state::AppState;

use super::courses::CourseResponse;

#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub course_id: Option<Uuid>,
}

/// `GET /api/enrollments`
///
/// The caller's enrollments, with the course row joined in for course
/// enrollments. Falls back to an empty list on database failure.
pub async fn list_enrollments(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Json<serde_json::Value> {
    let enrollments = match Enrollment::list_for_user(&state.db_pool, &user.user_id).await {
        Ok(enrollments) => enrollments,
        Err(err) => {
            warn!(error = %err, user_id = %user.user_id, "Enrollment list query failed, serving fallback");
            return Json(json!({
                "enrollments": [],
                "_meta": { "source": "fallback", "count": 0 },
            }));
        }
    };

    let course_ids: Vec<Uuid> = enrollments
        .iter()
        .filter(|e| e.content_type == "course")
        .map(|e| e.content_id)
        .collect();

    let mut courses_by_id: HashMap<Uuid, CourseResponse> = HashMap::new();
    if !course_ids.is_empty() {
        match Course::find_by_ids(&state.db_pool, &course_ids).await {
            Ok(courses) => {
                courses_by_id = courses
                    .into_iter()
                    .map(|course| (course.id, course.into()))
                    .collect();
            }
            Err(err) => {
                warn!(error = %err, "Course join for enrollments failed");
            }
        }
    }

    let entries: Vec<serde_json::Value> = enrollments
        .into_iter()
        .map(|enrollment| {
            let course = if enrollment.content_type == "course" {
                courses_by_id.remove(&enrollment.content_id)
            } else {
                None
            };
            json!({
                "enrollment": enrollment,
                "course": course,
            })
        })
        .collect();

    let count = entries.len();
    Json(json!({
        "enrollments": entries,
        "_meta": { "source": "database", "count": count },
    }))
}

/// `POST /api/enrollments`, the direct enrollment path (no checkout).
///
/// The capacity check and seat increment are one conditional UPDATE inside
/// the enrollment transaction, so concurrent enrollments cannot oversell a
/// course.
pub async fn create_enrollment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateEnrollmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = body
        .course_id
        .ok_or_else(|| ApiError::BadRequest("Missing required field: course_id".to_string()))?;

    let course = Course::find_published(&state.db_pool, course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    if Enrollment::exists(&state.db_pool, &user.user_id, "course", course_id).await? {
        return Err(ApiError::BadRequest(
            "Already enrolled in this course".to_string(),
        ));
    }

    let mut tx = state.db_pool.begin().await?;

    if !Course::try_claim_seat(&mut *tx, course_id).await? {
        return Err(ApiError::BadRequest("Course is full".to_string()));
    }

    // A concurrent enrollment can slip past the exists() pre-check; the
    // unique constraint catches it here and the rollback releases the seat.
    let enrollment =
        match Enrollment::create_pending(&mut *tx, &user.user_id, "course", course_id).await {
            Ok(enrollment) => enrollment,
            Err(err)
                if err
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation()) =>
            {
                return Err(ApiError::BadRequest(
                    "Already enrolled in this course".to_string(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

    tx.commit().await?;

    info!(
        course_id = %course_id,
        user_id = %user.user_id,
        enrollment_id = %enrollment.id,
        "Enrollment created"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "enrollment": enrollment,
            "course_title": course.title,
        })),
    ))
}
