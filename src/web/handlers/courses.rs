//! Course catalog handlers.

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::course::{self, Course, CourseChanges, NewCourse};
use crate::web::auth::CurrentUser;
use crate::web::errors::ApiError;
use crate::web::state::AppState;

use super::require_role;

/// Course as it appears on the wire; prices as plain JSON numbers.
#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub id: Uuid,
    pub tutor_id: String,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub level: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub technologies: Vec<String>,
    pub max_students: Option<i32>,
    pub current_students: i32,
    pub is_published: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            tutor_id: course.tutor_id,
            title: course.title,
            description: course.description,
            duration: course.duration,
            level: course.level,
            price: course.price.to_f64().unwrap_or(0.0),
            image_url: course.image_url,
            technologies: course.technologies,
            max_students: course.max_students,
            current_students: course.current_students,
            is_published: course.is_published,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListCoursesQuery {
    #[serde(default)]
    pub include_unpublished: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub level: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub max_students: Option<i32>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub level: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub max_students: Option<i32>,
    pub is_published: Option<bool>,
}

/// Convert a request price into the stored decimal, rejecting negatives.
pub(crate) fn parse_price(price: f64) -> Result<BigDecimal, ApiError> {
    if price < 0.0 {
        return Err(ApiError::BadRequest("Price must not be negative".to_string()));
    }
    BigDecimal::from_f64(price)
        .map(|value| value.with_scale(2))
        .ok_or_else(|| ApiError::BadRequest("Price is not a valid number".to_string()))
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ApiError> {
    match value.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ApiError::BadRequest(format!("Missing required field: {field}"))),
    }
}

/// `GET /api/courses`
///
/// Database failures fall back to an empty list so catalog pages keep
/// rendering; the response marks the degraded source.
pub async fn list_courses(
    State(state): State<AppState>,
    Query(query): Query<ListCoursesQuery>,
) -> Json<serde_json::Value> {
    match Course::list(&state.db_pool, query.include_unpublished).await {
        Ok(courses) => {
            let courses: Vec<CourseResponse> = courses.into_iter().map(Into::into).collect();
            let count = courses.len();
            Json(json!({
                "courses": courses,
                "_meta": { "source": "database", "count": count },
            }))
        }
        Err(err) => {
            warn!(error = %err, "Course list query failed, serving fallback");
            Json(json!({
                "courses": [],
                "_meta": { "source": "fallback", "count": 0 },
            }))
        }
    }
}

/// `GET /api/courses/{id}`
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = Course::find_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    Ok(Json(course.into()))
}

/// `POST /api/courses`, tutor role required.
pub async fn create_course(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = required(&body.title, "title")?.to_string();
    let description = required(&body.description, "description")?.to_string();
    let duration = required(&body.duration, "duration")?.to_string();
    let level = required(&body.level, "level")?.to_string();

    if !course::is_valid_level(&level) {
        return Err(ApiError::BadRequest(format!(
            "Invalid level '{level}', expected one of: {}",
            course::COURSE_LEVELS.join(", ")
        )));
    }
    let price = parse_price(
        body.price
            .ok_or_else(|| ApiError::BadRequest("Missing required field: price".to_string()))?,
    )?;

    require_role(&state.db_pool, &user.user_id, &["tutor", "admin"]).await?;

    let created = Course::create(
        &state.db_pool,
        NewCourse {
            tutor_id: user.user_id.clone(),
            title,
            description,
            duration,
            level,
            price,
            image_url: body.image_url,
            technologies: body.technologies,
            max_students: body.max_students,
            is_published: body.is_published,
        },
    )
    .await?;

    info!(course_id = %created.id, tutor_id = %user.user_id, "Course created");

    Ok((StatusCode::CREATED, Json(CourseResponse::from(created))))
}

/// `PUT /api/courses/{id}`, tutor or admin role required.
pub async fn update_course(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    if let Some(level) = body.level.as_deref() {
        if !course::is_valid_level(level) {
            return Err(ApiError::BadRequest(format!(
                "Invalid level '{level}', expected one of: {}",
                course::COURSE_LEVELS.join(", ")
            )));
        }
    }
    let price = body.price.map(parse_price).transpose()?;

    require_role(&state.db_pool, &user.user_id, &["tutor", "admin"]).await?;

    let changes = CourseChanges {
        title: body.title,
        description: body.description,
        duration: body.duration,
        level: body.level,
        price,
        image_url: body.image_url,
        technologies: body.technologies,
        max_students: body.max_students,
        is_published: body.is_published,
    };

    let updated = Course::update(&state.db_pool, id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    info!(course_id = %id, "Course updated");

    Ok(Json(updated.into()))
}

/// `DELETE /api/courses/{id}`
///
/// Courses with enrollments cannot be removed.
pub async fn delete_course(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_role(&state.db_pool, &user.user_id, &["tutor", "admin"]).await?;

    if Course::has_enrollments(&state.db_pool, id).await? {
        return Err(ApiError::BadRequest(
            "Cannot delete a course with active enrollments".to_string(),
        ));
    }

    if !Course::delete(&state.db_pool, id).await? {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    info!(course_id = %id, "Course deleted");

    Ok(Json(json!({ "deleted": true })))
}
