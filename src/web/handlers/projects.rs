//! Project listing and creation handlers.

use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bigdecimal::ToPrimitive;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::project::{self, NewProject, Project};
use crate::web::auth::CurrentUser;
use crate::web::errors::ApiError;
use crate::web::state::AppState;

use super::courses::parse_price;
use super::require_role;

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub tutor_id: String,
    pub title: String,
    pub description: String,
    pub difficulty_level: String,
    pub estimated_duration: String,
    pub price: f64,
    pub technologies: Vec<String>,
    pub requirements: Vec<String>,
    pub deliverables: Vec<String>,
    pub max_participants: Option<i32>,
    pub current_participants: i32,
    pub project_type: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            tutor_id: project.tutor_id,
            title: project.title,
            description: project.description,
            difficulty_level: project.difficulty_level,
            estimated_duration: project.estimated_duration,
            price: project.price.to_f64().unwrap_or(0.0),
            technologies: project.technologies,
            requirements: project.requirements,
            deliverables: project.deliverables,
            max_participants: project.max_participants,
            current_participants: project.current_participants,
            project_type: project.project_type,
            is_published: project.is_published,
            created_at: project.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    #[serde(default)]
    pub include_unpublished: bool,
    pub tutor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty_level: Option<String>,
    pub estimated_duration: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
    pub max_participants: Option<i32>,
    pub project_type: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

/// `GET /api/projects`
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> Json<serde_json::Value> {
    match Project::list(
        &state.db_pool,
        query.include_unpublished,
        query.tutor_id.as_deref(),
    )
    .await
    {
        Ok(projects) => {
            let projects: Vec<ProjectResponse> = projects.into_iter().map(Into::into).collect();
            let count = projects.len();
            Json(json!({
                "projects": projects,
                "_meta": { "source": "database", "count": count },
            }))
        }
        Err(err) => {
            warn!(error = %err, "Project list query failed, serving fallback");
            Json(json!({
                "projects": [],
                "_meta": { "source": "fallback", "count": 0 },
            }))
        }
    }
}

/// `POST /api/projects`, tutor role required.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = body
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required field: title".to_string()))?;
    let description = body
        .description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required field: description".to_string()))?;
    let difficulty_level = body.difficulty_level.ok_or_else(|| {
        ApiError::BadRequest("Missing required field: difficulty_level".to_string())
    })?;
    let estimated_duration = body.estimated_duration.ok_or_else(|| {
        ApiError::BadRequest("Missing required field: estimated_duration".to_string())
    })?;
    let project_type = body
        .project_type
        .ok_or_else(|| ApiError::BadRequest("Missing required field: project_type".to_string()))?;

    if !project::is_valid_difficulty(&difficulty_level) {
        return Err(ApiError::BadRequest(format!(
            "Invalid difficulty_level '{difficulty_level}', expected one of: {}",
            project::DIFFICULTY_LEVELS.join(", ")
        )));
    }
    if !project::is_valid_project_type(&project_type) {
        return Err(ApiError::BadRequest(format!(
            "Invalid project_type '{project_type}', expected one of: {}",
            project::PROJECT_TYPES.join(", ")
        )));
    }
    let price = parse_price(body.price.unwrap_or(0.0))?;

    require_role(&state.db_pool, &user.user_id, &["tutor", "admin"]).await?;

    let created = Project::create(
        &state.db_pool,
        NewProject {
            tutor_id: user.user_id.clone(),
            title,
            description,
            difficulty_level,
            estimated_duration,
            price,
            technologies: body.technologies,
            requirements: body.requirements,
            deliverables: body.deliverables,
            max_participants: body.max_participants,
            project_type,
            is_published: body.is_published,
        },
    )
    .await?;

    info!(project_id = %created.id, tutor_id = %user.user_id, "Project created");

    Ok((StatusCode::CREATED, Json(ProjectResponse::from(created))))
}
