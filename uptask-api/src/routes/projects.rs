/// Project endpoints
///
/// # Endpoints
///
/// - `POST /api/projects` - Create a project managed by the caller
/// - `GET /api/projects` - Projects the caller manages or is on the team of
/// - `GET /api/projects/:projectId` - One project with its tasks (members)
/// - `PUT /api/projects/:projectId` - Update (manager)
/// - `DELETE /api/projects/:projectId` - Delete with tasks and notes (manager)

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::{
        context::{Caller, Manager, Member, ProjectScope},
        validation::{within_text_limit, ValidJson},
    },
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uptask_shared::models::{
    project::{CreateProject, Project, UpdateProject},
    task::Task,
};
use uuid::Uuid;
use validator::Validate;

/// Create or update request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Project name is required"),
        custom(function = "within_text_limit")
    )]
    pub project_name: String,

    #[serde(default)]
    #[validate(
        length(min = 1, message = "Client name is required"),
        custom(function = "within_text_limit")
    )]
    pub client_name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

/// Project with its tasks expanded
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub id: Uuid,
    pub project_name: String,
    pub client_name: String,
    pub description: String,
    pub manager: Uuid,
    pub team: Vec<Uuid>,
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectDetail {
    fn new(project: Project, tasks: Vec<Task>) -> Self {
        Self {
            id: project.id,
            project_name: project.project_name,
            client_name: project.client_name,
            description: project.description,
            manager: project.manager,
            team: project.team,
            tasks,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Create a project; the caller becomes its manager
pub async fn create_project(
    State(state): State<AppState>,
    Caller(user): Caller,
    ValidJson(req): ValidJson<ProjectRequest>,
) -> ApiResult<(StatusCode, String)> {
    let project = state
        .store
        .create_project(CreateProject {
            project_name: req.project_name,
            client_name: req.client_name,
            description: req.description,
            manager: user.id,
        })
        .await?;

    info!(project_id = %project.id, manager = %user.id, "Project created");

    Ok((StatusCode::CREATED, "Project created successfully".to_string()))
}

/// List the caller's projects
pub async fn list_projects(
    State(state): State<AppState>,
    Caller(user): Caller,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = state.store.list_projects_for_user(user.id).await?;
    Ok(Json(projects))
}

/// Get one project with its tasks
///
/// # Errors
///
/// - `404 Not Found`: No such project
/// - `403 Forbidden`: Caller is neither manager nor team member
pub async fn get_project(
    State(state): State<AppState>,
    Member(scope): Member<ProjectScope>,
) -> ApiResult<Json<ProjectDetail>> {
    let tasks = state.store.list_tasks(scope.project.id).await?;
    Ok(Json(ProjectDetail::new(scope.project, tasks)))
}

/// Update a project's name, client and description
pub async fn update_project(
    State(state): State<AppState>,
    Manager(scope): Manager<ProjectScope>,
    ValidJson(req): ValidJson<ProjectRequest>,
) -> ApiResult<String> {
    state
        .store
        .update_project(
            scope.project.id,
            UpdateProject {
                project_name: req.project_name,
                client_name: req.client_name,
                description: req.description,
            },
        )
        .await?;

    info!(project_id = %scope.project.id, "Project updated");

    Ok("Project updated successfully".to_string())
}

/// Delete a project together with its tasks and their notes
pub async fn delete_project(
    State(state): State<AppState>,
    Manager(scope): Manager<ProjectScope>,
) -> ApiResult<String> {
    state.store.delete_project(scope.project.id).await?;

    info!(project_id = %scope.project.id, "Project deleted");

    Ok("Project deleted successfully".to_string())
}
