/// Task endpoints
///
/// Tasks live under a project. Reading and changing status is open to every
/// project member; creating, editing and deleting is for the manager.
///
/// - `POST /api/projects/:projectId/tasks` - Create (manager)
/// - `GET /api/projects/:projectId/tasks` - List, each with its project
/// - `GET /api/projects/:projectId/tasks/:taskId` - One task with history and notes
/// - `PUT /api/projects/:projectId/tasks/:taskId` - Update (manager)
/// - `DELETE /api/projects/:projectId/tasks/:taskId` - Delete (manager)
/// - `POST /api/projects/:projectId/tasks/:taskId/status` - Change status

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::{
        context::{Manager, Member, ProjectScope, TaskScope},
        validation::{within_text_limit, ValidJson},
    },
    routes::notes::NoteDetail,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;
use uptask_shared::models::{
    project::Project,
    task::{CreateTask, StatusChange, Task, TaskStatus, UpdateTask},
    user::UserSummary,
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Create or update request
#[derive(Debug, Deserialize, Validate)]
pub struct TaskRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Task name is required"),
        custom(function = "within_text_limit")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

/// Status change request
#[derive(Debug, Deserialize, Validate)]
pub struct StatusRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_status"))]
    pub status: String,
}

fn validate_status(status: &str) -> Result<(), ValidationError> {
    if status.is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some("Status is required".into());
        return Err(error);
    }
    status.parse::<TaskStatus>().map(|_| ()).map_err(|_| {
        let mut error = ValidationError::new("status");
        error.message = Some("Invalid status".into());
        error
    })
}

/// Task with its project expanded
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithProject {
    pub id: Uuid,
    pub project: Project,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub notes: Vec<Uuid>,
    pub completed_by: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskWithProject {
    fn new(task: Task, project: Project) -> Self {
        Self {
            id: task.id,
            project,
            name: task.name,
            description: task.description,
            status: task.status,
            notes: task.notes,
            completed_by: task.completed_by,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// History entry with its user expanded
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeDetail {
    pub user: Option<UserSummary>,
    pub status: TaskStatus,
    pub changed_at: DateTime<Utc>,
}

/// Task with history users and notes expanded
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    pub id: Uuid,
    pub project: Uuid,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub notes: Vec<NoteDetail>,
    pub completed_by: Vec<StatusChangeDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create a task in the project
pub async fn create_task(
    State(state): State<AppState>,
    Manager(scope): Manager<ProjectScope>,
    ValidJson(req): ValidJson<TaskRequest>,
) -> ApiResult<(StatusCode, String)> {
    let task = state
        .store
        .create_task(CreateTask {
            project_id: scope.project.id,
            name: req.name,
            description: req.description,
        })
        .await?;

    info!(task_id = %task.id, project_id = %scope.project.id, "Task created");

    Ok((StatusCode::CREATED, "Task created successfully".to_string()))
}

/// All tasks of the project
pub async fn list_tasks(
    State(state): State<AppState>,
    Member(scope): Member<ProjectScope>,
) -> ApiResult<Json<Vec<TaskWithProject>>> {
    let tasks = state.store.list_tasks(scope.project.id).await?;

    let tasks = tasks
        .into_iter()
        .map(|task| TaskWithProject::new(task, scope.project.clone()))
        .collect();

    Ok(Json(tasks))
}

/// One task with its status history and notes
pub async fn get_task(
    State(state): State<AppState>,
    Member(scope): Member<TaskScope>,
) -> ApiResult<Json<TaskDetail>> {
    let task = scope.task;
    let notes = state.store.list_notes(task.id).await?;

    let mut user_ids: Vec<Uuid> = task
        .completed_by
        .iter()
        .map(|change| change.user)
        .chain(notes.iter().map(|note| note.created_by))
        .collect();
    user_ids.sort();
    user_ids.dedup();

    let users: HashMap<Uuid, UserSummary> = state
        .store
        .find_user_summaries(&user_ids)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    let completed_by = task
        .completed_by
        .into_iter()
        .map(|change| StatusChangeDetail {
            user: users.get(&change.user).cloned(),
            status: change.status,
            changed_at: change.changed_at,
        })
        .collect();

    let notes = notes
        .into_iter()
        .map(|note| NoteDetail::new(note, &users))
        .collect();

    Ok(Json(TaskDetail {
        id: task.id,
        project: task.project,
        name: task.name,
        description: task.description,
        status: task.status,
        notes,
        completed_by,
        created_at: task.created_at,
        updated_at: task.updated_at,
    }))
}

/// Update a task's name and description
pub async fn update_task(
    State(state): State<AppState>,
    Manager(scope): Manager<TaskScope>,
    ValidJson(req): ValidJson<TaskRequest>,
) -> ApiResult<String> {
    state
        .store
        .update_task(
            scope.task.id,
            UpdateTask {
                name: req.name,
                description: req.description,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Task Not Found".to_string()))?;

    info!(task_id = %scope.task.id, "Task updated");

    Ok("Task updated successfully".to_string())
}

/// Delete a task and its notes
pub async fn delete_task(
    State(state): State<AppState>,
    Manager(scope): Manager<TaskScope>,
) -> ApiResult<String> {
    state.store.delete_task(scope.task.id).await?;

    info!(task_id = %scope.task.id, project_id = %scope.project.id, "Task deleted");

    Ok("Task deleted successfully".to_string())
}

/// Set the status and record who set it
pub async fn update_status(
    State(state): State<AppState>,
    Member(scope): Member<TaskScope>,
    ValidJson(req): ValidJson<StatusRequest>,
) -> ApiResult<String> {
    let status: TaskStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid status".to_string()))?;

    state
        .store
        .record_task_status(scope.task.id, scope.caller.id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task Not Found".to_string()))?;

    info!(task_id = %scope.task.id, user_id = %scope.caller.id, status = %status, "Task status updated");

    Ok("Task status updated successfully".to_string())
}
