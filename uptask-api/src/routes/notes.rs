/// Note endpoints
///
/// All routes require project membership.
///
/// - `POST /api/projects/:projectId/tasks/:taskId/notes` - Add a note
/// - `GET /api/projects/:projectId/tasks/:taskId/notes` - Notes, oldest first
/// - `DELETE /api/projects/:projectId/tasks/:taskId/notes/:noteId` - Author only

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::{
        context::{Member, PathIds, TaskScope},
        validation::ValidJson,
    },
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;
use uptask_shared::{
    auth::authorization::require_author,
    models::{
        note::{CreateNote, Note},
        user::UserSummary,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Note body
#[derive(Debug, Deserialize, Validate)]
pub struct NoteRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

/// Note with its author expanded
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetail {
    pub id: Uuid,
    pub task: Uuid,
    pub content: String,
    pub created_by: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
}

impl NoteDetail {
    pub fn new(note: Note, users: &HashMap<Uuid, UserSummary>) -> Self {
        Self {
            id: note.id,
            task: note.task,
            content: note.content,
            created_by: users.get(&note.created_by).cloned(),
            created_at: note.created_at,
        }
    }
}

/// Add a note to the task, written by the caller
pub async fn create_note(
    State(state): State<AppState>,
    Member(scope): Member<TaskScope>,
    ValidJson(req): ValidJson<NoteRequest>,
) -> ApiResult<(StatusCode, String)> {
    let note = state
        .store
        .create_note(CreateNote {
            task_id: scope.task.id,
            content: req.content,
            created_by: scope.caller.id,
        })
        .await?;

    info!(note_id = %note.id, task_id = %scope.task.id, "Note created");

    Ok((StatusCode::CREATED, "Note successfully created".to_string()))
}

/// Notes of the task in creation order
pub async fn list_notes(
    State(state): State<AppState>,
    Member(scope): Member<TaskScope>,
) -> ApiResult<Json<Vec<Note>>> {
    let notes = state.store.list_notes(scope.task.id).await?;
    Ok(Json(notes))
}

/// Delete a note
///
/// # Errors
///
/// - `404 Not Found`: No such note on this task
/// - `403 Forbidden`: Caller didn't write it
pub async fn delete_note(
    State(state): State<AppState>,
    Member(scope): Member<TaskScope>,
    params: PathIds,
) -> ApiResult<String> {
    let note_id = params.id("noteId")?;

    let note = state
        .store
        .find_note(note_id)
        .await?
        .filter(|note| note.task == scope.task.id)
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))?;

    require_author(scope.caller.id, &note)?;

    state.store.delete_note(note.id).await?;

    info!(note_id = %note.id, task_id = %scope.task.id, "Note deleted");

    Ok("Note successfully deleted".to_string())
}
