/// Persistence seam used by the HTTP handlers
///
/// [`Store`] exposes every read and write the API needs, one method per
/// business operation. Operations that touch more than one record (register,
/// confirm, reset password, record a status change) are single methods so
/// that each implementation can make them atomic.
///
/// Two implementations ship with the crate:
///
/// - [`crate::db::postgres::PgStore`]: PostgreSQL, transactions for
///   multi-record writes
/// - [`crate::db::memory::MemoryStore`]: in-process, one lock per operation,
///   used by tests and for running without a database

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    note::{CreateNote, Note},
    project::{CreateProject, Project, UpdateProject},
    task::{CreateTask, Task, TaskStatus, UpdateTask},
    token::Token,
    user::{CreateUser, User, UserSummary},
};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule was violated (e.g. duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(
                    db_err
                        .constraint()
                        .unwrap_or("unique constraint")
                        .to_string(),
                );
            }
        }
        StoreError::Database(err)
    }
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Everything the API reads and writes
///
/// Methods returning `Option` yield `None` when the addressed entity doesn't
/// exist; methods returning `bool` report whether anything changed.
#[async_trait]
pub trait Store: Send + Sync {
    /// Verifies the backing storage is reachable
    async fn ping(&self) -> StoreResult<()>;

    // Users

    /// Creates an unconfirmed user and its first confirmation code atomically
    ///
    /// Fails with [`StoreError::Conflict`] if the email is taken.
    async fn create_user_with_token(
        &self,
        data: CreateUser,
        token: &str,
    ) -> StoreResult<(User, Token)>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Public projections for `ids`, in the same order, skipping unknown ids
    async fn find_user_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>>;

    /// Rewrites name and email; [`StoreError::Conflict`] if the email is taken
    async fn update_user_profile(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
    ) -> StoreResult<Option<User>>;

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool>;

    // Tokens

    async fn create_token(&self, user_id: Uuid, token: &str) -> StoreResult<Token>;

    /// Looks a code up by value, ignoring codes issued at or before `issued_after`
    async fn find_live_token(
        &self,
        token: &str,
        issued_after: DateTime<Utc>,
    ) -> StoreResult<Option<Token>>;

    /// Marks the code's owner confirmed and deletes the code, atomically
    async fn confirm_account(&self, token: &Token) -> StoreResult<()>;

    /// Replaces the code owner's password hash and deletes the code, atomically
    async fn reset_password(&self, token: &Token, password_hash: &str) -> StoreResult<()>;

    /// Deletes codes issued at or before `issued_before`, returning how many
    async fn purge_expired_tokens(&self, issued_before: DateTime<Utc>) -> StoreResult<u64>;

    // Projects

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project>;

    /// Projects where `user_id` is the manager or on the team
    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>>;

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>>;

    /// Deletes the project with its tasks and their notes
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    /// False if the user was already on the team
    async fn add_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// False if the user wasn't on the team
    async fn remove_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    // Tasks

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>>;

    /// Deletes the task with its notes and history
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    /// Sets the status and appends one history entry, atomically
    async fn record_task_status(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        status: TaskStatus,
    ) -> StoreResult<Option<Task>>;

    // Notes

    async fn create_note(&self, data: CreateNote) -> StoreResult<Note>;

    async fn list_notes(&self, task_id: Uuid) -> StoreResult<Vec<Note>>;

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>>;

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool>;
}
