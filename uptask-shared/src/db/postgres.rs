/// PostgreSQL implementation of [`Store`]
///
/// Single-record operations go straight to the pool. Operations touching more
/// than one row run inside a transaction that is rolled back when dropped
/// without commit, so a failure part way leaves nothing behind.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use uptask_shared::db::{pool::{create_pool, DatabaseConfig}, postgres::PgStore, store::Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// }).await?;
///
/// let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::pool::health_check;
use super::store::{Store, StoreResult};
use crate::models::{
    note::{CreateNote, Note},
    project::{CreateProject, Project, UpdateProject},
    task::{CreateTask, Task, TaskStatus, UpdateTask},
    token::Token,
    user::{CreateUser, User, UserSummary},
};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn create_user_with_token(
        &self,
        data: CreateUser,
        token: &str,
    ) -> StoreResult<(User, Token)> {
        let mut tx = self.pool.begin().await?;

        let user = User::create(&mut *tx, data).await?;
        let token = Token::create(&mut *tx, user.id, token).await?;

        tx.commit().await?;
        Ok((user, token))
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(User::summaries(&self.pool, ids).await?)
    }

    async fn update_user_profile(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
    ) -> StoreResult<Option<User>> {
        Ok(User::update_profile(&self.pool, id, name, email).await?)
    }

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        Ok(User::set_password_hash(&self.pool, id, password_hash).await?)
    }

    async fn create_token(&self, user_id: Uuid, token: &str) -> StoreResult<Token> {
        Ok(Token::create(&self.pool, user_id, token).await?)
    }

    async fn find_live_token(
        &self,
        token: &str,
        issued_after: DateTime<Utc>,
    ) -> StoreResult<Option<Token>> {
        Ok(Token::find_live(&self.pool, token, issued_after).await?)
    }

    async fn confirm_account(&self, token: &Token) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        User::mark_confirmed(&mut *tx, token.user_id).await?;
        Token::delete(&mut *tx, token.id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn reset_password(&self, token: &Token, password_hash: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        User::set_password_hash(&mut *tx, token.user_id, password_hash).await?;
        Token::delete(&mut *tx, token.id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn purge_expired_tokens(&self, issued_before: DateTime<Utc>) -> StoreResult<u64> {
        Ok(Token::purge_expired(&self.pool, issued_before).await?)
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        Ok(Project::create(&self.pool, data).await?)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(Project::list_for_user(&self.pool, user_id).await?)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        Ok(Project::update(&self.pool, id, data).await?)
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Project::delete(&self.pool, id).await?)
    }

    async fn add_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(Project::add_member(&self.pool, project_id, user_id).await?)
    }

    async fn remove_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(Project::remove_member(&self.pool, project_id, user_id).await?)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_project(&self.pool, project_id).await?)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn record_task_status(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        status: TaskStatus,
    ) -> StoreResult<Option<Task>> {
        let mut tx = self.pool.begin().await?;

        if !Task::set_status(&mut *tx, task_id, status).await? {
            return Ok(None);
        }
        Task::append_status_change(&mut *tx, task_id, user_id, status).await?;
        let task = Task::find_by_id(&mut *tx, task_id).await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn create_note(&self, data: CreateNote) -> StoreResult<Note> {
        Ok(Note::create(&self.pool, data).await?)
    }

    async fn list_notes(&self, task_id: Uuid) -> StoreResult<Vec<Note>> {
        Ok(Note::list_by_task(&self.pool, task_id).await?)
    }

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        Ok(Note::find_by_id(&self.pool, id).await?)
    }

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Note::delete(&self.pool, id).await?)
    }
}
