/// Task model and database operations
///
/// Tasks belong to exactly one project. Every status change is appended to
/// `task_status_changes`, which is exposed as the task's `completedBy` log.
/// Rows in that table are never updated or deleted except by cascade.
///
/// # Status
///
/// Any status can be set from any other:
///
/// ```text
/// pending ⇄ onHold ⇄ inProgress ⇄ underReview ⇄ completed
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM (
///     'pending', 'onHold', 'inProgress', 'underReview', 'completed'
/// );
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     status task_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_status_changes (
///     seq BIGSERIAL PRIMARY KEY,
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id),
///     status task_status NOT NULL,
///     changed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use uptask_shared::models::task::{Task, CreateTask, TaskStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     project_id,
///     name: "Wireframes".to_string(),
///     description: "Sketch the landing page".to_string(),
/// }).await?;
///
/// let mut tx = pool.begin().await?;
/// Task::set_status(&mut *tx, task.id, TaskStatus::InProgress).await?;
/// Task::append_status_change(&mut *tx, task.id, user_id, TaskStatus::InProgress).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgExecutor};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    #[default]
    Pending,
    OnHold,
    InProgress,
    UnderReview,
    Completed,
}

impl TaskStatus {
    /// Every status, in workflow order
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::OnHold,
        TaskStatus::InProgress,
        TaskStatus::UnderReview,
        TaskStatus::Completed,
    ];

    /// Wire and database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::OnHold => "onHold",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::UnderReview => "underReview",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown task status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// One entry of a task's status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    /// User who set the status
    pub user: Uuid,

    /// Status that was set
    pub status: TaskStatus,

    pub changed_at: DateTime<Utc>,
}

/// Task with its note references and status history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    /// Owning project
    pub project: Uuid,

    pub name: String,

    pub description: String,

    pub status: TaskStatus,

    /// Note IDs in creation order
    pub notes: Vec<Uuid>,

    /// Status history, oldest first
    pub completed_by: Vec<StatusChange>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub name: String,
    pub description: String,
}

/// Input for updating a task; both fields are overwritten
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    pub name: String,
    pub description: String,
}

/// Row shape as read from Postgres, before the history JSON is unwrapped
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    project: Uuid,
    name: String,
    description: String,
    status: TaskStatus,
    notes: Vec<Uuid>,
    completed_by: Json<Vec<StatusChange>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            project: row.project,
            name: row.name,
            description: row.description,
            status: row.status,
            notes: row.notes,
            completed_by: row.completed_by.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const TASK_COLUMNS: &str = r#"
    t.id, t.project_id AS project, t.name, t.description, t.status,
    ARRAY(
        SELECT n.id FROM notes n
        WHERE n.task_id = t.id
        ORDER BY n.created_at, n.id
    ) AS notes,
    COALESCE(
        (
            SELECT json_agg(
                json_build_object(
                    'user', c.user_id,
                    'status', c.status::TEXT,
                    'changedAt', c.changed_at
                )
                ORDER BY c.seq
            )
            FROM task_status_changes c
            WHERE c.task_id = t.id
        ),
        '[]'::json
    ) AS completed_by,
    t.created_at, t.updated_at
"#;

impl Task {
    /// Whether the task belongs to `project_id`
    pub fn belongs_to(&self, project_id: Uuid) -> bool {
        self.project == project_id
    }

    /// Creates a pending task attached to a project
    ///
    /// # Errors
    ///
    /// Returns a foreign key violation if the project doesn't exist
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            WITH t AS (
                INSERT INTO tasks (project_id, name, description)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT {TASK_COLUMNS} FROM t
            "#
        ))
        .bind(data.project_id)
        .bind(data.name)
        .bind(data.description)
        .fetch_one(executor)
        .await?;

        Ok(row.into())
    }

    /// Finds a task by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Lists a project's tasks, oldest first
    pub async fn list_by_project<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t
            WHERE t.project_id = $1
            ORDER BY t.created_at, t.id
            "#
        ))
        .bind(project_id)
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Overwrites name and description
    ///
    /// # Returns
    ///
    /// The updated task, None if it doesn't exist
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks t
            SET name = $2, description = $3, updated_at = NOW()
            WHERE t.id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .fetch_optional(executor)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Deletes a task together with its notes and history
    ///
    /// # Returns
    ///
    /// True if the task existed
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets the current status
    ///
    /// Call [`Task::append_status_change`] in the same transaction.
    pub async fn set_status<'e, E>(
        executor: E,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("UPDATE tasks SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Appends one entry to the status history
    pub async fn append_status_change<'e, E>(
        executor: E,
        task_id: Uuid,
        user_id: Uuid,
        status: TaskStatus,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO task_status_changes (task_id, user_id, status)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(status)
        .execute(executor)
        .await?;

        Ok(())
    }
}
