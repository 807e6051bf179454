/// Note model and database operations
///
/// Notes are comments on a task. Only their creator may delete them; deleting
/// the task removes its notes via `ON DELETE CASCADE`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     content TEXT NOT NULL,
///     created_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Note attached to a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,

    /// Owning task
    pub task: Uuid,

    pub content: String,

    /// Author of the note
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNote {
    pub task_id: Uuid,
    pub content: String,
    pub created_by: Uuid,
}

const NOTE_COLUMNS: &str = "id, task_id AS task, content, created_by, created_at";

impl Note {
    /// Creates a note on a task
    pub async fn create<'e, E>(executor: E, data: CreateNote) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let note = sqlx::query_as::<_, Note>(&format!(
            r#"
            INSERT INTO notes (task_id, content, created_by)
            VALUES ($1, $2, $3)
            RETURNING {NOTE_COLUMNS}
            "#
        ))
        .bind(data.task_id)
        .bind(data.content)
        .bind(data.created_by)
        .fetch_one(executor)
        .await?;

        Ok(note)
    }

    /// Finds a note by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let note = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(note)
    }

    /// Lists a task's notes in creation order
    pub async fn list_by_task<'e, E>(executor: E, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let notes = sqlx::query_as::<_, Note>(&format!(
            r#"
            SELECT {NOTE_COLUMNS}
            FROM notes
            WHERE task_id = $1
            ORDER BY created_at, id
            "#
        ))
        .bind(task_id)
        .fetch_all(executor)
        .await?;

        Ok(notes)
    }

    /// Deletes a note
    ///
    /// # Returns
    ///
    /// True if the note existed
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
