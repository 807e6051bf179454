/// Project model and database operations
///
/// A project has exactly one manager and an ordered team of collaborators.
/// Team membership lives in a join table and the task list is derived from
/// `tasks.project_id`, so both are always consistent with the rows they
/// reference.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_name VARCHAR(255) NOT NULL,
///     client_name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     manager_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use uptask_shared::models::project::{Project, CreateProject};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, manager: Uuid, teammate: Uuid) -> Result<(), sqlx::Error> {
/// let project = Project::create(&pool, CreateProject {
///     project_name: "Website".to_string(),
///     client_name: "ACME".to_string(),
///     description: "Landing page redesign".to_string(),
///     manager,
/// }).await?;
///
/// Project::add_member(&pool, project.id, teammate).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Project with its manager, team and task references
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,

    pub project_name: String,

    pub client_name: String,

    pub description: String,

    /// The single owning user
    pub manager: Uuid,

    /// Team members in the order they were added; never contains the manager
    pub team: Vec<Uuid>,

    /// Task IDs in creation order
    pub tasks: Vec<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub project_name: String,
    pub client_name: String,
    pub description: String,
    pub manager: Uuid,
}

/// Input for updating a project; every field is overwritten
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProject {
    pub project_name: String,
    pub client_name: String,
    pub description: String,
}

const PROJECT_COLUMNS: &str = r#"
    p.id, p.project_name, p.client_name, p.description, p.manager_id AS manager,
    ARRAY(
        SELECT m.user_id FROM project_members m
        WHERE m.project_id = p.id
        ORDER BY m.created_at, m.user_id
    ) AS team,
    ARRAY(
        SELECT t.id FROM tasks t
        WHERE t.project_id = p.id
        ORDER BY t.created_at, t.id
    ) AS tasks,
    p.created_at, p.updated_at
"#;

impl Project {
    /// Whether `user_id` owns the project
    pub fn is_manager(&self, user_id: Uuid) -> bool {
        self.manager == user_id
    }

    /// Whether `user_id` is on the team (the manager is not)
    pub fn has_team_member(&self, user_id: Uuid) -> bool {
        self.team.contains(&user_id)
    }

    /// Whether `user_id` is the manager or a team member
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.is_manager(user_id) || self.has_team_member(user_id)
    }

    /// Creates a project with an empty team and no tasks
    ///
    /// # Errors
    ///
    /// Returns an error if the manager doesn't exist or the database fails
    pub async fn create<'e, E>(executor: E, data: CreateProject) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            WITH p AS (
                INSERT INTO projects (project_name, client_name, description, manager_id)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {PROJECT_COLUMNS} FROM p
            "#
        ))
        .bind(data.project_name)
        .bind(data.client_name)
        .bind(data.description)
        .bind(data.manager)
        .fetch_one(executor)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    /// Lists the projects a user manages or belongs to, oldest first
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use uptask_shared::models::project::Project;
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    /// for project in Project::list_for_user(&pool, user_id).await? {
    ///     println!("{} ({})", project.project_name, project.client_name);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let projects = sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects p
            WHERE p.manager_id = $1
               OR EXISTS (
                   SELECT 1 FROM project_members m
                   WHERE m.project_id = p.id AND m.user_id = $1
               )
            ORDER BY p.created_at, p.id
            "#
        ))
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(projects)
    }

    /// Overwrites name, client and description
    ///
    /// # Returns
    ///
    /// The updated project, None if it doesn't exist
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects p
            SET project_name = $2, client_name = $3, description = $4, updated_at = NOW()
            WHERE p.id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.project_name)
        .bind(data.client_name)
        .bind(data.description)
        .fetch_optional(executor)
        .await?;

        Ok(project)
    }

    /// Deletes a project
    ///
    /// Tasks, their notes and status history, and team rows go with it via
    /// `ON DELETE CASCADE`.
    ///
    /// # Returns
    ///
    /// True if the project existed
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds a user to the team
    ///
    /// # Returns
    ///
    /// False if the user was already on the team
    pub async fn add_member<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a user from the team
    ///
    /// # Returns
    ///
    /// False if the user wasn't on the team
    pub async fn remove_member<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "DELETE FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
