/// In-process implementation of [`Store`]
///
/// All state sits behind one `RwLock` and every operation takes the lock once,
/// so multi-record writes are atomic with respect to other requests. Derived
/// lists (a project's tasks, a task's notes) are computed on read, the same
/// way the relational schema derives them.
///
/// Used by the API test suite and for running the server without a database.
/// Nothing is persisted across restarts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{Store, StoreError, StoreResult};
use crate::models::{
    note::{CreateNote, Note},
    project::{CreateProject, Project, UpdateProject},
    task::{CreateTask, StatusChange, Task, TaskStatus, UpdateTask},
    token::Token,
    user::{CreateUser, User, UserSummary},
};

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    tokens: Vec<Token>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    notes: Vec<Note>,
}

impl State {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn project_view(&self, project: &Project) -> Project {
        let mut view = project.clone();
        view.tasks = self
            .tasks
            .iter()
            .filter(|t| t.project == project.id)
            .map(|t| t.id)
            .collect();
        view
    }

    fn task_view(&self, task: &Task) -> Task {
        let mut view = task.clone();
        view.notes = self
            .notes
            .iter()
            .filter(|n| n.task == task.id)
            .map(|n| n.id)
            .collect();
        view
    }

    fn remove_task_cascade(&mut self, task_id: Uuid) {
        self.notes.retain(|n| n.task != task_id);
        self.tasks.retain(|t| t.id != task_id);
    }
}

/// Store keeping everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user_with_token(
        &self,
        data: CreateUser,
        token: &str,
    ) -> StoreResult<(User, Token)> {
        let mut state = self.state.write().await;

        if state.email_taken(&data.email, None) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            name: data.name,
            password_hash: data.password_hash,
            confirmed: false,
            created_at: now,
            updated_at: now,
        };
        let token = Token {
            id: Uuid::new_v4(),
            token: token.to_string(),
            user_id: user.id,
            created_at: now,
        };

        state.users.push(user.clone());
        state.tokens.push(token.clone());
        Ok((user, token))
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.iter().find(|u| u.id == *id))
            .map(UserSummary::from)
            .collect())
    }

    async fn update_user_profile(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
    ) -> StoreResult<Option<User>> {
        let mut state = self.state.write().await;

        if state.email_taken(email, Some(id)) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        Ok(state.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.name = name.to_string();
            user.email = email.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        Ok(match state.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn create_token(&self, user_id: Uuid, token: &str) -> StoreResult<Token> {
        let token = Token {
            id: Uuid::new_v4(),
            token: token.to_string(),
            user_id,
            created_at: Utc::now(),
        };
        self.state.write().await.tokens.push(token.clone());
        Ok(token)
    }

    async fn find_live_token(
        &self,
        token: &str,
        issued_after: DateTime<Utc>,
    ) -> StoreResult<Option<Token>> {
        let state = self.state.read().await;
        Ok(state
            .tokens
            .iter()
            .filter(|t| t.token == token && t.created_at > issued_after)
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn confirm_account(&self, token: &Token) -> StoreResult<()> {
        let mut state = self.state.write().await;

        if let Some(user) = state.users.iter_mut().find(|u| u.id == token.user_id) {
            user.confirmed = true;
            user.updated_at = Utc::now();
        }
        state.tokens.retain(|t| t.id != token.id);
        Ok(())
    }

    async fn reset_password(&self, token: &Token, password_hash: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;

        if let Some(user) = state.users.iter_mut().find(|u| u.id == token.user_id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        state.tokens.retain(|t| t.id != token.id);
        Ok(())
    }

    async fn purge_expired_tokens(&self, issued_before: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state.write().await;

        let before = state.tokens.len();
        state.tokens.retain(|t| t.created_at > issued_before);
        Ok((before - state.tokens.len()) as u64)
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            project_name: data.project_name,
            client_name: data.client_name,
            description: data.description,
            manager: data.manager,
            team: Vec::new(),
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.projects.push(project.clone());
        Ok(project)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .iter()
            .filter(|p| p.is_member(user_id))
            .map(|p| state.project_view(p))
            .collect())
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .iter()
            .find(|p| p.id == id)
            .map(|p| state.project_view(p)))
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        let mut state = self.state.write().await;

        let Some(project) = state.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        project.project_name = data.project_name;
        project.client_name = data.client_name;
        project.description = data.description;
        project.updated_at = Utc::now();

        let project = project.clone();
        Ok(Some(state.project_view(&project)))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        let before = state.projects.len();
        state.projects.retain(|p| p.id != id);
        if state.projects.len() == before {
            return Ok(false);
        }

        let task_ids: Vec<Uuid> = state
            .tasks
            .iter()
            .filter(|t| t.project == id)
            .map(|t| t.id)
            .collect();
        for task_id in task_ids {
            state.remove_task_cascade(task_id);
        }
        Ok(true)
    }

    async fn add_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        Ok(match state.projects.iter_mut().find(|p| p.id == project_id) {
            Some(project) if !project.team.contains(&user_id) => {
                project.team.push(user_id);
                true
            }
            _ => false,
        })
    }

    async fn remove_team_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        let Some(project) = state.projects.iter_mut().find(|p| p.id == project_id) else {
            return Ok(false);
        };
        let before = project.team.len();
        project.team.retain(|id| *id != user_id);
        Ok(project.team.len() != before)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut state = self.state.write().await;

        if !state.projects.iter().any(|p| p.id == data.project_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            project: data.project_id,
            name: data.name,
            description: data.description,
            status: TaskStatus::default(),
            notes: Vec::new(),
            completed_by: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.project == project_id)
            .map(|t| state.task_view(t))
            .collect())
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| state.task_view(t)))
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;

        let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.name = data.name;
        task.description = data.description;
        task.updated_at = Utc::now();

        let task = task.clone();
        Ok(Some(state.task_view(&task)))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        if !state.tasks.iter().any(|t| t.id == id) {
            return Ok(false);
        }
        state.remove_task_cascade(id);
        Ok(true)
    }

    async fn record_task_status(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        status: TaskStatus,
    ) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;

        let Some(task) = state.tasks.iter_mut().find(|t| t.id == task_id) else {
            return Ok(None);
        };
        let now = Utc::now();
        task.status = status;
        task.updated_at = now;
        task.completed_by.push(StatusChange {
            user: user_id,
            status,
            changed_at: now,
        });

        let task = task.clone();
        Ok(Some(state.task_view(&task)))
    }

    async fn create_note(&self, data: CreateNote) -> StoreResult<Note> {
        let mut state = self.state.write().await;

        if !state.tasks.iter().any(|t| t.id == data.task_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }

        let note = Note {
            id: Uuid::new_v4(),
            task: data.task_id,
            content: data.content,
            created_by: data.created_by,
            created_at: Utc::now(),
        };
        state.notes.push(note.clone());
        Ok(note)
    }

    async fn list_notes(&self, task_id: Uuid) -> StoreResult<Vec<Note>> {
        let state = self.state.read().await;
        Ok(state
            .notes
            .iter()
            .filter(|n| n.task == task_id)
            .cloned()
            .collect())
    }

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        let state = self.state.read().await;
        Ok(state.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        let before = state.notes.len();
        state.notes.retain(|n| n.id != id);
        Ok(state.notes.len() != before)
    }
}
