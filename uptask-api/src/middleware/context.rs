/// Request context extractors
///
/// Project routes resolve their path segments into loaded entities before the
/// handler body runs. Each step is an extractor producing a typed value:
///
/// 1. [`Caller`]: the authenticated user (needs `jwt_auth_layer`)
/// 2. [`ProjectScope`]: caller plus the project named by `:projectId`
/// 3. [`TaskScope`]: project scope plus the task named by `:taskId`, which
///    must belong to that project
/// 4. [`Manager`] / [`Member`]: wrap a scope and reject callers who aren't
///    the project's manager / a project member
///
/// ```ignore
/// async fn delete_task(Manager(scope): Manager<TaskScope>) -> ApiResult<String> {
///     // scope.task belongs to scope.project, caller is its manager
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ValidationErrorDetail},
};
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;
use uptask_shared::{
    auth::{
        authorization::{require_manager, require_member, require_task_in_project},
        middleware::AuthContext,
    },
    models::{project::Project, task::Task, user::User},
};
use uuid::Uuid;

/// Named path parameters of the matched route
#[derive(Debug, Clone)]
pub struct PathIds(HashMap<String, String>);

impl PathIds {
    /// Reads `name` as an id
    ///
    /// A malformed id is a validation failure on that parameter.
    pub fn id(&self, name: &str) -> Result<Uuid, ApiError> {
        let raw = self
            .0
            .get(name)
            .ok_or_else(|| ApiError::BadRequest(format!("Missing path parameter: {name}")))?;

        parse_id(name, raw)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for PathIds
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(PathIds(params))
    }
}

async fn path_id(parts: &mut Parts, state: &AppState, name: &str) -> Result<Uuid, ApiError> {
    PathIds::from_request_parts(parts, state).await?.id(name)
}

/// Parses `raw` as an id, reporting `field` on failure
pub fn parse_id(field: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::ValidationError(vec![ValidationErrorDetail::new(field, "Invalid ID")]))
}

/// The authenticated user making the request
#[derive(Debug, Clone)]
pub struct Caller(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

        // A valid signature for a user that no longer resolves
        let user = state
            .store
            .find_user_by_id(auth.user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid Token".to_string()))?;

        Ok(Caller(user))
    }
}

/// Caller and the project addressed by `:projectId`
#[derive(Debug, Clone)]
pub struct ProjectScope {
    pub caller: User,
    pub project: Project,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for ProjectScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Caller(caller) = Caller::from_request_parts(parts, state).await?;
        let project_id = path_id(parts, state, "projectId").await?;

        let project = state
            .store
            .find_project(project_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Project Not Found".to_string()))?;

        Ok(ProjectScope { caller, project })
    }
}

/// Project scope plus the task addressed by `:taskId`
#[derive(Debug, Clone)]
pub struct TaskScope {
    pub caller: User,
    pub project: Project,
    pub task: Task,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for TaskScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ProjectScope { caller, project } = ProjectScope::from_request_parts(parts, state).await?;
        let task_id = path_id(parts, state, "taskId").await?;

        let task = state
            .store
            .find_task(task_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Task Not Found".to_string()))?;

        require_task_in_project(&task, &project)?;

        Ok(TaskScope {
            caller,
            project,
            task,
        })
    }
}

/// A resolved scope that names a caller and a project
pub trait Scoped {
    fn caller(&self) -> &User;
    fn project(&self) -> &Project;
}

impl Scoped for ProjectScope {
    fn caller(&self) -> &User {
        &self.caller
    }

    fn project(&self) -> &Project {
        &self.project
    }
}

impl Scoped for TaskScope {
    fn caller(&self) -> &User {
        &self.caller
    }

    fn project(&self) -> &Project {
        &self.project
    }
}

/// Scope whose caller manages the project
#[derive(Debug, Clone)]
pub struct Manager<S>(pub S);

#[axum::async_trait]
impl<S> FromRequestParts<AppState> for Manager<S>
where
    S: Scoped + FromRequestParts<AppState, Rejection = ApiError> + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let scope = S::from_request_parts(parts, state).await?;
        require_manager(scope.caller().id, scope.project())?;
        Ok(Manager(scope))
    }
}

/// Scope whose caller is the manager or on the team
#[derive(Debug, Clone)]
pub struct Member<S>(pub S);

#[axum::async_trait]
impl<S> FromRequestParts<AppState> for Member<S>
where
    S: Scoped + FromRequestParts<AppState, Rejection = ApiError> + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let scope = S::from_request_parts(parts, state).await?;
        require_member(scope.caller().id, scope.project())?;
        Ok(Member(scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id("projectId", &id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_path_ids_lookup() {
        let id = Uuid::new_v4();
        let params = PathIds(HashMap::from([("noteId".to_string(), id.to_string())]));

        assert_eq!(params.id("noteId").unwrap(), id);
        assert!(matches!(params.id("userId"), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        match parse_id("taskId", "not-an-id") {
            Err(ApiError::ValidationError(details)) => {
                assert_eq!(details, vec![ValidationErrorDetail::new("taskId", "Invalid ID")]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
