/// Team endpoints
///
/// Finding, adding and removing collaborators is for the manager; any
/// project member may see the team.
///
/// - `POST /api/projects/:projectId/team/find` - Look a user up by email
/// - `GET /api/projects/:projectId/team` - Team members
/// - `POST /api/projects/:projectId/team` - Add a user by id
/// - `DELETE /api/projects/:projectId/team/:userId` - Remove a user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::{
        context::{parse_id, Manager, Member, PathIds, ProjectScope},
        validation::ValidJson,
    },
};
use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;
use uptask_shared::{
    auth::authorization::{check_can_join, check_can_leave, AuthzError},
    models::user::UserSummary,
};
use validator::Validate;

/// Lookup by email
#[derive(Debug, Deserialize, Validate)]
pub struct FindMemberRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid Email"))]
    pub email: String,
}

/// Add by user id
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Invalid ID"))]
    pub id: String,
}

/// Find a user to invite
///
/// # Errors
///
/// - `404 Not Found`: No account with that email
pub async fn find_member(
    State(state): State<AppState>,
    Manager(_scope): Manager<ProjectScope>,
    ValidJson(req): ValidJson<FindMemberRequest>,
) -> ApiResult<Json<UserSummary>> {
    let email = req.email.trim().to_lowercase();

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserSummary::from(&user)))
}

/// Team members in the order they joined
pub async fn list_team(
    State(state): State<AppState>,
    Member(scope): Member<ProjectScope>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let team = state.store.find_user_summaries(&scope.project.team).await?;
    Ok(Json(team))
}

/// Add a user to the team
///
/// # Errors
///
/// - `404 Not Found`: No such user
/// - `409 Conflict`: Already on the team, or the manager
pub async fn add_member(
    State(state): State<AppState>,
    Manager(scope): Manager<ProjectScope>,
    ValidJson(req): ValidJson<AddMemberRequest>,
) -> ApiResult<String> {
    let user_id = parse_id("id", &req.id)?;

    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    check_can_join(user.id, &scope.project)?;

    if !state.store.add_team_member(scope.project.id, user.id).await? {
        return Err(AuthzError::AlreadyInTeam.into());
    }

    info!(project_id = %scope.project.id, user_id = %user.id, "Team member added");

    Ok("User successfully added".to_string())
}

/// Remove a user from the team
///
/// # Errors
///
/// - `409 Conflict`: User isn't on the team
pub async fn remove_member(
    State(state): State<AppState>,
    Manager(scope): Manager<ProjectScope>,
    params: PathIds,
) -> ApiResult<String> {
    let user_id = params.id("userId")?;

    check_can_leave(user_id, &scope.project)?;

    if !state.store.remove_team_member(scope.project.id, user_id).await? {
        return Err(AuthzError::NotInTeam.into());
    }

    info!(project_id = %scope.project.id, user_id = %user_id, "Team member removed");

    Ok("User successfully removed".to_string())
}
