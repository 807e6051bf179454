/// Authorization checks for projects, tasks, team and notes
///
/// All checks are pure functions over already loaded entities, so the same
/// rules apply whatever store is in use.
///
/// # Permission Model
///
/// 1. **Manager**: the single owner of a project; may mutate the project, its
///    tasks and its team
/// 2. **Team member**: may read the project and its tasks, change task status
///    and write notes
/// 3. **Note author**: only the creator of a note may delete it
///
/// Manager and team members together are the project's *members*.
///
/// # Example
///
/// ```no_run
/// use uptask_shared::auth::authorization::{require_manager, require_task_in_project};
/// use uptask_shared::models::{project::Project, task::Task};
/// use uuid::Uuid;
///
/// fn can_edit(user_id: Uuid, project: &Project, task: &Task) -> bool {
///     require_task_in_project(task, project).is_ok() && require_manager(user_id, project).is_ok()
/// }
/// ```

use uuid::Uuid;

use crate::models::{note::Note, project::Project, task::Task};

/// Error type for authorization and team-membership checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller is not the project's manager
    #[error("Only the project manager may do this")]
    NotManager,

    /// Caller is neither manager nor team member
    #[error("Not a member of this project")]
    NotMember,

    /// Caller did not create the note
    #[error("Only the author may delete this note")]
    NotAuthor,

    /// Task addressed through a project it doesn't belong to
    #[error("Task does not belong to this project")]
    TaskNotInProject,

    /// User is already on the team
    #[error("User is already in the project")]
    AlreadyInTeam,

    /// The manager cannot also be a team member
    #[error("Cannot add the manager to their own project")]
    ManagerCannotJoin,

    /// User is not on the team
    #[error("User does not exist in the project")]
    NotInTeam,
}

/// Requires `user_id` to be the project's manager
pub fn require_manager(user_id: Uuid, project: &Project) -> Result<(), AuthzError> {
    if !project.is_manager(user_id) {
        return Err(AuthzError::NotManager);
    }
    Ok(())
}

/// Requires `user_id` to be the manager or a team member
pub fn require_member(user_id: Uuid, project: &Project) -> Result<(), AuthzError> {
    if !project.is_member(user_id) {
        return Err(AuthzError::NotMember);
    }
    Ok(())
}

/// Requires `user_id` to have written the note
pub fn require_author(user_id: Uuid, note: &Note) -> Result<(), AuthzError> {
    if note.created_by != user_id {
        return Err(AuthzError::NotAuthor);
    }
    Ok(())
}

/// Requires the task to belong to the project it was addressed through
pub fn require_task_in_project(task: &Task, project: &Project) -> Result<(), AuthzError> {
    if !task.belongs_to(project.id) {
        return Err(AuthzError::TaskNotInProject);
    }
    Ok(())
}

/// Checks that `user_id` may be added to the team
///
/// The manager is never a team member, and nobody joins twice.
pub fn check_can_join(user_id: Uuid, project: &Project) -> Result<(), AuthzError> {
    if project.is_manager(user_id) {
        return Err(AuthzError::ManagerCannotJoin);
    }
    if project.has_team_member(user_id) {
        return Err(AuthzError::AlreadyInTeam);
    }
    Ok(())
}

/// Checks that `user_id` is on the team and can be removed
pub fn check_can_leave(user_id: Uuid, project: &Project) -> Result<(), AuthzError> {
    if !project.has_team_member(user_id) {
        return Err(AuthzError::NotInTeam);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;
    use chrono::Utc;

    fn project(manager: Uuid, team: Vec<Uuid>) -> Project {
        Project {
            id: Uuid::new_v4(),
            project_name: "Website".to_string(),
            client_name: "ACME".to_string(),
            description: "Landing page".to_string(),
            manager,
            team,
            tasks: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn task(project_id: Uuid) -> Task {
        Task {
            id: Uuid::new_v4(),
            project: project_id,
            name: "Wireframes".to_string(),
            description: "Sketch".to_string(),
            status: TaskStatus::Pending,
            notes: Vec::new(),
            completed_by: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_manager() {
        let manager = Uuid::new_v4();
        let teammate = Uuid::new_v4();
        let project = project(manager, vec![teammate]);

        assert!(require_manager(manager, &project).is_ok());
        assert_eq!(require_manager(teammate, &project), Err(AuthzError::NotManager));
    }

    #[test]
    fn test_require_member() {
        let manager = Uuid::new_v4();
        let teammate = Uuid::new_v4();
        let project = project(manager, vec![teammate]);

        assert!(require_member(manager, &project).is_ok());
        assert!(require_member(teammate, &project).is_ok());
        assert_eq!(
            require_member(Uuid::new_v4(), &project),
            Err(AuthzError::NotMember)
        );
    }

    #[test]
    fn test_require_author() {
        let author = Uuid::new_v4();
        let note = Note {
            id: Uuid::new_v4(),
            task: Uuid::new_v4(),
            content: "Note".to_string(),
            created_by: author,
            created_at: Utc::now(),
        };

        assert!(require_author(author, &note).is_ok());
        assert_eq!(require_author(Uuid::new_v4(), &note), Err(AuthzError::NotAuthor));
    }

    #[test]
    fn test_require_task_in_project() {
        let project = project(Uuid::new_v4(), vec![]);
        let other = self::project(Uuid::new_v4(), vec![]);

        assert!(require_task_in_project(&task(project.id), &project).is_ok());
        assert_eq!(
            require_task_in_project(&task(other.id), &project),
            Err(AuthzError::TaskNotInProject)
        );
    }

    #[test]
    fn test_team_rules() {
        let manager = Uuid::new_v4();
        let teammate = Uuid::new_v4();
        let newcomer = Uuid::new_v4();
        let project = project(manager, vec![teammate]);

        assert_eq!(check_can_join(manager, &project), Err(AuthzError::ManagerCannotJoin));
        assert_eq!(check_can_join(teammate, &project), Err(AuthzError::AlreadyInTeam));
        assert!(check_can_join(newcomer, &project).is_ok());

        assert!(check_can_leave(teammate, &project).is_ok());
        assert_eq!(check_can_leave(newcomer, &project), Err(AuthzError::NotInTeam));
        assert_eq!(check_can_leave(manager, &project), Err(AuthzError::NotInTeam));
    }
}
