/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Account workflow and the caller's own account
/// - `projects`: Project CRUD
/// - `tasks`: Tasks of a project and their status
/// - `team`: Project team membership
/// - `notes`: Notes on a task

pub mod auth;
pub mod health;
pub mod notes;
pub mod projects;
pub mod tasks;
pub mod team;
