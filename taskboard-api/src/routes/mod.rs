/// API route handlers, one module per resource
///
/// - `health`: liveness and database status
/// - `auth`: signup, login, token refresh
/// - `organizations`: tenants and their members
/// - `projects`: projects and project members
/// - `statuses`: per-project ordered workflow
/// - `tasks`: tasks, assignment, priorities

pub mod auth;
pub mod health;
pub mod organizations;
pub mod projects;
pub mod statuses;
pub mod tasks;
