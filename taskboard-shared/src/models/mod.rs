/// Database models for Taskboard
///
/// Each model owns its table's SQL. Functions take any Postgres executor, so
/// the same call works against the pool or inside a transaction
/// (`&mut *tx`).
///
/// # Models
///
/// - `user`: accounts
/// - `organization` / `organization_member`: tenants and their members
/// - `project` / `project_member`: projects and direct project membership
/// - `status`: ordered per-project workflow columns
/// - `priority`: global seeded priorities
/// - `task` / `task_assignee`: tasks and their assignment relation

pub mod organization;
pub mod organization_member;
pub mod priority;
pub mod project;
pub mod project_member;
pub mod status;
pub mod task;
pub mod task_assignee;
pub mod user;
