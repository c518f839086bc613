/// Task lifecycle
///
/// Tasks inherit visibility from their project. Every read returns a
/// [`TaskView`]: the task row plus its assignee ids, fetched for the whole
/// list in one query.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{postgres::PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use super::assignments::{self, AssignmentReport, Identity};
use super::error::ServiceError;
use crate::auth::access::{resolve_project, resolve_task, AccessStrategy};
use crate::auth::middleware::AuthContext;
use crate::models::priority::{Priority, DEFAULT_PRIORITY};
use crate::models::status::Status;
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::task_assignee::TaskAssignee;

/// A task with its assignee ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub assignee_ids: Vec<Uuid>,
}

/// Input for [`create_task`]; omitted status and priority use project defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub status_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub assignee_ids: Option<Vec<Uuid>>,
}

/// Partial update for [`update_task`]
///
/// `assignee_ids: Some(..)` replaces the whole assignee set, `None` leaves it.
/// For dates, an absent field leaves the value, `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub assignee_ids: Option<Vec<Uuid>>,
}

/// Keeps an explicit JSON `null` apart from a missing field
///
/// Use with `#[serde(default)]`: missing gives `None`, `null` gives
/// `Some(None)`, a value gives `Some(Some(v))`.
pub fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_title(title: &str) -> Result<String, ServiceError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::validation("Task title is required"));
    }
    Ok(title.to_string())
}

/// Rejects an end date that falls before the start date
pub fn validate_dates(
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<(), ServiceError> {
    match (start_date, end_date) {
        (Some(start), Some(end)) if end < start => Err(ServiceError::validation(
            "End date must not be before start date",
        )),
        _ => Ok(()),
    }
}

async fn status_in_project(
    conn: &mut PgConnection,
    project_id: Uuid,
    status_id: Uuid,
) -> Result<Status, ServiceError> {
    match Status::find_by_id(&mut *conn, status_id).await? {
        Some(status) if status.project_id == project_id => Ok(status),
        _ => Err(ServiceError::validation("Status does not belong to this project")),
    }
}

async fn existing_priority(conn: &mut PgConnection, priority_id: Uuid) -> Result<Priority, ServiceError> {
    Priority::find_by_id(&mut *conn, priority_id)
        .await?
        .ok_or_else(|| ServiceError::validation("Unknown priority"))
}

async fn with_assignees(pool: &PgPool, tasks: Vec<Task>) -> Result<Vec<TaskView>, ServiceError> {
    let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
    let mut assignees: HashMap<Uuid, Vec<Uuid>> = TaskAssignee::user_ids_by_task(pool, &ids).await?;

    Ok(tasks
        .into_iter()
        .map(|task| {
            let assignee_ids = assignees.remove(&task.id).unwrap_or_default();
            TaskView { task, assignee_ids }
        })
        .collect())
}

async fn view_of(pool: &PgPool, task: Task) -> Result<TaskView, ServiceError> {
    let mut views = with_assignees(pool, vec![task]).await?;
    views
        .pop()
        .ok_or_else(|| ServiceError::not_found("Task not found"))
}

/// Creates a task in a visible project
///
/// # Errors
///
/// - `Validation` for an empty title, a status from another project, an
///   unknown priority, or an end date before the start date
/// - `NotFound` when the project is missing or invisible
pub async fn create_task(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    input: NewTask,
) -> Result<TaskView, ServiceError> {
    let title = validate_title(&input.title)?;
    validate_dates(input.start_date, input.end_date)?;

    let project = resolve_project(access, pool, ctx, input.project_id).await?;

    let mut tx = pool.begin().await?;

    let status = match input.status_id {
        Some(status_id) => status_in_project(&mut tx, project.id, status_id).await?,
        None => Status::find_default_for_project(&mut *tx, project.id)
            .await?
            .ok_or_else(|| ServiceError::validation("Project has no statuses"))?,
    };

    let priority = match input.priority_id {
        Some(priority_id) => existing_priority(&mut tx, priority_id).await?,
        None => Priority::find_by_name(&mut *tx, DEFAULT_PRIORITY)
            .await?
            .ok_or_else(|| ServiceError::not_found("Default priority is missing"))?,
    };

    let task = Task::create(
        &mut *tx,
        CreateTask {
            project_id: project.id,
            title,
            status_id: status.id,
            priority_id: priority.id,
            start_date: input.start_date,
            end_date: input.end_date,
        },
    )
    .await?;

    assignments::replace_assignments_in(&mut tx, task.id, input.assignee_ids.as_deref()).await?;

    tx.commit().await?;

    info!(
        project_id = %project.id,
        task_id = %task.id,
        status = %status.slug,
        priority = %priority.name,
        "Task created"
    );

    view_of(pool, task).await
}

pub async fn get_task(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    task_id: Uuid,
) -> Result<TaskView, ServiceError> {
    let task = resolve_task(access, pool, ctx, task_id).await?;
    view_of(pool, task).await
}

/// Lists a visible project's tasks, oldest first
pub async fn list_tasks(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    project_id: Uuid,
) -> Result<Vec<TaskView>, ServiceError> {
    let project = resolve_project(access, pool, ctx, project_id).await?;
    let tasks = Task::list_by_project(pool, project.id).await?;
    with_assignees(pool, tasks).await
}

/// Applies a partial update, optionally replacing the assignee set
///
/// Field changes and assignee replacement commit together or not at all.
pub async fn update_task(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    task_id: Uuid,
    patch: TaskPatch,
) -> Result<TaskView, ServiceError> {
    let title = patch.title.as_deref().map(validate_title).transpose()?;

    let current = resolve_task(access, pool, ctx, task_id).await?;
    validate_dates(
        patch.start_date.unwrap_or(current.start_date),
        patch.end_date.unwrap_or(current.end_date),
    )?;

    let mut tx = pool.begin().await?;

    if let Some(status_id) = patch.status_id {
        status_in_project(&mut tx, current.project_id, status_id).await?;
    }
    if let Some(priority_id) = patch.priority_id {
        existing_priority(&mut tx, priority_id).await?;
    }

    let updated = Task::update(
        &mut *tx,
        current.id,
        UpdateTask {
            title,
            status_id: patch.status_id,
            priority_id: patch.priority_id,
            start_date: patch.start_date,
            end_date: patch.end_date,
        },
    )
    .await?
    .ok_or_else(|| ServiceError::not_found("Task not found"))?;

    assignments::replace_assignments_in(&mut tx, updated.id, patch.assignee_ids.as_deref()).await?;

    tx.commit().await?;

    info!(task_id = %updated.id, "Task updated");
    view_of(pool, updated).await
}

/// Deletes a task and its assignments
pub async fn delete_task(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    task_id: Uuid,
) -> Result<(), ServiceError> {
    let task = resolve_task(access, pool, ctx, task_id).await?;

    let mut tx = pool.begin().await?;
    TaskAssignee::delete_by_task(&mut *tx, task.id).await?;
    if !Task::delete(&mut *tx, task.id).await? {
        return Err(ServiceError::not_found("Task not found"));
    }
    tx.commit().await?;

    info!(project_id = %task.project_id, task_id = %task.id, "Task deleted");
    Ok(())
}

/// Adds users to a visible task by email or user id
pub async fn assign_users(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    task_id: Uuid,
    identities: &[Identity],
) -> Result<AssignmentReport, ServiceError> {
    let task = resolve_task(access, pool, ctx, task_id).await?;
    assignments::assign_by_identity(pool, task.id, identities).await
}

/// Assigns the caller to a visible task
pub async fn take_task(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    task_id: Uuid,
) -> Result<TaskView, ServiceError> {
    let task = resolve_task(access, pool, ctx, task_id).await?;
    assignments::self_assign(pool, task.id, ctx.user_id).await?;
    view_of(pool, task).await
}

/// Lists the global priorities, lowest level first
pub async fn list_priorities(pool: &PgPool) -> Result<Vec<Priority>, ServiceError> {
    Ok(Priority::list(pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::error::ErrorKind;
    use chrono::Duration;

    #[test]
    fn test_validate_title_trims() {
        assert_eq!(validate_title("  Ship it ").unwrap(), "Ship it");
        assert_eq!(validate_title("   ").unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_validate_dates() {
        let now = Utc::now();
        let later = now + Duration::days(2);

        assert!(validate_dates(None, None).is_ok());
        assert!(validate_dates(Some(now), None).is_ok());
        assert!(validate_dates(Some(now), Some(later)).is_ok());
        assert!(validate_dates(Some(now), Some(now)).is_ok());

        let err = validate_dates(Some(later), Some(now)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_task_view_flattens_task() {
        let task = Task {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Plan sprint".to_string(),
            status_id: Uuid::new_v4(),
            priority_id: Uuid::new_v4(),
            start_date: None,
            end_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let assignee = Uuid::new_v4();

        let json = serde_json::to_value(TaskView {
            task: task.clone(),
            assignee_ids: vec![assignee],
        })
        .unwrap();

        assert_eq!(json["id"], task.id.to_string());
        assert_eq!(json["title"], "Plan sprint");
        assert_eq!(json["assignee_ids"][0], assignee.to_string());
    }

    #[test]
    fn test_patch_tells_null_date_from_missing() {
        let patch: TaskPatch = serde_json::from_str(r#"{"title": "Renamed"}"#).unwrap();
        assert_eq!(patch.start_date, None);
        assert_eq!(patch.end_date, None);

        let patch: TaskPatch = serde_json::from_str(r#"{"start_date": null}"#).unwrap();
        assert_eq!(patch.start_date, Some(None));
        assert_eq!(patch.end_date, None);

        let patch: TaskPatch =
            serde_json::from_str(r#"{"end_date": "2025-03-01T00:00:00Z"}"#).unwrap();
        assert!(matches!(patch.end_date, Some(Some(_))));
    }
}
