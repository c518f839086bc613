/// Task model and database operations
///
/// A task belongs to one project and sits in one of that project's statuses.
/// Its assignee set lives in `task_assignees`, see
/// [`super::task_assignee::TaskAssignee`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     title TEXT NOT NULL,
///     status_id UUID NOT NULL REFERENCES statuses(id),
///     priority_id UUID NOT NULL REFERENCES priorities(id),
///     start_date TIMESTAMPTZ,
///     end_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{CreateTask, Task};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, status_id: Uuid, priority_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(
///     &pool,
///     CreateTask {
///         project_id,
///         title: "Write release notes".to_string(),
///         status_id,
///         priority_id,
///         start_date: None,
///         end_date: None,
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub status_id: Uuid,
    pub priority_id: Uuid,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fully resolved input for a new task (defaults already applied)
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub status_id: Uuid,
    pub priority_id: Uuid,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Partial update of the task row; only `Some` fields are written
///
/// Dates are nullable columns: `Some(None)` clears them.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub status_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
}

const TASK_COLUMNS: &str =
    "id, project_id, title, status_id, priority_id, start_date, end_date, created_at, updated_at";

impl Task {
    pub async fn create<'e>(executor: impl PgExecutor<'e>, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (project_id, title, status_id, priority_id, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.status_id)
        .bind(data.priority_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lists a project's tasks, oldest first
    pub async fn list_by_project<'e>(
        executor: impl PgExecutor<'e>,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE project_id = $1 ORDER BY created_at ASC, id ASC",
            TASK_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    /// Applies a partial update and bumps `updated_at`
    ///
    /// Returns `None` if the task does not exist.
    pub async fn update<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        for (column, present) in [
            ("title", data.title.is_some()),
            ("status_id", data.status_id.is_some()),
            ("priority_id", data.priority_id.is_some()),
            ("start_date", data.start_date.is_some()),
            ("end_date", data.end_date.is_some()),
        ] {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {} = ${}", column, bind_count));
            }
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", TASK_COLUMNS));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);
        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(status_id) = data.status_id {
            q = q.bind(status_id);
        }
        if let Some(priority_id) = data.priority_id {
            q = q.bind(priority_id);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(end_date) = data.end_date {
            q = q.bind(end_date);
        }

        q.fetch_optional(executor).await
    }

    pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task of a project; assignees must already be cleared
    pub async fn delete_by_project<'e>(
        executor: impl PgExecutor<'e>,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
