/// Task assignment relation
///
/// A (task, user) pair appears at most once, enforced by the primary key.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_assignees (
///     task_id UUID NOT NULL REFERENCES tasks(id),
///     user_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT task_assignees_pkey PRIMARY KEY (task_id, user_id)
/// );
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskAssignee {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl TaskAssignee {
    /// Inserts a single pair, failing on a duplicate
    ///
    /// # Errors
    ///
    /// Returns a unique violation on `task_assignees_pkey` if the user is
    /// already assigned.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskAssignee>(
            r#"
            INSERT INTO task_assignees (task_id, user_id)
            VALUES ($1, $2)
            RETURNING task_id, user_id, created_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Inserts many users for one task, skipping pairs that already exist
    ///
    /// Returns the number of rows actually inserted.
    pub async fn insert_many<'e>(
        executor: impl PgExecutor<'e>,
        task_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO task_assignees (task_id, user_id)
            SELECT $1, u FROM UNNEST($2::uuid[]) AS u
            ON CONFLICT (task_id, user_id) DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(user_ids)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn exists<'e>(
        executor: impl PgExecutor<'e>,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM task_assignees
                WHERE task_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    pub async fn delete_by_task<'e>(executor: impl PgExecutor<'e>, task_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_assignees WHERE task_id = $1")
            .bind(task_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Clears assignments of every task in a project
    pub async fn delete_by_project<'e>(
        executor: impl PgExecutor<'e>,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM task_assignees
            WHERE task_id IN (SELECT id FROM tasks WHERE project_id = $1)
            "#,
        )
        .bind(project_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Fetches assignee ids for many tasks in one query
    ///
    /// Every requested task id is present in the map, with an empty vec when
    /// it has no assignees. Ids within a task are ordered by assignment time.
    pub async fn user_ids_by_task<'e>(
        executor: impl PgExecutor<'e>,
        task_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Uuid>>, sqlx::Error> {
        let mut grouped: HashMap<Uuid, Vec<Uuid>> =
            task_ids.iter().map(|id| (*id, Vec::new())).collect();

        if task_ids.is_empty() {
            return Ok(grouped);
        }

        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT task_id, user_id
            FROM task_assignees
            WHERE task_id = ANY($1)
            ORDER BY created_at ASC, user_id ASC
            "#,
        )
        .bind(task_ids)
        .fetch_all(executor)
        .await?;

        for (task_id, user_id) in rows {
            grouped.entry(task_id).or_default().push(user_id);
        }

        Ok(grouped)
    }
}
