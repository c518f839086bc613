/// Workflow status model and database operations
///
/// Each project owns an ordered list of statuses (Kanban columns). The
/// `sort_index` column holds the position; within one project the indices are
/// a dense `0..N-1` permutation. Reordering logic lives in
/// [`crate::services::statuses`]; this module only reads and writes rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE statuses (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     name TEXT NOT NULL,
///     slug TEXT NOT NULL,
///     sort_index INTEGER NOT NULL CHECK (sort_index >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT statuses_project_slug_key UNIQUE (project_id, slug),
///     CONSTRAINT statuses_project_sort_index_key UNIQUE (project_id, sort_index)
///         DEFERRABLE INITIALLY DEFERRED
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnection, PgExecutor};
use uuid::Uuid;

/// Statuses every new project starts with, in display order
pub const DEFAULT_STATUSES: [&str; 5] = ["Todo", "In Progress", "Done", "Pending", "Canceled"];

/// Slug of the status new tasks land in when none is given
pub const DEFAULT_STATUS_SLUG: &str = "todo";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Status {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,

    /// Derived from the name, see [`slugify`]
    pub slug: String,

    /// Display position within the project
    #[sqlx(rename = "sort_index")]
    pub index: i32,

    pub created_at: DateTime<Utc>,
}

/// Derives a status slug: lowercased words joined by underscores
///
/// ```
/// use taskboard_shared::models::status::slugify;
///
/// assert_eq!(slugify("In Progress"), "in_progress");
/// assert_eq!(slugify("  Code   Review "), "code_review");
/// ```
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

impl Status {
    /// Inserts a status at an explicit index
    ///
    /// The caller is responsible for choosing an index that keeps the project's
    /// ordering dense.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        project_id: Uuid,
        name: &str,
        index: i32,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Status>(
            r#"
            INSERT INTO statuses (project_id, name, slug, sort_index)
            VALUES ($1, $2, $3, $4)
            RETURNING id, project_id, name, slug, sort_index, created_at
            "#,
        )
        .bind(project_id)
        .bind(name)
        .bind(slugify(name))
        .bind(index)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Status>(
            r#"
            SELECT id, project_id, name, slug, sort_index, created_at
            FROM statuses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists a project's statuses in display order
    pub async fn list_by_project<'e>(
        executor: impl PgExecutor<'e>,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Status>(
            r#"
            SELECT id, project_id, name, slug, sort_index, created_at
            FROM statuses
            WHERE project_id = $1
            ORDER BY sort_index ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    /// Lists a project's statuses in display order and row-locks them until
    /// the surrounding transaction ends
    ///
    /// Every mutation of a project's ordering takes this lock first, so two
    /// concurrent reorders of the same project run one after the other. The
    /// project row is locked before the statuses so that a waiter re-reads
    /// the status set, including rows inserted by the transaction it waited on.
    pub async fn lock_by_project(
        conn: &mut PgConnection,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        // NO KEY UPDATE leaves task inserts (FK key-share locks) unblocked
        sqlx::query("SELECT id FROM projects WHERE id = $1 FOR NO KEY UPDATE")
            .bind(project_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query_as::<_, Status>(
            r#"
            SELECT id, project_id, name, slug, sort_index, created_at
            FROM statuses
            WHERE project_id = $1
            ORDER BY sort_index ASC
            FOR UPDATE
            "#,
        )
        .bind(project_id)
        .fetch_all(conn)
        .await
    }

    /// Writes a batch of `(id, index)` pairs in a single statement
    pub async fn apply_indices<'e>(
        executor: impl PgExecutor<'e>,
        changes: &[(Uuid, i32)],
    ) -> Result<u64, sqlx::Error> {
        if changes.is_empty() {
            return Ok(0);
        }

        let (ids, indices): (Vec<Uuid>, Vec<i32>) = changes.iter().copied().unzip();

        let result = sqlx::query(
            r#"
            UPDATE statuses
            SET sort_index = v.idx
            FROM UNNEST($1::uuid[], $2::int4[]) AS v(id, idx)
            WHERE statuses.id = v.id
            "#,
        )
        .bind(ids)
        .bind(indices)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Renames a status and recomputes its slug
    pub async fn rename<'e>(executor: impl PgExecutor<'e>, id: Uuid, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Status>(
            r#"
            UPDATE statuses
            SET name = $2, slug = $3
            WHERE id = $1
            RETURNING id, project_id, name, slug, sort_index, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(slugify(name))
        .fetch_one(executor)
        .await
    }

    /// Status new tasks default to: the `todo` slug, else the first column
    pub async fn find_default_for_project<'e>(
        executor: impl PgExecutor<'e>,
        project_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Status>(
            r#"
            SELECT id, project_id, name, slug, sort_index, created_at
            FROM statuses
            WHERE project_id = $1
            ORDER BY (slug = $2) DESC, sort_index ASC
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .bind(DEFAULT_STATUS_SLUG)
        .fetch_optional(executor)
        .await
    }

    /// Number of tasks currently in this status
    pub async fn task_count<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE status_id = $1")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM statuses WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_project<'e>(
        executor: impl PgExecutor<'e>,
        project_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM statuses WHERE project_id = $1")
            .bind(project_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
