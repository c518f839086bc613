/// Global task priorities
///
/// A small fixed set seeded by the initial migration: Low, Medium, High,
/// Urgent. Priorities are not project-scoped and have no write API.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

/// Priority assigned to tasks created without one
pub const DEFAULT_PRIORITY: &str = "Medium";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Priority {
    pub id: Uuid,
    pub name: String,

    /// Higher is more severe
    pub level: i32,

    /// Display color, `#rrggbb`
    pub color: String,
}

impl Priority {
    /// Lists every priority, least severe first
    pub async fn list<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Priority>(
            "SELECT id, name, level, color FROM priorities ORDER BY level ASC",
        )
        .fetch_all(executor)
        .await
    }

    pub async fn find_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Priority>("SELECT id, name, level, color FROM priorities WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_name<'e>(
        executor: impl PgExecutor<'e>,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Priority>("SELECT id, name, level, color FROM priorities WHERE name = $1")
            .bind(name)
            .fetch_optional(executor)
            .await
    }
}
