/// Organization model and database operations
///
/// An organization is the tenant boundary: every project belongs to exactly
/// one organization, and requests select the organization they act within via
/// the `X-Organization-ID` header.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT organizations_name_key UNIQUE (name)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

/// A named tenant with a single owner
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    pub id: Uuid,

    /// Globally unique
    pub name: String,

    /// User who created the organization
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
}

/// Input for creating an organization
#[derive(Debug, Clone)]
pub struct CreateOrganization {
    pub name: String,
    pub owner_id: Uuid,
}

impl Organization {
    /// Inserts an organization
    ///
    /// Does not add the owner as a member; callers do that in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns a unique violation on `organizations_name_key` if the name is taken.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use taskboard_shared::models::organization::{CreateOrganization, Organization};
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), sqlx::Error> {
    /// let mut tx = pool.begin().await?;
    /// let org = Organization::create(
    ///     &mut *tx,
    ///     CreateOrganization { name: "Acme".to_string(), owner_id },
    /// )
    /// .await?;
    /// tx.commit().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        data: CreateOrganization,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, owner_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_id, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.owner_id)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, owner_id, created_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists the organizations a user is a member of, oldest first
    pub async fn list_by_member<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.id, o.name, o.owner_id, o.created_at
            FROM organizations o
            JOIN organization_members m ON m.organization_id = o.id
            WHERE m.user_id = $1
            ORDER BY o.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }
}
