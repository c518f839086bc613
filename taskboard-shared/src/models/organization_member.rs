/// Organization membership relation
///
/// A plain (organization, user) pair with no role. Membership gates the
/// tenant context: a request may only assert an organization its principal
/// belongs to.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organization_members (
///     organization_id UUID NOT NULL REFERENCES organizations(id),
///     user_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT organization_members_pkey PRIMARY KEY (organization_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrganizationMember {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A member as shown in member listings (organization or project)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberProfile {
    pub user_id: Uuid,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

impl OrganizationMember {
    /// Adds a user to an organization
    ///
    /// # Errors
    ///
    /// Returns a unique violation on `organization_members_pkey` if the user is
    /// already a member.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, OrganizationMember>(
            r#"
            INSERT INTO organization_members (organization_id, user_id)
            VALUES ($1, $2)
            RETURNING organization_id, user_id, created_at
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Checks whether a user belongs to an organization
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use taskboard_shared::models::organization_member::OrganizationMember;
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, org_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    /// if OrganizationMember::exists(&pool, org_id, user_id).await? {
    ///     println!("member");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn exists<'e>(
        executor: impl PgExecutor<'e>,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM organization_members
                WHERE organization_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Lists members with their emails, in join order
    pub async fn list_profiles<'e>(
        executor: impl PgExecutor<'e>,
        organization_id: Uuid,
    ) -> Result<Vec<MemberProfile>, sqlx::Error> {
        sqlx::query_as::<_, MemberProfile>(
            r#"
            SELECT u.id AS user_id, u.email, m.created_at AS joined_at
            FROM organization_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.organization_id = $1
            ORDER BY m.created_at ASC, u.email ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(executor)
        .await
    }
}
