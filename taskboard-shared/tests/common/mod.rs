//! Shared fixtures for database-backed tests
//!
//! Every test gets its own users and organization with uuid-suffixed names,
//! so tests can share one database and run in parallel. When `DATABASE_URL`
//! is unset, [`test_pool`] returns `None` and the test exits early.

#![allow(dead_code)]

use std::env;

use sqlx::PgPool;
use taskboard_shared::auth::middleware::AuthContext;
use taskboard_shared::db::migrations::run_migrations;
use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
use taskboard_shared::models::organization::{CreateOrganization, Organization};
use taskboard_shared::models::organization_member::OrganizationMember;
use taskboard_shared::models::project::Project;
use taskboard_shared::models::user::{CreateUser, User};
use taskboard_shared::services::projects::{create_project, NewProject};
use uuid::Uuid;

/// Connects and migrates, or `None` when no database is configured
pub async fn test_pool() -> anyhow::Result<Option<PgPool>> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return Ok(None);
    };

    let pool = create_pool(DatabaseConfig {
        max_connections: 5,
        ..DatabaseConfig::new(url)
    })
    .await?;
    run_migrations(&pool).await?;

    Ok(Some(pool))
}

pub async fn seed_user(pool: &PgPool, prefix: &str) -> anyhow::Result<User> {
    Ok(User::create(
        pool,
        CreateUser {
            email: format!("{}-{}@example.com", prefix, Uuid::new_v4()),
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await?)
}

/// An organization with one owner whose context asserts it
pub struct Tenant {
    pub owner: User,
    pub organization: Organization,
    pub ctx: AuthContext,
}

impl Tenant {
    pub async fn seed(pool: &PgPool) -> anyhow::Result<Self> {
        let owner = seed_user(pool, "owner").await?;
        let organization = Organization::create(
            pool,
            CreateOrganization {
                name: format!("Org {}", Uuid::new_v4()),
                owner_id: owner.id,
            },
        )
        .await?;
        OrganizationMember::create(pool, organization.id, owner.id).await?;

        let ctx = AuthContext::from_jwt(owner.id).with_organization(organization.id);

        Ok(Self {
            owner,
            organization,
            ctx,
        })
    }

    /// Adds another member and returns a context for them in this tenant
    pub async fn add_member(&self, pool: &PgPool, prefix: &str) -> anyhow::Result<(User, AuthContext)> {
        let user = seed_user(pool, prefix).await?;
        OrganizationMember::create(pool, self.organization.id, user.id).await?;
        let ctx = AuthContext::from_jwt(user.id).with_organization(self.organization.id);
        Ok((user, ctx))
    }

    pub async fn project(&self, pool: &PgPool, name: &str) -> anyhow::Result<Project> {
        Ok(create_project(
            pool,
            &self.ctx,
            NewProject {
                name: name.to_string(),
                description: None,
            },
        )
        .await?)
    }
}
