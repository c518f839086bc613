/// Project access strategies
///
/// Two deployment-wide policies decide whether a principal may see a project:
///
/// - [`OrganizationScoped`] (default): a project is visible when the request's
///   verified tenant context equals the project's organization. Requests with
///   no tenant context are rejected with a validation error.
/// - [`DirectMembership`]: a project is visible when the principal has a row
///   in `project_members`, regardless of tenant context.
///
/// One strategy is chosen at startup ([`strategy_for`]) and shared as an
/// `Arc<dyn AccessStrategy>`. Tasks and statuses inherit visibility from their
/// project.
///
/// Invisible and missing resources are reported identically, as `NotFound`,
/// so existence never leaks across tenants.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::access::{resolve_project, strategy_for, AccessMode};
/// use taskboard_shared::auth::middleware::AuthContext;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, ctx: AuthContext, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let strategy = strategy_for(AccessMode::Organization);
/// let project = resolve_project(strategy.as_ref(), &pool, &ctx, project_id).await?;
/// println!("{}", project.name);
/// # Ok(())
/// # }
/// ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::{
    organization_member::OrganizationMember, project::Project, project_member::ProjectMember,
    status::Status, task::Task,
};
use crate::services::error::ServiceError;

/// Which access strategy a deployment uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Organization,
    ProjectMembers,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Organization => "organization",
            AccessMode::ProjectMembers => "project_members",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "organization" | "org" => Ok(AccessMode::Organization),
            "project_members" | "direct" => Ok(AccessMode::ProjectMembers),
            other => Err(format!(
                "Unknown access mode '{}', expected 'organization' or 'project_members'",
                other
            )),
        }
    }
}

/// A project visibility policy
#[async_trait]
pub trait AccessStrategy: Send + Sync + fmt::Debug {
    fn mode(&self) -> AccessMode;

    /// Decides whether the principal may act on an already-loaded project
    ///
    /// May fail with `Validation` when the strategy needs a tenant context the
    /// request did not supply.
    async fn can_access_project(
        &self,
        pool: &PgPool,
        ctx: &AuthContext,
        project: &Project,
    ) -> Result<bool, ServiceError>;

    /// Lists every project visible to the principal
    async fn visible_projects(
        &self,
        pool: &PgPool,
        ctx: &AuthContext,
    ) -> Result<Vec<Project>, ServiceError>;
}

/// Tenant-context strategy: project.organization_id must equal the asserted tenant
#[derive(Debug, Default, Clone, Copy)]
pub struct OrganizationScoped;

#[async_trait]
impl AccessStrategy for OrganizationScoped {
    fn mode(&self) -> AccessMode {
        AccessMode::Organization
    }

    async fn can_access_project(
        &self,
        _pool: &PgPool,
        ctx: &AuthContext,
        project: &Project,
    ) -> Result<bool, ServiceError> {
        // organization_id on the context is only set once membership is verified
        let tenant = ctx.require_organization()?;
        Ok(project.organization_id == tenant)
    }

    async fn visible_projects(
        &self,
        pool: &PgPool,
        ctx: &AuthContext,
    ) -> Result<Vec<Project>, ServiceError> {
        let tenant = ctx.require_organization()?;
        Ok(Project::list_by_organization(pool, tenant).await?)
    }
}

/// Legacy strategy: access follows direct `project_members` rows
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectMembership;

#[async_trait]
impl AccessStrategy for DirectMembership {
    fn mode(&self) -> AccessMode {
        AccessMode::ProjectMembers
    }

    async fn can_access_project(
        &self,
        pool: &PgPool,
        ctx: &AuthContext,
        project: &Project,
    ) -> Result<bool, ServiceError> {
        Ok(ProjectMember::exists(pool, project.id, ctx.user_id).await?)
    }

    async fn visible_projects(
        &self,
        pool: &PgPool,
        ctx: &AuthContext,
    ) -> Result<Vec<Project>, ServiceError> {
        Ok(Project::list_by_member(pool, ctx.user_id).await?)
    }
}

/// Builds the strategy for a configured mode
pub fn strategy_for(mode: AccessMode) -> Arc<dyn AccessStrategy> {
    match mode {
        AccessMode::Organization => Arc::new(OrganizationScoped),
        AccessMode::ProjectMembers => Arc::new(DirectMembership),
    }
}

/// Something a principal may try to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Organization(Uuid),
    Project(Uuid),
    Task(Uuid),
    Status(Uuid),
}

/// Answers "may this principal act on this resource?"
///
/// Organizations require membership. Projects, tasks and statuses go through
/// the strategy. Missing resources answer `false`.
pub async fn authorize(
    strategy: &dyn AccessStrategy,
    pool: &PgPool,
    ctx: &AuthContext,
    resource: Resource,
) -> Result<bool, ServiceError> {
    let project_id = match resource {
        Resource::Organization(id) => {
            return Ok(OrganizationMember::exists(pool, id, ctx.user_id).await?);
        }
        Resource::Project(id) => Some(id),
        Resource::Task(id) => Task::find_by_id(pool, id).await?.map(|t| t.project_id),
        Resource::Status(id) => Status::find_by_id(pool, id).await?.map(|s| s.project_id),
    };

    let Some(project_id) = project_id else {
        return Ok(false);
    };

    match Project::find_by_id(pool, project_id).await? {
        Some(project) => strategy.can_access_project(pool, ctx, &project).await,
        None => Ok(false),
    }
}

/// Loads a project the principal may see, or `NotFound`
pub async fn resolve_project(
    strategy: &dyn AccessStrategy,
    pool: &PgPool,
    ctx: &AuthContext,
    project_id: Uuid,
) -> Result<Project, ServiceError> {
    let project = Project::find_by_id(pool, project_id).await?;

    match project {
        Some(project) if strategy.can_access_project(pool, ctx, &project).await? => Ok(project),
        _ => {
            // tenant-less requests still fail as Validation, not NotFound
            if strategy.mode() == AccessMode::Organization {
                ctx.require_organization()?;
            }
            Err(ServiceError::not_found("Project not found"))
        }
    }
}

/// Loads a task whose project the principal may see, or `NotFound`
pub async fn resolve_task(
    strategy: &dyn AccessStrategy,
    pool: &PgPool,
    ctx: &AuthContext,
    task_id: Uuid,
) -> Result<Task, ServiceError> {
    let task = Task::find_by_id(pool, task_id)
        .await?
        .ok_or_else(|| not_found_after_tenant_check(strategy, ctx, "Task not found"))?;

    resolve_project(strategy, pool, ctx, task.project_id)
        .await
        .map_err(|e| relabel_not_found(e, "Task not found"))?;

    Ok(task)
}

/// Loads a status whose project the principal may see, or `NotFound`
pub async fn resolve_status(
    strategy: &dyn AccessStrategy,
    pool: &PgPool,
    ctx: &AuthContext,
    status_id: Uuid,
) -> Result<Status, ServiceError> {
    let status = Status::find_by_id(pool, status_id)
        .await?
        .ok_or_else(|| not_found_after_tenant_check(strategy, ctx, "Status not found"))?;

    resolve_project(strategy, pool, ctx, status.project_id)
        .await
        .map_err(|e| relabel_not_found(e, "Status not found"))?;

    Ok(status)
}

fn not_found_after_tenant_check(
    strategy: &dyn AccessStrategy,
    ctx: &AuthContext,
    message: &str,
) -> ServiceError {
    if strategy.mode() == AccessMode::Organization {
        if let Err(e) = ctx.require_organization() {
            return e;
        }
    }
    ServiceError::not_found(message)
}

fn relabel_not_found(err: ServiceError, message: &str) -> ServiceError {
    match err {
        ServiceError::NotFound(_) => ServiceError::not_found(message),
        other => other,
    }
}
