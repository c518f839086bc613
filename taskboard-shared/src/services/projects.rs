/// Project lifecycle
///
/// Creation seeds the default workflow and records the creator as a member.
/// Deletion cascades through assignments, tasks, statuses and members inside
/// one transaction; a failure at any stage rolls everything back and is
/// reported as [`ServiceError::CascadeFailed`] naming the stage.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::error::{DeleteStage, ServiceError};
use super::statuses::seed_default_statuses;
use crate::auth::access::{resolve_project, AccessStrategy};
use crate::auth::middleware::AuthContext;
use crate::models::organization_member::MemberProfile;
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::project_member::ProjectMember;
use crate::models::status::Status;
use crate::models::task::Task;
use crate::models::task_assignee::TaskAssignee;
use crate::models::user::User;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Rows removed by [`delete_project`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    pub assignments: u64,
    pub tasks: u64,
    pub statuses: u64,
    pub members: u64,
}

fn validate_name(name: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("Project name is required"));
    }
    Ok(name.to_string())
}

/// Creates a project in the asserted organization
///
/// The project row, the creator's membership and the seeded statuses commit
/// together.
///
/// # Errors
///
/// `Validation` without a tenant context or with an empty name.
pub async fn create_project(
    pool: &PgPool,
    ctx: &AuthContext,
    input: NewProject,
) -> Result<Project, ServiceError> {
    let organization_id = ctx.require_organization()?;
    let name = validate_name(&input.name)?;

    let mut tx = pool.begin().await?;

    let project = Project::create(
        &mut *tx,
        CreateProject {
            organization_id,
            name,
            description: input.description.unwrap_or_default(),
        },
    )
    .await?;

    ProjectMember::create(&mut *tx, project.id, ctx.user_id).await?;
    let statuses = seed_default_statuses(&mut tx, project.id).await?;

    tx.commit().await?;

    info!(
        organization_id = %organization_id,
        project_id = %project.id,
        statuses = statuses.len(),
        "Project created"
    );

    Ok(project)
}

pub async fn get_project(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    project_id: Uuid,
) -> Result<Project, ServiceError> {
    resolve_project(access, pool, ctx, project_id).await
}

/// Lists every project the principal may see under the active strategy
pub async fn list_projects(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
) -> Result<Vec<Project>, ServiceError> {
    access.visible_projects(pool, ctx).await
}

/// Renames and/or re-describes a project
pub async fn update_project(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    project_id: Uuid,
    patch: UpdateProject,
) -> Result<Project, ServiceError> {
    let project = resolve_project(access, pool, ctx, project_id).await?;

    let patch = UpdateProject {
        name: patch.name.as_deref().map(validate_name).transpose()?,
        description: patch.description,
    };
    if patch.is_empty() {
        return Ok(project);
    }

    let updated = Project::update(pool, project.id, patch)
        .await?
        .ok_or_else(|| ServiceError::not_found("Project not found"))?;

    info!(project_id = %updated.id, "Project updated");
    Ok(updated)
}

/// Deletes a project and everything it owns
///
/// # Errors
///
/// - `NotFound` when the project is missing or invisible
/// - `CascadeFailed` naming the stage whose statement failed
pub async fn delete_project(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    project_id: Uuid,
) -> Result<DeleteSummary, ServiceError> {
    let project = resolve_project(access, pool, ctx, project_id).await?;

    let mut tx = pool.begin().await?;

    let assignments = TaskAssignee::delete_by_project(&mut *tx, project.id)
        .await
        .map_err(ServiceError::cascade(DeleteStage::ClearAssignees))?;
    let tasks = Task::delete_by_project(&mut *tx, project.id)
        .await
        .map_err(ServiceError::cascade(DeleteStage::DeleteTasks))?;
    let statuses = Status::delete_by_project(&mut *tx, project.id)
        .await
        .map_err(ServiceError::cascade(DeleteStage::DeleteStatuses))?;
    let members = ProjectMember::delete_by_project(&mut *tx, project.id)
        .await
        .map_err(ServiceError::cascade(DeleteStage::ClearMembers))?;
    let deleted = Project::delete(&mut *tx, project.id)
        .await
        .map_err(ServiceError::cascade(DeleteStage::DeleteProject))?;

    if !deleted {
        return Err(ServiceError::not_found("Project not found"));
    }

    tx.commit().await?;

    let summary = DeleteSummary {
        assignments,
        tasks,
        statuses,
        members,
    };

    info!(
        project_id = %project.id,
        assignments = summary.assignments,
        tasks = summary.tasks,
        statuses = summary.statuses,
        members = summary.members,
        "Project deleted"
    );

    Ok(summary)
}

/// Adds a registered user to a visible project by email
///
/// # Errors
///
/// - `NotFound` for an unknown email
/// - `Conflict` when the user is already a member
pub async fn invite_project_member(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    project_id: Uuid,
    email: &str,
) -> Result<ProjectMember, ServiceError> {
    let project = resolve_project(access, pool, ctx, project_id).await?;

    let user = User::find_by_email(pool, email)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))?;

    if ProjectMember::exists(pool, project.id, user.id).await? {
        return Err(ServiceError::conflict("User is already a member of this project"));
    }

    let member = ProjectMember::create(pool, project.id, user.id).await?;
    info!(project_id = %project.id, user_id = %user.id, "Project member added");

    Ok(member)
}

pub async fn list_project_members(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    project_id: Uuid,
) -> Result<Vec<MemberProfile>, ServiceError> {
    let project = resolve_project(access, pool, ctx, project_id).await?;
    Ok(ProjectMember::list_profiles(pool, project.id).await?)
}
