/// Organization management
///
/// Membership operations act on the organization asserted by the request's
/// tenant context, which the middleware has already verified.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::error::ServiceError;
use crate::auth::middleware::AuthContext;
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::organization_member::{MemberProfile, OrganizationMember};
use crate::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
}

/// Creates an organization owned by the principal, who also becomes a member
///
/// # Errors
///
/// - `Validation` for an empty name
/// - `Conflict` when the name is taken
pub async fn create_organization(
    pool: &PgPool,
    ctx: &AuthContext,
    name: &str,
) -> Result<Organization, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("Organization name is required"));
    }

    let mut tx = pool.begin().await?;

    let organization = Organization::create(
        &mut *tx,
        CreateOrganization {
            name: name.to_string(),
            owner_id: ctx.user_id,
        },
    )
    .await?;
    OrganizationMember::create(&mut *tx, organization.id, ctx.user_id).await?;

    tx.commit().await?;

    info!(organization_id = %organization.id, owner_id = %ctx.user_id, "Organization created");
    Ok(organization)
}

/// Organizations the principal belongs to
pub async fn list_organizations(pool: &PgPool, ctx: &AuthContext) -> Result<Vec<Organization>, ServiceError> {
    Ok(Organization::list_by_member(pool, ctx.user_id).await?)
}

/// Adds a registered user to the asserted organization
///
/// # Errors
///
/// - `Validation` without a tenant context
/// - `NotFound` for an unknown email
/// - `Conflict` when the user is already a member
pub async fn invite_member(pool: &PgPool, ctx: &AuthContext, email: &str) -> Result<Invitation, ServiceError> {
    let organization_id = ctx.require_organization()?;

    let user = User::find_by_email(pool, email)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))?;

    if OrganizationMember::exists(pool, organization_id, user.id).await? {
        return Err(ServiceError::conflict("User is already a member of this organization"));
    }

    OrganizationMember::create(pool, organization_id, user.id).await?;

    info!(
        organization_id = %organization_id,
        user_id = %user.id,
        invited_by = %ctx.user_id,
        "Organization member added"
    );

    Ok(Invitation {
        organization_id,
        user_id: user.id,
        email: user.email,
    })
}

/// Members of the asserted organization
pub async fn list_members(pool: &PgPool, ctx: &AuthContext) -> Result<Vec<MemberProfile>, ServiceError> {
    let organization_id = ctx.require_organization()?;
    Ok(OrganizationMember::list_profiles(pool, organization_id).await?)
}
