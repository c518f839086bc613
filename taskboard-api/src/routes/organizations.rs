/// Organization endpoints
///
/// `members` and `invite` act on the organization named by the
/// `X-Organization-ID` header.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use taskboard_shared::auth::middleware::AuthContext;
use taskboard_shared::models::organization::Organization;
use taskboard_shared::models::organization_member::MemberProfile;
use taskboard_shared::services::organizations::{self, Invitation};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

pub async fn create_organization(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    req.validate()?;
    let organization = organizations::create_organization(&state.db, &ctx, &req.name).await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

pub async fn list_organizations(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Organization>>> {
    Ok(Json(organizations::list_organizations(&state.db, &ctx).await?))
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<MemberProfile>>> {
    Ok(Json(organizations::list_members(&state.db, &ctx).await?))
}

/// Adds a registered user to the asserted organization
///
/// # Errors
///
/// - `400`: no `X-Organization-ID` header
/// - `404`: no user with that email
/// - `409`: already a member
pub async fn invite_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<InviteRequest>,
) -> ApiResult<(StatusCode, Json<Invitation>)> {
    req.validate()?;
    let invitation = organizations::invite_member(&state.db, &ctx, &req.email).await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}
