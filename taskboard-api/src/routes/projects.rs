/// Project endpoints
///
/// Visibility follows the deployment's access strategy; invisible projects
/// answer `404` exactly like missing ones.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::auth::middleware::AuthContext;
use taskboard_shared::models::organization_member::MemberProfile;
use taskboard_shared::models::project::{Project, UpdateProject};
use taskboard_shared::models::project_member::ProjectMember;
use taskboard_shared::services::projects::{self, DeleteSummary, NewProject};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Creates a project in the asserted organization and seeds its workflow
pub async fn create_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    req.validate()?;

    let project = projects::create_project(
        &state.db,
        &ctx,
        NewProject {
            name: req.name,
            description: req.description,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(projects::list_projects(&state.db, state.access(), &ctx).await?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    Ok(Json(projects::get_project(&state.db, state.access(), &ctx, id).await?))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let project = projects::update_project(
        &state.db,
        state.access(),
        &ctx,
        id,
        UpdateProject {
            name: req.name,
            description: req.description,
        },
    )
    .await?;

    Ok(Json(project))
}

/// Deletes a project with its tasks, assignments, statuses and members
///
/// Responds with the number of rows removed per dependent table.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteSummary>> {
    Ok(Json(projects::delete_project(&state.db, state.access(), &ctx, id).await?))
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberProfile>>> {
    Ok(Json(
        projects::list_project_members(&state.db, state.access(), &ctx, id).await?,
    ))
}

pub async fn invite_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<ProjectMember>)> {
    req.validate()?;
    let member = projects::invite_project_member(&state.db, state.access(), &ctx, id, &req.email).await?;
    Ok((StatusCode::CREATED, Json(member)))
}
