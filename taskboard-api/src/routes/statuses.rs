/// Status endpoints
///
/// `PATCH /v1/statuses/:id` moves and/or renames a status. Moving shifts the
/// statuses in between by one so a project's indices stay `0..N-1`.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::auth::middleware::AuthContext;
use taskboard_shared::models::status::Status;
use taskboard_shared::services::statuses::{self, MoveStatus};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStatusRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    /// Bounds are checked against the project's status count by the service
    pub index: Option<i32>,

    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: Option<String>,
}

pub async fn list_statuses(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Status>>> {
    Ok(Json(
        statuses::list_statuses(&state.db, state.access(), &ctx, project_id).await?,
    ))
}

/// Appends a status at the end of the project's order
pub async fn create_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateStatusRequest>,
) -> ApiResult<(StatusCode, Json<Status>)> {
    req.validate()?;
    let status = statuses::create_status(&state.db, state.access(), &ctx, project_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

/// Moves and/or renames a status
///
/// # Errors
///
/// - `400`: index past the last position, or neither field given
/// - `409`: new name collides with another status of the project
pub async fn update_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Status>> {
    req.validate()?;

    let status = statuses::move_status(
        &state.db,
        state.access(),
        &ctx,
        id,
        MoveStatus {
            index: req.index,
            name: req.name,
        },
    )
    .await?;

    Ok(Json(status))
}

/// Deletes an unused status
///
/// # Errors
///
/// - `409`: tasks still sit in the status
pub async fn delete_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    statuses::delete_status(&state.db, state.access(), &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_bounds_left_to_the_service() {
        let req: UpdateStatusRequest = serde_json::from_str(r#"{"index": -1}"#).unwrap();
        assert!(req.validate().is_ok());

        let req: UpdateStatusRequest = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
