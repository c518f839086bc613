/// Task endpoints
///
/// Task responses carry the task fields plus `assignee_ids`.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::auth::middleware::AuthContext;
use taskboard_shared::models::priority::Priority;
use taskboard_shared::services::assignments::{AssignmentReport, Identity};
use taskboard_shared::services::tasks::{self, present_or_null, NewTask, TaskPatch, TaskView};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub project_id: Uuid,

    #[validate(length(min = 1, max = 500, message = "Title must be 1 to 500 characters"))]
    pub title: String,

    pub status_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub assignee_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 500, message = "Title must be 1 to 500 characters"))]
    pub title: Option<String>,

    pub status_id: Option<Uuid>,
    pub priority_id: Option<Uuid>,

    /// `null` clears the date; omit the field to leave it
    #[serde(default, deserialize_with = "present_or_null")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub end_date: Option<Option<DateTime<Utc>>>,

    /// Replaces the whole assignee set when present
    pub assignee_ids: Option<Vec<Uuid>>,
}

/// Body of `POST /v1/tasks/:id/assign_users`
///
/// Each entry is an email or a user id. `emails` is accepted as an alias.
#[derive(Debug, Deserialize, Validate)]
pub struct AssignUsersRequest {
    #[serde(alias = "emails")]
    #[validate(length(min = 1, max = 100, message = "Provide 1 to 100 identities"))]
    pub identities: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AssignUsersResponse {
    #[serde(flatten)]
    pub report: AssignmentReport,
    pub partial: bool,
}

impl From<AssignmentReport> for AssignUsersResponse {
    fn from(report: AssignmentReport) -> Self {
        let partial = report.is_partial();
        Self { report, partial }
    }
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    req.validate()?;

    let task = tasks::create_task(
        &state.db,
        state.access(),
        &ctx,
        NewTask {
            project_id: req.project_id,
            title: req.title,
            status_id: req.status_id,
            priority_id: req.priority_id,
            start_date: req.start_date,
            end_date: req.end_date,
            assignee_ids: req.assignee_ids,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TaskView>>> {
    Ok(Json(tasks::list_tasks(&state.db, state.access(), &ctx, project_id).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    Ok(Json(tasks::get_task(&state.db, state.access(), &ctx, id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskView>> {
    req.validate()?;

    let task = tasks::update_task(
        &state.db,
        state.access(),
        &ctx,
        id,
        TaskPatch {
            title: req.title,
            status_id: req.status_id,
            priority_id: req.priority_id,
            start_date: req.start_date,
            end_date: req.end_date,
            assignee_ids: req.assignee_ids,
        },
    )
    .await?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tasks::delete_task(&state.db, state.access(), &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assigns the caller to the task
///
/// # Errors
///
/// - `409`: the caller is already assigned
pub async fn take_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    Ok(Json(tasks::take_task(&state.db, state.access(), &ctx, id).await?))
}

/// Assigns users by email or id
///
/// Unknown identities do not fail the request; they come back in
/// `missing_identities` with `partial: true`.
pub async fn assign_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignUsersRequest>,
) -> ApiResult<Json<AssignUsersResponse>> {
    req.validate()?;

    let identities: Vec<Identity> = req.identities.iter().map(|raw| Identity::parse(raw)).collect();
    let report = tasks::assign_users(&state.db, state.access(), &ctx, id, &identities).await?;

    Ok(Json(report.into()))
}

pub async fn list_priorities(State(state): State<AppState>) -> ApiResult<Json<Vec<Priority>>> {
    Ok(Json(tasks::list_priorities(&state.db).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_request_accepts_emails_alias() {
        let req: AssignUsersRequest =
            serde_json::from_str(r#"{"emails": ["a@example.com", "b@example.com"]}"#).unwrap();
        assert_eq!(req.identities.len(), 2);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_assign_request_rejects_empty_list() {
        let req: AssignUsersRequest = serde_json::from_str(r#"{"identities": []}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_partial_flag_follows_missing_identities() {
        let response: AssignUsersResponse = AssignmentReport {
            assigned_count: 1,
            assigned_users: vec![Uuid::new_v4()],
            missing_identities: vec!["ghost@example.com".to_string()],
        }
        .into();

        assert!(response.partial);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["assigned_count"], 1);
        assert_eq!(json["missing_identities"][0], "ghost@example.com");
    }

    #[test]
    fn test_create_request_validates_title() {
        let req: CreateTaskRequest = serde_json::from_value(serde_json::json!({
            "project_id": Uuid::new_v4(),
            "title": ""
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
