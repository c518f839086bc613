/// Status ordering engine
///
/// Keeps each project's statuses in a dense `0..N-1` order:
///
/// - create appends at `max + 1` (0 for the first) and never renumbers others
/// - move shifts the statuses between the old and new position by one and
///   drops the moved status at the requested index
/// - delete removes the status and closes the gap
///
/// Index plans are computed by the pure functions [`plan_move`] and
/// [`plan_compaction`]. Every mutation runs in one transaction that first
/// row-locks all statuses of the project (`SELECT ... FOR UPDATE`), so
/// concurrent reorders of one project are serialized and readers never see a
/// half-applied renumbering.

use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::ServiceError;
use crate::auth::access::{resolve_project, resolve_status, AccessStrategy};
use crate::auth::middleware::AuthContext;
use crate::models::status::{slugify, Status, DEFAULT_STATUSES};

/// Requested change to a status; either field may be omitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveStatus {
    /// New position within the project
    pub index: Option<i32>,

    /// New display name (slug is recomputed)
    pub name: Option<String>,
}

/// Computes the index writes for moving one status to `new_index`
///
/// `order` holds `(id, index)` for every status of the project. Only rows
/// whose index changes are returned; moving a status onto its current index
/// returns an empty plan.
///
/// # Errors
///
/// - `NotFound` if `status_id` is not in `order`
/// - `Validation` if `new_index` is outside `0..=N-1`
///
/// # Example
///
/// ```
/// use taskboard_shared::services::statuses::plan_move;
/// use uuid::Uuid;
///
/// let (todo, doing, review, done) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
/// let order = [(todo, 0), (doing, 1), (review, 2), (done, 3)];
///
/// let mut plan = plan_move(&order, review, 0).unwrap();
/// plan.sort_by_key(|(_, index)| *index);
/// assert_eq!(plan, vec![(review, 0), (todo, 1), (doing, 2)]);
/// ```
pub fn plan_move(
    order: &[(Uuid, i32)],
    status_id: Uuid,
    new_index: i32,
) -> Result<Vec<(Uuid, i32)>, ServiceError> {
    let mut sorted = order.to_vec();
    sorted.sort_by_key(|(_, index)| *index);

    let position = sorted
        .iter()
        .position(|(id, _)| *id == status_id)
        .ok_or_else(|| ServiceError::not_found("Status not found"))?;

    let last = sorted.len() as i32 - 1;
    if new_index < 0 || new_index > last {
        return Err(ServiceError::validation(format!(
            "Index {} is out of range, expected 0 to {}",
            new_index, last
        )));
    }

    let moved = sorted.remove(position);
    sorted.insert(new_index as usize, moved);

    Ok(diff_positions(order, &sorted))
}

/// Computes the index writes that renumber `order` to a dense `0..N-1`
/// sequence, keeping relative order
pub fn plan_compaction(order: &[(Uuid, i32)]) -> Vec<(Uuid, i32)> {
    let mut sorted = order.to_vec();
    sorted.sort_by_key(|(_, index)| *index);

    diff_positions(order, &sorted)
}

/// Pairs each id in `arranged` with its position, keeping only changed rows
fn diff_positions(original: &[(Uuid, i32)], arranged: &[(Uuid, i32)]) -> Vec<(Uuid, i32)> {
    arranged
        .iter()
        .enumerate()
        .filter_map(|(position, (id, _))| {
            let target = position as i32;
            let current = original.iter().find(|(oid, _)| oid == id).map(|(_, i)| *i);
            (current != Some(target)).then_some((*id, target))
        })
        .collect()
}

fn validate_name(name: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() || slugify(name).is_empty() {
        return Err(ServiceError::validation("Status name is required"));
    }
    Ok(name.to_string())
}

fn index_pairs(statuses: &[Status]) -> Vec<(Uuid, i32)> {
    statuses.iter().map(|s| (s.id, s.index)).collect()
}

/// Inserts the default workflow for a freshly created project
///
/// Runs on the caller's connection so it joins the project-creation
/// transaction.
pub async fn seed_default_statuses(
    conn: &mut PgConnection,
    project_id: Uuid,
) -> Result<Vec<Status>, sqlx::Error> {
    let mut seeded = Vec::with_capacity(DEFAULT_STATUSES.len());

    for (index, name) in DEFAULT_STATUSES.iter().enumerate() {
        seeded.push(Status::create(&mut *conn, project_id, name, index as i32).await?);
    }

    Ok(seeded)
}

/// Lists a visible project's statuses in display order
pub async fn list_statuses(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    project_id: Uuid,
) -> Result<Vec<Status>, ServiceError> {
    let project = resolve_project(access, pool, ctx, project_id).await?;
    Ok(Status::list_by_project(pool, project.id).await?)
}

/// Appends a status at the end of the project's order
///
/// # Errors
///
/// - `Validation` for an empty name
/// - `Conflict` when another status of the project has the same slug
pub async fn create_status(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    project_id: Uuid,
    name: &str,
) -> Result<Status, ServiceError> {
    let name = validate_name(name)?;
    let project = resolve_project(access, pool, ctx, project_id).await?;

    let mut tx = pool.begin().await?;

    let existing = Status::lock_by_project(&mut tx, project.id).await?;
    let index = existing.iter().map(|s| s.index + 1).max().unwrap_or(0);

    let status = Status::create(&mut *tx, project.id, &name, index).await?;
    tx.commit().await?;

    info!(
        project_id = %project.id,
        status_id = %status.id,
        index = status.index,
        "Status created"
    );

    Ok(status)
}

/// Moves and/or renames a status
///
/// # Errors
///
/// - `NotFound` for an unknown or invisible status
/// - `Validation` when neither field is given, the name is empty, or the
///   index is out of range
/// - `Conflict` when the new name collides with another status's slug
pub async fn move_status(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    status_id: Uuid,
    change: MoveStatus,
) -> Result<Status, ServiceError> {
    if change.index.is_none() && change.name.is_none() {
        return Err(ServiceError::validation("Provide an index or a name to update"));
    }
    let new_name = change.name.as_deref().map(validate_name).transpose()?;

    let status = resolve_status(access, pool, ctx, status_id).await?;

    let mut tx = pool.begin().await?;

    let locked = Status::lock_by_project(&mut tx, status.project_id).await?;

    if let Some(new_index) = change.index {
        let plan = plan_move(&index_pairs(&locked), status.id, new_index)?;
        let written = Status::apply_indices(&mut *tx, &plan).await?;
        debug!(status_id = %status.id, new_index, rows = written, "Applied status reorder");
    } else if !locked.iter().any(|s| s.id == status.id) {
        return Err(ServiceError::not_found("Status not found"));
    }

    if let Some(name) = &new_name {
        Status::rename(&mut *tx, status.id, name).await?;
    }

    let updated = Status::find_by_id(&mut *tx, status.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Status not found"))?;

    tx.commit().await?;

    info!(
        project_id = %updated.project_id,
        status_id = %updated.id,
        index = updated.index,
        "Status updated"
    );

    Ok(updated)
}

/// Deletes a status and closes the gap it leaves
///
/// # Errors
///
/// - `NotFound` for an unknown or invisible status
/// - `Conflict` while tasks still sit in the status
pub async fn delete_status(
    pool: &PgPool,
    access: &dyn AccessStrategy,
    ctx: &AuthContext,
    status_id: Uuid,
) -> Result<(), ServiceError> {
    let status = resolve_status(access, pool, ctx, status_id).await?;

    let mut tx = pool.begin().await?;

    let locked = Status::lock_by_project(&mut tx, status.project_id).await?;
    if !locked.iter().any(|s| s.id == status.id) {
        return Err(ServiceError::not_found("Status not found"));
    }

    let in_use = Status::task_count(&mut *tx, status.id).await?;
    if in_use > 0 {
        return Err(ServiceError::conflict(format!(
            "Status is still used by {} task(s)",
            in_use
        )));
    }

    Status::delete(&mut *tx, status.id).await?;

    let remaining: Vec<(Uuid, i32)> = locked
        .iter()
        .filter(|s| s.id != status.id)
        .map(|s| (s.id, s.index))
        .collect();
    Status::apply_indices(&mut *tx, &plan_compaction(&remaining)).await?;

    tx.commit().await?;

    info!(project_id = %status.project_id, status_id = %status.id, "Status deleted");
    Ok(())
}
