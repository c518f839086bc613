/// Task assignment engine
///
/// Three ways to change who works on a task, with deliberately different
/// duplicate handling:
///
/// - [`assign_by_identity`]: additive. Resolves emails/user ids, adds the
///   resolved users, ignores pairs that already exist, and reports the
///   identities it could not resolve. Partial resolution is a success.
/// - [`replace_assignments`]: replace-by-set. `None` leaves assignments
///   untouched; `Some(ids)` clears and re-adds the ids that resolve to users.
///   Unknown ids are dropped silently.
/// - [`self_assign`]: the caller takes the task. Fails with `Conflict` when
///   the caller is already assigned.
///
/// These functions work on task ids and do no access checks; the task
/// service resolves visibility first.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::ServiceError;
use crate::models::task_assignee::TaskAssignee;
use crate::models::user::{normalize_email, User};

/// A way of naming a user in an assignment request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Email(String),
    UserId(Uuid),
}

impl Identity {
    /// Reads a raw identity: a UUID string is a user id, anything else an email
    ///
    /// ```
    /// use taskboard_shared::services::assignments::Identity;
    /// use uuid::Uuid;
    ///
    /// let id = Uuid::new_v4();
    /// assert_eq!(Identity::parse(&id.to_string()), Identity::UserId(id));
    /// assert_eq!(Identity::parse(" Ann@Example.com"), Identity::Email("ann@example.com".into()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw.trim()) {
            Ok(id) => Identity::UserId(id),
            Err(_) => Identity::Email(normalize_email(raw)),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Email(email) => f.write_str(email),
            Identity::UserId(id) => write!(f, "{}", id),
        }
    }
}

/// Outcome of an additive assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentReport {
    /// Number of requested identities that resolved to a user
    pub assigned_count: usize,

    /// Resolved users, in request order
    pub assigned_users: Vec<Uuid>,

    /// Identities that matched no user, in request order
    pub missing_identities: Vec<String>,
}

impl AssignmentReport {
    pub fn is_partial(&self) -> bool {
        !self.missing_identities.is_empty()
    }
}

/// Collapses duplicate identities, keeping first occurrence order
fn dedup_identities(identities: &[Identity]) -> Vec<Identity> {
    let mut seen = HashSet::new();
    identities
        .iter()
        .filter(|identity| seen.insert((*identity).clone()))
        .cloned()
        .collect()
}

/// Splits requested identities into resolved user ids and unresolved identities
///
/// A user named twice (e.g. by email and by id) is only resolved once.
pub fn partition_identities(requested: &[Identity], users: &[User]) -> (Vec<Uuid>, Vec<Identity>) {
    let mut resolved = Vec::new();
    let mut missing = Vec::new();
    let mut seen = HashSet::new();

    for identity in requested {
        let user = users.iter().find(|u| match identity {
            Identity::Email(email) => normalize_email(&u.email) == *email,
            Identity::UserId(id) => u.id == *id,
        });

        match user {
            Some(user) => {
                if seen.insert(user.id) {
                    resolved.push(user.id);
                }
            }
            None => missing.push(identity.clone()),
        }
    }

    (resolved, missing)
}

/// Adds users to a task by email or id
///
/// # Errors
///
/// `Validation` when no identities are given. Unresolvable identities are not
/// an error; they come back in the report.
pub async fn assign_by_identity(
    pool: &PgPool,
    task_id: Uuid,
    identities: &[Identity],
) -> Result<AssignmentReport, ServiceError> {
    let requested = dedup_identities(identities);
    if requested.is_empty() {
        return Err(ServiceError::validation("At least one email or user id is required"));
    }

    let emails: Vec<String> = requested
        .iter()
        .filter_map(|i| match i {
            Identity::Email(email) => Some(email.clone()),
            Identity::UserId(_) => None,
        })
        .collect();
    let ids: Vec<Uuid> = requested
        .iter()
        .filter_map(|i| match i {
            Identity::UserId(id) => Some(*id),
            Identity::Email(_) => None,
        })
        .collect();

    let mut users = Vec::new();
    if !emails.is_empty() {
        users.extend(User::find_by_emails(pool, &emails).await?);
    }
    if !ids.is_empty() {
        users.extend(User::find_by_ids(pool, &ids).await?);
    }

    let (resolved, missing) = partition_identities(&requested, &users);
    let inserted = TaskAssignee::insert_many(pool, task_id, &resolved).await?;

    info!(
        task_id = %task_id,
        resolved = resolved.len(),
        inserted,
        missing = missing.len(),
        "Assigned users to task"
    );

    Ok(AssignmentReport {
        assigned_count: resolved.len(),
        assigned_users: resolved,
        missing_identities: missing.iter().map(ToString::to_string).collect(),
    })
}

/// Replaces a task's assignee set on the caller's connection
///
/// Returns the resolved set that was written, or `None` when `user_ids` was
/// absent and nothing was touched.
pub async fn replace_assignments_in(
    conn: &mut PgConnection,
    task_id: Uuid,
    user_ids: Option<&[Uuid]>,
) -> Result<Option<Vec<Uuid>>, sqlx::Error> {
    let Some(user_ids) = user_ids else {
        return Ok(None);
    };

    let mut unique = Vec::new();
    let mut seen = HashSet::new();
    for id in user_ids {
        if seen.insert(*id) {
            unique.push(*id);
        }
    }

    let known: HashSet<Uuid> = if unique.is_empty() {
        HashSet::new()
    } else {
        User::find_by_ids(&mut *conn, &unique)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect()
    };
    let resolved: Vec<Uuid> = unique.into_iter().filter(|id| known.contains(id)).collect();

    let cleared = TaskAssignee::delete_by_task(&mut *conn, task_id).await?;
    TaskAssignee::insert_many(&mut *conn, task_id, &resolved).await?;

    debug!(
        task_id = %task_id,
        cleared,
        assigned = resolved.len(),
        dropped = user_ids.len() - resolved.len(),
        "Replaced task assignees"
    );

    Ok(Some(resolved))
}

/// Replaces a task's assignee set in its own transaction
pub async fn replace_assignments(
    pool: &PgPool,
    task_id: Uuid,
    user_ids: Option<Vec<Uuid>>,
) -> Result<Option<Vec<Uuid>>, ServiceError> {
    let mut tx = pool.begin().await?;
    let replaced = replace_assignments_in(&mut tx, task_id, user_ids.as_deref()).await?;
    tx.commit().await?;

    Ok(replaced)
}

/// Assigns the caller to a task
///
/// # Errors
///
/// `Conflict` when the caller is already assigned.
pub async fn self_assign(pool: &PgPool, task_id: Uuid, user_id: Uuid) -> Result<TaskAssignee, ServiceError> {
    if TaskAssignee::exists(pool, task_id, user_id).await? {
        return Err(ServiceError::conflict("You are already assigned to this task"));
    }

    let assignment = TaskAssignee::create(pool, task_id, user_id).await?;
    info!(task_id = %task_id, user_id = %user_id, "User took task");

    Ok(assignment)
}
