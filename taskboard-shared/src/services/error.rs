/// Service-layer error type
///
/// Every service operation returns `Result<T, ServiceError>`. Each error
/// carries a coarse [`ErrorKind`] that the transport boundary maps to a status
/// code, plus a human-readable message.

use std::fmt;

use crate::auth::{jwt::JwtError, password::PasswordError};

/// Coarse classification of a service failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input
    Validation,
    /// Entity missing, or invisible under the caller's tenant context
    NotFound,
    /// Principal lacks a required membership
    Forbidden,
    /// Uniqueness violation or already-assigned/already-member condition
    Conflict,
    /// Bad credentials or bad token
    Unauthorized,
    /// Store or collaborator failure opaque to the caller
    DependencyFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::DependencyFailure => "DEPENDENCY_FAILURE",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cleanup stage of a cascading project delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStage {
    ClearAssignees,
    DeleteTasks,
    DeleteStatuses,
    ClearMembers,
    DeleteProject,
}

impl DeleteStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteStage::ClearAssignees => "clear task assignees",
            DeleteStage::DeleteTasks => "delete tasks",
            DeleteStage::DeleteStatuses => "delete statuses",
            DeleteStage::ClearMembers => "clear project members",
            DeleteStage::DeleteProject => "delete project",
        }
    }
}

impl fmt::Display for DeleteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A cascading delete failed part-way; the transaction was rolled back
    #[error("Project delete failed at stage '{stage}': {source}")]
    CascadeFailed {
        stage: DeleteStage,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::InvalidCredentials | ServiceError::Token(_) => ErrorKind::Unauthorized,
            ServiceError::CascadeFailed { .. }
            | ServiceError::Database(_)
            | ServiceError::Password(_) => ErrorKind::DependencyFailure,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ServiceError::Conflict(msg.into())
    }

    /// Wraps a store error raised during one stage of a cascading delete
    pub fn cascade(stage: DeleteStage) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| ServiceError::CascadeFailed { stage, source }
    }
}

/// Human message for a unique constraint, keyed by constraint name
fn conflict_message(constraint: &str) -> String {
    match constraint {
        "users_email_key" => "Email already exists".to_string(),
        "organizations_name_key" => "Organization name already exists".to_string(),
        "organization_members_pkey" => "User is already a member of this organization".to_string(),
        "project_members_pkey" => "User is already a member of this project".to_string(),
        "statuses_project_slug_key" => "A status with this name already exists in the project".to_string(),
        "task_assignees_pkey" => "User is already assigned to this task".to_string(),
        other => format!("Constraint violation: {}", other),
    }
}

/// Unique violations become `Conflict`; everything else is a dependency failure
impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let message = db_err
                    .constraint()
                    .map(conflict_message)
                    .unwrap_or_else(|| "Resource already exists".to_string());
                return ServiceError::Conflict(message);
            }
        }

        ServiceError::Database(err)
    }
}
