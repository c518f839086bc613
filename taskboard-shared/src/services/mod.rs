/// Business operations
///
/// Each operation takes the pool, and where visibility matters the active
/// [`AccessStrategy`](crate::auth::access::AccessStrategy) and the caller's
/// [`AuthContext`](crate::auth::middleware::AuthContext). Failures are
/// reported as [`ServiceError`], which carries an [`ErrorKind`] the HTTP
/// layer maps to a status code.

pub mod accounts;
pub mod assignments;
pub mod error;
pub mod organizations;
pub mod projects;
pub mod statuses;
pub mod tasks;

pub use error::{DeleteStage, ErrorKind, ServiceError};
