/// Request authentication building blocks for Axum middleware
///
/// Two steps run in order on every protected route:
///
/// 1. [`authenticate`] validates the `Authorization: Bearer` access token and
///    yields an [`AuthContext`] for the principal.
/// 2. [`resolve_tenant`] reads the optional `X-Organization-ID` header. When
///    present, the principal must be a member of that organization, otherwise
///    the request is rejected before any handler runs.
///
/// The API crate wraps these in `from_fn_with_state` layers and inserts the
/// resulting context into request extensions.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use taskboard_shared::auth::jwt::{create_token, Claims, TokenType};
/// use taskboard_shared::auth::middleware::authenticate;
/// use uuid::Uuid;
///
/// let secret = "a-secret-key-that-is-at-least-32-bytes";
/// let user_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(user_id, TokenType::Access), secret).unwrap();
///
/// let mut headers = HeaderMap::new();
/// headers.insert(
///     header::AUTHORIZATION,
///     HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
/// );
///
/// let ctx = authenticate(&headers, secret).unwrap();
/// assert_eq!(ctx.user_id, user_id);
/// assert!(ctx.organization_id.is_none());
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};
use crate::models::organization_member::OrganizationMember;
use crate::services::error::{ErrorKind, ServiceError};

/// Header a request uses to assert its tenant context
pub const TENANT_HEADER: &str = "X-Organization-ID";

/// Authenticated principal plus the verified tenant context
///
/// `organization_id` is only ever `Some` after [`resolve_tenant`] has
/// confirmed the principal's membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub organization_id: Option<Uuid>,
}

impl AuthContext {
    /// Creates a context with no tenant asserted
    pub fn from_jwt(user_id: Uuid) -> Self {
        Self {
            user_id,
            organization_id: None,
        }
    }

    pub fn with_organization(mut self, organization_id: Uuid) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    /// Returns the asserted organization, or a validation error naming the
    /// missing header
    pub fn require_organization(&self) -> Result<Uuid, ServiceError> {
        self.organization_id
            .ok_or_else(|| ServiceError::validation(format!("{} header is required", TENANT_HEADER)))
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),

    /// Tenant header present but not a UUID
    #[error("{0}")]
    InvalidTenant(String),

    /// Principal is not a member of the asserted organization
    #[error("Not a member of organization {0}")]
    NotMember(Uuid),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingCredentials | AuthError::InvalidFormat(_) | AuthError::InvalidToken(_) => {
                ErrorKind::Unauthorized
            }
            AuthError::InvalidTenant(_) => ErrorKind::Validation,
            AuthError::NotMember(_) => ErrorKind::Forbidden,
            AuthError::DatabaseError(_) => ErrorKind::DependencyFailure,
        }
    }
}

/// Extracts the raw token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Validates the bearer access token and builds the principal's context
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
    })?;

    Ok(AuthContext::from_jwt(claims.sub))
}

/// Parses the tenant header
///
/// Absent or blank means no tenant asserted. Anything else must be a UUID.
pub fn parse_tenant_header(headers: &HeaderMap) -> Result<Option<Uuid>, AuthError> {
    let Some(raw) = headers.get(TENANT_HEADER) else {
        return Ok(None);
    };

    let value = raw
        .to_str()
        .map_err(|_| AuthError::InvalidTenant(format!("{} header is not valid text", TENANT_HEADER)))?
        .trim();

    if value.is_empty() {
        return Ok(None);
    }

    Uuid::parse_str(value)
        .map(Some)
        .map_err(|_| AuthError::InvalidTenant(format!("{} header must be a UUID", TENANT_HEADER)))
}

/// Verifies the asserted tenant, if any, and attaches it to the context
///
/// # Errors
///
/// - `AuthError::InvalidTenant` for a malformed header
/// - `AuthError::NotMember` when the principal does not belong to the organization
pub async fn resolve_tenant(
    pool: &PgPool,
    ctx: AuthContext,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let Some(organization_id) = parse_tenant_header(headers)? else {
        return Ok(ctx);
    };

    if !OrganizationMember::exists(pool, organization_id, ctx.user_id).await? {
        tracing::warn!(
            user_id = %ctx.user_id,
            organization_id = %organization_id,
            "Rejected tenant context for non-member"
        );
        return Err(AuthError::NotMember(organization_id));
    }

    Ok(ctx.with_organization(organization_id))
}
