/// Account registration and sessions
///
/// Sign-up optionally creates an organization owned by the new user. Log-in
/// answers the same `InvalidCredentials` error for an unknown email and for a
/// wrong password.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use validator::ValidateEmail;

use super::error::ServiceError;
use crate::auth::jwt::{issue_token_pair, refresh_access_token, TokenPair};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::models::organization::{CreateOrganization, Organization};
use crate::models::organization_member::OrganizationMember;
use crate::models::user::{normalize_email, CreateUser, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub organization_name: Option<String>,
}

/// A freshly registered user and the organization created alongside, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user: User,
    pub organization: Option<Organization>,
    pub tokens: TokenPair,
}

/// A logged-in user and their session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub tokens: TokenPair,
}

/// Normalizes an email and checks it with the same rules as request DTOs
pub fn validate_email(email: &str) -> Result<String, ServiceError> {
    let email = normalize_email(email);
    if !email.validate_email() {
        return Err(ServiceError::validation("Invalid email format"));
    }
    Ok(email)
}

/// Registers a user, optionally with an organization they own
///
/// User, organization and owner membership commit together.
///
/// # Errors
///
/// - `Validation` for a malformed email or weak password
/// - `Conflict` when the email or organization name is taken
pub async fn sign_up(
    pool: &PgPool,
    jwt_secret: &str,
    access_ttl: Duration,
    input: SignUp,
) -> Result<Account, ServiceError> {
    let email = validate_email(&input.email)?;
    validate_password_strength(&input.password).map_err(ServiceError::Validation)?;

    let organization_name = input
        .organization_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let password_hash = hash_password(&input.password)?;

    let mut tx = pool.begin().await?;

    let user = User::create(&mut *tx, CreateUser { email, password_hash }).await?;

    let organization = match organization_name {
        Some(name) => {
            let organization = Organization::create(
                &mut *tx,
                CreateOrganization {
                    name,
                    owner_id: user.id,
                },
            )
            .await?;
            OrganizationMember::create(&mut *tx, organization.id, user.id).await?;
            Some(organization)
        }
        None => None,
    };

    tx.commit().await?;

    info!(
        user_id = %user.id,
        organization_id = ?organization.as_ref().map(|o| o.id),
        "User signed up"
    );

    let tokens = issue_token_pair(user.id, jwt_secret, access_ttl)?;

    Ok(Account {
        user,
        organization,
        tokens,
    })
}

/// Checks credentials and issues a token pair
pub async fn log_in(
    pool: &PgPool,
    jwt_secret: &str,
    access_ttl: Duration,
    email: &str,
    password: &str,
) -> Result<Session, ServiceError> {
    let Some(user) = User::find_by_email(pool, email).await? else {
        warn!("Login attempt for unknown email");
        return Err(ServiceError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "Login attempt with wrong password");
        return Err(ServiceError::InvalidCredentials);
    }

    User::update_last_login(pool, user.id).await?;
    let tokens = issue_token_pair(user.id, jwt_secret, access_ttl)?;

    info!(user_id = %user.id, "User logged in");
    Ok(Session { user, tokens })
}

/// Exchanges a refresh token for a new access token
pub fn refresh(refresh_token: &str, jwt_secret: &str, access_ttl: Duration) -> Result<String, ServiceError> {
    Ok(refresh_access_token(refresh_token, jwt_secret, access_ttl)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims, TokenType};
    use crate::services::error::ErrorKind;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" Ann@Example.COM ").unwrap(), "ann@example.com");

        // single-label domains pass, as they do for `#[validate(email)]`
        assert_eq!(validate_email("ann@localhost").unwrap(), "ann@localhost");

        for bad in [
            "",
            "ann",
            "@example.com",
            "ann@",
            "ann@@example.com",
            "a nn@example.com",
            "a@b..com",
            "a@-b.com",
        ] {
            assert_eq!(
                validate_email(bad).unwrap_err().kind(),
                ErrorKind::Validation,
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_refresh_accepts_refresh_token_only() {
        let user_id = Uuid::new_v4();

        let refresh_token = create_token(&Claims::new(user_id, TokenType::Refresh), SECRET).unwrap();
        assert!(refresh(&refresh_token, SECRET, Duration::hours(1)).is_ok());

        let access_token = create_token(&Claims::new(user_id, TokenType::Access), SECRET).unwrap();
        let err = refresh(&access_token, SECRET, Duration::hours(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
