/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Register a user, optionally with an organization
/// - `POST /v1/auth/login` - Exchange credentials for tokens
/// - `POST /v1/auth/refresh` - Exchange a refresh token for a new access token

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::auth::jwt::TokenPair;
use taskboard_shared::models::organization::Organization;
use taskboard_shared::models::user::User;
use taskboard_shared::services::accounts::{self, SignUp};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Strength (letter + digit) is checked by the account service
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Creates an organization owned by the new user when non-blank
    #[validate(length(max = 100, message = "Organization name must be at most 100 characters"))]
    pub organization_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: User,
    pub organization: Option<Organization>,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Registers a user
///
/// ```text
/// POST /v1/auth/signup
///
/// { "email": "ann@example.com", "password": "hunter22x", "organization_name": "Acme" }
/// ```
///
/// # Errors
///
/// - `422`: field validation failed
/// - `400`: password too weak
/// - `409`: email or organization name taken
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    req.validate()?;

    let account = accounts::sign_up(
        &state.db,
        state.jwt_secret(),
        state.config.access_ttl(),
        SignUp {
            email: req.email,
            password: req.password,
            organization_name: req.organization_name,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: account.user,
            organization: account.organization,
            tokens: account.tokens,
        }),
    ))
}

/// Logs in
///
/// # Errors
///
/// - `401`: unknown email or wrong password (same message for both)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let session = accounts::log_in(
        &state.db,
        state.jwt_secret(),
        state.config.access_ttl(),
        &req.email,
        &req.password,
    )
    .await?;

    Ok(Json(LoginResponse {
        user: session.user,
        tokens: session.tokens,
    }))
}

/// Exchanges a refresh token for a new access token
///
/// # Errors
///
/// - `401`: invalid, expired, or non-refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_ttl = state.config.access_ttl();
    let access_token = accounts::refresh(&req.refresh_token, state.jwt_secret(), access_ttl)?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer",
        expires_in: access_ttl.num_seconds(),
    }))
}
