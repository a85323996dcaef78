//! Authentication endpoints
//!
//! # Endpoints
//!
//! - `POST /v1/auth/login` - Login and get tokens
//! - `POST /v1/auth/refresh` - Refresh access token
//! - `POST /v1/auth/forgot-password` - Request a password-reset link
//! - `POST /v1/auth/reset-password` - Redeem a reset token
//!
//! There is no self-service registration: consigner accounts are created
//! by administrators, which is also where the welcome email comes from.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{validate_payload, MessageResponse},
};
use axum::{extract::State, Json};
use partledger_shared::auth::{
    jwt::{self, Claims, TokenType},
    password,
};
use partledger_shared::mailer::password_reset_message;
use partledger_shared::models::user::User;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address (compared case-insensitively)
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// User ID
    pub user_id: i64,

    /// Display name
    pub name: String,

    /// Whether the user is an administrator
    pub is_admin: bool,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Forgot-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Reset-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    /// Reset token from the emailed link
    pub token: String,

    /// New password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login endpoint
///
/// Authenticates a user and returns JWT tokens.
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    validate_payload(&req)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let access_claims = Claims::new(user.id, user.is_admin, TokenType::Access);
    let refresh_claims = Claims::new(user.id, user.is_admin, TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        name: user.name,
        is_admin: user.is_admin,
        access_token,
        refresh_token,
    }))
}

/// Refresh endpoint
///
/// Exchanges a valid refresh token for a new access token.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let access_claims = Claims::new(claims.sub, claims.admin, TokenType::Access);
    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Forgot-password endpoint
///
/// When the address matches an account, emails a single-use reset link
/// (best-effort, after responding). The response is identical either way
/// so the endpoint does not reveal which emails have accounts.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    validate_payload(&req)?;

    if let Some(user) = User::find_by_email(&state.db, &req.email).await? {
        let claims = Claims::new(user.id, user.is_admin, TokenType::Reset);
        let token = jwt::create_token(&claims, state.jwt_secret())?;
        let reset_url = format!("{}/reset-password/{}", state.config.shop.base_url, token);

        let (subject, body) = password_reset_message(&state.config.shop.name, &reset_url);
        let mailer = state.mailer.clone();
        tokio::spawn(async move {
            mailer.send_best_effort(&user.email, &subject, body).await;
        });
    }

    Ok(Json(MessageResponse {
        message: "If the address matches an account, a reset link has been sent.".to_string(),
    }))
}

/// Reset-password endpoint
///
/// Redeems a reset token and replaces the account password.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid, expired, or wrong-type token
/// - `422 Unprocessable Entity`: Password too short
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    validate_payload(&req)?;

    let claims = jwt::validate_reset_token(&req.token, state.jwt_secret())
        .map_err(|_| ApiError::Unauthorized("Invalid or expired reset link".to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired reset link".to_string()))?;

    let password_hash = password::hash_password(&req.password)?;
    User::set_password(&state.db, user.id, &password_hash).await?;

    Ok(Json(MessageResponse {
        message: "Password has been updated. You may now log in.".to_string(),
    }))
}
