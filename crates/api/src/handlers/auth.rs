//! Handlers for the `/auth` resource (login, password reset).

use axum::extract::State;
use axum::Json;
use ptw_core::error::CoreError;
use ptw_db::models::user::UserProfile;
use ptw_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{generate_access_token, generate_reset_token, validate_reset_token};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::response::MessageResponse;
use crate::state::AppState;

/// Same answer whether or not the email is registered.
const FORGOT_PASSWORD_MESSAGE: &str =
    "If that email is registered, a password reset link has been sent.";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login: the bearer token plus the profile it was issued for.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Request body for `POST /auth/forgot-password`.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for `POST /auth/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid credentials".into()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/login
///
/// Authenticate with email + password. Unknown email and wrong password get
/// the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::debug!(user_id = %user.user_id, "Login rejected: wrong password");
        return Err(invalid_credentials());
    }

    let token = generate_access_token(&user, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = %user.user_id, user_type = %user.user_type, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// POST /api/auth/forgot-password
///
/// Issue a short-lived reset token for a registered email. There is no mail
/// transport; the token is written to the log for the operator to relay.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    match UserRepo::find_by_email(&state.pool, input.email.trim()).await? {
        Some(user) => {
            let token = generate_reset_token(user.id, &state.config.jwt)
                .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
            tracing::info!(
                user_id = %user.user_id,
                reset_token = %token,
                "Password reset token issued"
            );
        }
        None => {
            tracing::debug!("Password reset requested for unknown email");
        }
    }

    Ok(Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)))
}

/// POST /api/auth/reset-password
///
/// Replace the password of the user a reset token was issued for.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let (Some(token), Some(password)) = (input.token, input.password) else {
        return Err(AppError::BadRequest(
            "Token and password are required".into(),
        ));
    };

    let invalid_token = || AppError::BadRequest("Invalid or expired token".into());

    let id = validate_reset_token(&token, &state.config.jwt).ok_or_else(invalid_token)?;

    validate_password_strength(&password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    if !UserRepo::update_password(&state.pool, id, &password_hash).await? {
        return Err(invalid_token());
    }

    tracing::info!(id, "Password reset");
    Ok(Json(MessageResponse::new("Password has been reset")))
}
