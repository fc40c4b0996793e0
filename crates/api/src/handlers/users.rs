//! Handlers for users and the worker roster.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use ptw_core::error::CoreError;
use ptw_core::roles::{is_valid_user_type, VALID_USER_TYPES};
use ptw_db::models::user::{CreateUser, UserProfile, WorkerAvailability};
use ptw_db::repositories::UserRepo;
use serde::Deserialize;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth, RequireSupervisor};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /users`.
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub user_type: Option<String>,
}

/// Request body for `POST /users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub user_type: String,
    pub domain: Option<String>,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

fn check_user_type(user_type: &str) -> Result<(), CoreError> {
    if is_valid_user_type(user_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid user_type '{user_type}'. Must be one of: {}",
            VALID_USER_TYPES.join(", ")
        )))
    }
}

fn require_text(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GET /users
// ---------------------------------------------------------------------------

/// GET /api/users?user_type=
///
/// User profiles, optionally restricted to one type. Supervisor or admin.
pub async fn list_users(
    State(state): State<AppState>,
    RequireSupervisor(_user): RequireSupervisor,
    Query(params): Query<UserListParams>,
) -> AppResult<Json<Vec<UserProfile>>> {
    let user_type = params.user_type.as_deref().filter(|t| !t.is_empty());
    if let Some(user_type) = user_type {
        check_user_type(user_type)?;
    }

    let users = UserRepo::list_profiles(&state.pool, user_type).await?;
    Ok(Json(users))
}

// ---------------------------------------------------------------------------
// POST /users
// ---------------------------------------------------------------------------

/// POST /api/users
///
/// Create a user account. Admin only.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    require_text("user_id", &input.user_id)?;
    require_text("name", &input.name)?;
    require_text("email", &input.email)?;
    check_user_type(&input.user_type)?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            user_id: input.user_id.trim().to_string(),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            password_hash,
            user_type: input.user_type,
            domain: input.domain,
            contact: input.contact,
            location: input.location,
            city: input.city,
            state: input.state,
        },
    )
    .await?;

    tracing::info!(
        user_id = %user.user_id,
        user_type = %user.user_type,
        actor = %admin.user_id,
        "User created"
    );

    Ok((StatusCode::CREATED, Json(user.into())))
}

// ---------------------------------------------------------------------------
// GET /workers
// ---------------------------------------------------------------------------

/// GET /api/workers
///
/// Every worker with derived availability: available iff they hold no task
/// in a busy status.
pub async fn list_workers(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> AppResult<Json<Vec<WorkerAvailability>>> {
    let workers = UserRepo::list_workers(&state.pool).await?;
    Ok(Json(workers))
}
