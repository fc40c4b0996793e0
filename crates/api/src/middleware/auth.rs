//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use ptw_core::error::CoreError;
use ptw_core::roles::{can_supervise, USER_TYPE_WORKER};
use ptw_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// A missing header is 401. A header that is present but malformed, or a
/// token that is invalid or expired, is 403.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub id: DbId,
    /// Business key, recorded as the actor on every write.
    pub user_id: String,
    pub user_type: String,
    pub name: String,
}

impl AuthUser {
    pub fn is_worker(&self) -> bool {
        self.user_type == USER_TYPE_WORKER
    }

    pub fn can_supervise(&self) -> bool {
        can_supervise(&self.user_type)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(AUTHORIZATION).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;

        let invalid = || AppError::Core(CoreError::Forbidden("Invalid or expired token".into()));

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(invalid)?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| invalid())?;

        Ok(AuthUser {
            id: claims.sub,
            user_id: claims.user_id,
            user_type: claims.user_type,
            name: claims.name,
        })
    }
}
