//! User entity model and DTOs.

use ptw_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserProfile`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub user_type: String,
    pub domain: Option<String>,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub created_at: Timestamp,
}

/// User representation for API responses (no password hash).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProfile {
    pub id: DbId,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub user_type: String,
    pub domain: Option<String>,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub created_at: Timestamp,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            user_type: user.user_type,
            domain: user.domain,
            contact: user.contact,
            location: user.location,
            city: user.city,
            state: user.state,
            created_at: user.created_at,
        }
    }
}

/// A worker profile with derived availability.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkerAvailability {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: UserProfile,
    /// True iff the worker holds no task in a busy status.
    pub is_available: bool,
}

/// DTO for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub user_type: String,
    pub domain: Option<String>,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}
