//! First-run admin provisioning.
//!
//! Users are created by an admin, so a fresh database needs one admin
//! account to start from. When `BOOTSTRAP_ADMIN_EMAIL` and
//! `BOOTSTRAP_ADMIN_PASSWORD` are set, the binary creates that admin on
//! startup unless a user with the email already exists.

use ptw_core::error::CoreError;
use ptw_core::roles::USER_TYPE_ADMIN;
use ptw_db::models::user::CreateUser;
use ptw_db::repositories::UserRepo;
use ptw_db::DbPool;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};

/// Admin account requested through the environment.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

impl BootstrapAdmin {
    /// Read the bootstrap admin from environment variables.
    ///
    /// | Env Var                    | Required | Default         |
    /// |----------------------------|----------|-----------------|
    /// | `BOOTSTRAP_ADMIN_EMAIL`    | yes      | --              |
    /// | `BOOTSTRAP_ADMIN_PASSWORD` | yes      | --              |
    /// | `BOOTSTRAP_ADMIN_USER_ID`  | no       | `ADM001`        |
    /// | `BOOTSTRAP_ADMIN_NAME`     | no       | `Administrator` |
    ///
    /// Returns `None` unless both required variables are set.
    pub fn from_env() -> Option<Self> {
        let email = std::env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?;
        let password = std::env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?;
        Some(Self {
            user_id: std::env::var("BOOTSTRAP_ADMIN_USER_ID").unwrap_or_else(|_| "ADM001".into()),
            name: std::env::var("BOOTSTRAP_ADMIN_NAME")
                .unwrap_or_else(|_| "Administrator".into()),
            email,
            password,
        })
    }
}

/// Create the admin unless its email is already registered.
///
/// Returns `true` if a user was created.
pub async fn ensure_admin(pool: &DbPool, admin: &BootstrapAdmin) -> AppResult<bool> {
    if UserRepo::find_by_email(pool, &admin.email).await?.is_some() {
        tracing::debug!(email = %admin.email, "Bootstrap admin already present");
        return Ok(false);
    }

    validate_password_strength(&admin.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    let password_hash = hash_password(&admin.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            user_id: admin.user_id.clone(),
            name: admin.name.clone(),
            email: admin.email.clone(),
            password_hash,
            user_type: USER_TYPE_ADMIN.to_string(),
            domain: None,
            contact: None,
            location: None,
            city: None,
            state: None,
        },
    )
    .await?;

    tracing::info!(user_id = %user.user_id, email = %user.email, "Bootstrap admin created");
    Ok(true)
}
