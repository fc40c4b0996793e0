//! Repository for the `users` table.

use ptw_core::roles::USER_TYPE_WORKER;
use ptw_core::task_status::BUSY_STATUS_NAMES;
use ptw_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User, UserProfile, WorkerAvailability};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, name, email, password_hash, user_type, domain, contact, \
                       location, city, state, created_at";

/// Columns safe to return to clients.
const PROFILE_COLUMNS: &str = "id, user_id, name, email, user_type, domain, contact, \
                               location, city, state, created_at";

/// Provides lookups and the few writes the service needs for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users
                (user_id, name, email, password_hash, user_type,
                 domain, contact, location, city, state)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.user_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.user_type)
            .bind(&input.domain)
            .bind(&input.contact)
            .bind(&input.location)
            .bind(&input.city)
            .bind(&input.state)
            .fetch_one(pool)
            .await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// List user profiles, optionally restricted to one user type.
    pub async fn list_profiles(
        pool: &PgPool,
        user_type: Option<&str>,
    ) -> Result<Vec<UserProfile>, sqlx::Error> {
        let query = format!(
            "SELECT {PROFILE_COLUMNS} FROM users
             WHERE ($1::TEXT IS NULL OR user_type = $1)
             ORDER BY user_id"
        );
        sqlx::query_as::<_, UserProfile>(&query)
            .bind(user_type)
            .fetch_all(pool)
            .await
    }

    /// List every worker with availability derived from their current tasks.
    ///
    /// A worker is available iff no task of theirs is in a busy status.
    pub async fn list_workers(pool: &PgPool) -> Result<Vec<WorkerAvailability>, sqlx::Error> {
        let query = format!(
            "SELECT {PROFILE_COLUMNS},
                    NOT EXISTS (
                        SELECT 1 FROM tasks
                        WHERE tasks.worker_id = users.user_id
                          AND tasks.status = ANY($1)
                    ) AS is_available
             FROM users
             WHERE user_type = $2
             ORDER BY user_id"
        );
        sqlx::query_as::<_, WorkerAvailability>(&query)
            .bind(&BUSY_STATUS_NAMES[..])
            .bind(USER_TYPE_WORKER)
            .fetch_all(pool)
            .await
    }

    /// Update a user's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
