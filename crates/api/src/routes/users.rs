//! Route definitions for users and workers.

use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes merged at the API root.
///
/// ```text
/// GET  /users    -> list_users (supervisor or admin)
/// POST /users    -> create_user (admin)
/// GET  /workers  -> list_workers
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/workers", get(users::list_workers))
}
