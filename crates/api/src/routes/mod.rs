pub mod auth;
pub mod health;
pub mod ptw_authorizations;
pub mod sites;
pub mod tasks;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                          login (public)
/// /auth/forgot-password                request reset token (public)
/// /auth/reset-password                 reset password (public, token in body)
///
/// /users                               list (?user_type=), create (admin)
/// /workers                             list with availability
/// /sites                               list
///
/// /tasks                               list (?worker_id, supervisor_id, status), create
/// /tasks/next-permit-number            suggested request/task/permit numbers
/// /tasks/{task_id}/status              lifecycle action (PUT, multipart)
/// /tasks/{task_id}/ptw-form            checklist submission (PUT, multipart)
/// /tasks/{task_id}/authorize           authorize PTW (PUT)
/// /tasks/{task_id}/cancel-ptw          cancel PTW (PUT)
/// /tasks/{task_id}/details             snapshot + history
///
/// /ptw-authorizations                  authorization register
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication routes (login, password reset).
        .nest("/auth", auth::router())
        // Users and the worker roster.
        .merge(users::router())
        // Sites (read-only).
        .nest("/sites", sites::router())
        // Tasks and the PTW workflow steps.
        .nest("/tasks", tasks::router())
        // Authorization register.
        .nest("/ptw-authorizations", ptw_authorizations::router())
}
