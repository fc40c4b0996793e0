//! Route definitions for the `/tasks` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{ptw, tasks};
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET  /                        -> list_tasks
/// POST /                        -> create_task (supervisor or admin)
/// GET  /next-permit-number      -> next_permit_number
/// PUT  /{task_id}/status        -> update_status (multipart)
/// PUT  /{task_id}/ptw-form      -> submit_ptw_form (multipart)
/// PUT  /{task_id}/authorize     -> authorize_ptw (supervisor or admin)
/// PUT  /{task_id}/cancel-ptw    -> cancel_ptw (supervisor or admin)
/// GET  /{task_id}/details       -> task_details
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/next-permit-number", get(tasks::next_permit_number))
        .route("/{task_id}/status", put(tasks::update_status))
        .route("/{task_id}/ptw-form", put(ptw::submit_ptw_form))
        .route("/{task_id}/authorize", put(ptw::authorize_ptw))
        .route("/{task_id}/cancel-ptw", put(ptw::cancel_ptw))
        .route("/{task_id}/details", get(tasks::task_details))
}
