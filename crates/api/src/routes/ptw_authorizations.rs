//! Route definitions for the `/ptw-authorizations` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::ptw;
use crate::state::AppState;

/// Routes mounted at `/ptw-authorizations`.
///
/// ```text
/// GET /  -> list_authorizations
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(ptw::list_authorizations))
}
