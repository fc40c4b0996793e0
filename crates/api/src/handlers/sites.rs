//! Handlers for the read-only `/sites` resource.

use axum::extract::State;
use axum::Json;
use ptw_db::models::site::Site;
use ptw_db::repositories::SiteRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::state::AppState;

/// GET /api/sites
///
/// All sites ordered by `site_id`, for the task creation form.
pub async fn list_sites(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> AppResult<Json<Vec<Site>>> {
    let sites = SiteRepo::list(&state.pool).await?;
    Ok(Json(sites))
}
