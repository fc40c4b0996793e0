use std::sync::Arc;

use crate::config::ServerConfig;
use crate::uploads::UploadStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool is reference-counted and the rest sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: ptw_db::DbPool,
    /// Server configuration (JWT settings, limits).
    pub config: Arc<ServerConfig>,
    /// Where uploaded evidence and attachments are written.
    pub uploads: Arc<UploadStore>,
}

impl AppState {
    pub fn new(pool: ptw_db::DbPool, config: ServerConfig) -> Self {
        let uploads = UploadStore::new(config.upload_dir.clone(), config.upload_max_bytes);
        Self {
            pool,
            config: Arc::new(config),
            uploads: Arc::new(uploads),
        }
    }
}
