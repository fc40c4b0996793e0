//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Helpers that must run inside a
//! caller's transaction take `&mut PgConnection` instead.

pub mod ptw_authorization_repo;
pub mod site_repo;
pub mod task_repo;
pub mod task_update_repo;
pub mod user_repo;

pub use ptw_authorization_repo::PtwAuthorizationRepo;
pub use site_repo::SiteRepo;
pub use task_repo::TaskRepo;
pub use task_update_repo::TaskUpdateRepo;
pub use user_repo::UserRepo;
