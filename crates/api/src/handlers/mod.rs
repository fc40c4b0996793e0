//! Request handlers.
//!
//! Each submodule holds the async handler functions for one resource.
//! Handlers check roles and ownership, validate input against the rules in
//! `ptw_core`, delegate to the repositories in `ptw_db` and map errors via
//! [`AppError`](crate::error::AppError).

pub mod auth;
pub mod ptw;
pub mod sites;
pub mod tasks;
pub mod users;
