//! Domain rules for the permit-to-work tracker.
//!
//! Everything in this crate is pure: no database, no HTTP, no filesystem.
//! The `db` and `api` crates call into these modules to decide what a
//! request is allowed to do before anything is persisted.

pub mod error;
pub mod numbering;
pub mod ptw_form;
pub mod roles;
pub mod task_status;
pub mod types;
pub mod uploads;
