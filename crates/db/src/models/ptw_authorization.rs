//! PTW authorization records.

use chrono::NaiveDate;
use ptw_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `ptw_authorizations`. At most one per task.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PtwAuthorization {
    pub id: DbId,
    pub task_id: String,
    pub supervisor_name: String,
    pub supervisor_signature: String,
    pub authorization_date: NaiveDate,
    pub created_at: Timestamp,
}

/// Authorization joined with its task, site and the people involved.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PtwAuthorizationSummary {
    pub task_id: String,
    /// Name as signed on the authorization.
    pub supervisor_name: String,
    pub authorization_date: NaiveDate,
    pub permit_number: Option<String>,
    pub site_name: Option<String>,
    pub work_description: Option<String>,
    pub worker_name: Option<String>,
    /// Name of the supervisor the task was assigned by.
    pub assigned_supervisor_name: Option<String>,
    pub created_at: Timestamp,
}

/// Everything needed to authorize a submitted PTW.
#[derive(Debug)]
pub struct AuthorizePtw<'a> {
    pub task_id: &'a str,
    pub supervisor_name: &'a str,
    pub supervisor_signature: &'a str,
    pub authorization_date: NaiveDate,
    pub permit_number: &'a str,
    /// Business `user_id` of the authorizing user.
    pub authorized_by: &'a str,
}
