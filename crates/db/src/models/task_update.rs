//! Task history entries.

use ptw_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// One immutable row from `task_updates`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskUpdate {
    pub id: DbId,
    pub task_id: String,
    /// Business `user_id` of the actor.
    pub user_id: String,
    /// Action name (`start`, `pause`, ..., `authorize`, `cancel_ptw`).
    pub status_change: String,
    pub remarks: Option<String>,
    /// Stored upload filenames, in upload order.
    pub attachments: Vec<String>,
    pub created_at: Timestamp,
}

/// Insert payload for a history entry.
#[derive(Debug)]
pub struct CreateTaskUpdate<'a> {
    pub task_id: &'a str,
    pub user_id: &'a str,
    pub status_change: &'a str,
    pub remarks: Option<&'a str>,
    pub attachments: &'a [String],
}
