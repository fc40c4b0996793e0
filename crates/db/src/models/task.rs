//! Task entity model and DTOs.

use chrono::{NaiveDate, NaiveTime};
use ptw_core::ptw_form::{PtwChecklist, PtwFiles};
use ptw_core::task_status::{TaskAction, TaskStatus, TaskType};
use ptw_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::task_update::TaskUpdate;

/// A row from the `tasks` table.
///
/// General tasks populate `assigned_area`, `task_description` and the
/// implementation window; PTW tasks populate the issue/validity window,
/// `work_description`, `location_of_work` and, once submitted, the checklist.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub task_id: String,
    pub worker_id: String,
    pub supervisor_id: String,
    pub task_type: String,
    pub status: String,
    pub site_id: Option<String>,
    pub site_name: Option<String>,
    pub assigned_area: Option<String>,
    pub task_description: Option<String>,
    pub implementation_date: Option<NaiveDate>,
    pub implementation_time: Option<NaiveTime>,
    pub permit_number: Option<String>,
    pub date_issued: Option<NaiveDate>,
    pub time_issued: Option<NaiveTime>,
    pub valid_until_date: Option<NaiveDate>,
    pub valid_until_time: Option<NaiveTime>,
    pub work_description: Option<String>,
    pub location_of_work: Option<String>,
    pub ptw_form_data: Option<Json<PtwChecklist>>,
    pub ptw_files: Option<Json<PtwFiles>>,
    pub authorized_by: Option<String>,
    pub started_at: Option<Timestamp>,
    pub paused_at: Option<Timestamp>,
    pub resumed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Task joined with the display names of its worker and supervisor.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskWithNames {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,
    pub worker_name: Option<String>,
    pub supervisor_name: Option<String>,
}

/// Task snapshot plus its chronological history.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetails {
    #[serde(flatten)]
    pub task: TaskWithNames,
    pub history: Vec<TaskUpdate>,
}

/// DTO for creating a task.
///
/// Only the field cluster selected by `task_type` is persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub task_type: TaskType,
    /// Business key. Assigned from the type's sequence when omitted.
    pub task_id: Option<String>,
    pub worker_id: String,
    /// Defaults to the creating user.
    pub supervisor_id: Option<String>,
    pub site_id: Option<String>,
    pub site_name: Option<String>,

    pub assigned_area: Option<String>,
    pub task_description: Option<String>,
    pub implementation_date: Option<NaiveDate>,
    pub implementation_time: Option<NaiveTime>,
    /// Permit a general follow-up task works under.
    pub permit_number: Option<String>,

    pub date_issued: Option<NaiveDate>,
    pub time_issued: Option<NaiveTime>,
    pub valid_until_date: Option<NaiveDate>,
    pub valid_until_time: Option<NaiveTime>,
    pub work_description: Option<String>,
    pub location_of_work: Option<String>,
}

/// Outcome of [`crate::repositories::TaskRepo::create`].
#[derive(Debug)]
pub enum CreateTaskOutcome {
    Created(Task),
    /// No user with the requested `worker_id` and type `worker`.
    WorkerNotFound,
    /// The worker already holds a task in a busy status.
    WorkerBusy { current_task_id: String },
}

/// Query parameters for listing tasks.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TaskListParams {
    pub worker_id: Option<String>,
    pub supervisor_id: Option<String>,
    pub status: Option<String>,
}

/// A guarded status write plus the history entry that records it.
#[derive(Debug)]
pub struct StatusChange<'a> {
    pub task_id: &'a str,
    /// Status the caller read; the write only applies if it still holds.
    pub from: TaskStatus,
    pub to: TaskStatus,
    pub action: TaskAction,
    /// Business `user_id` of the actor.
    pub actor: &'a str,
    pub remarks: Option<&'a str>,
    pub attachments: &'a [String],
}

/// Outcome of [`crate::repositories::TaskRepo::apply_status_change`].
#[derive(Debug)]
pub enum StatusChangeOutcome {
    Applied(Task),
    /// The task left `from` before the write landed.
    Stale,
    /// Re-entering a busy status while the worker already holds another busy task.
    WorkerBusy { current_task_id: String },
}

/// A worker's checklist submission.
#[derive(Debug)]
pub struct SubmitPtwForm<'a> {
    pub task_id: &'a str,
    pub actor: &'a str,
    pub checklist: &'a PtwChecklist,
    pub files: &'a PtwFiles,
}
