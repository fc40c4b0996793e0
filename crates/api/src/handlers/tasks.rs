//! Handlers for the `/tasks` resource: numbering, creation, listing, the
//! generic status actions and the details read.
//!
//! PTW-specific steps (form submission, authorization, cancellation) live in
//! [`super::ptw`].

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use ptw_core::error::CoreError;
use ptw_core::numbering::{
    validate_permit_number, validate_request_number, validate_task_number, NextNumbers,
};
use ptw_core::task_status::{transition_from_stored, TaskAction, TaskStatus, TaskType};
use ptw_core::types::DbId;
use ptw_db::models::task::{
    CreateTask, CreateTaskOutcome, StatusChange, StatusChangeOutcome, Task, TaskDetails,
    TaskListParams, TaskWithNames,
};
use ptw_db::repositories::TaskRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAuth, RequireSupervisor};
use crate::state::AppState;

/// Multipart field carrying status-update attachments.
pub const ATTACHMENTS_FIELD: &str = "attachments";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response of `POST /tasks`.
#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    pub message: String,
    pub id: DbId,
    pub task_id: String,
}

/// Response of `PUT /tasks/{task_id}/status`.
#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    pub message: String,
    pub task_id: String,
    pub status: TaskStatus,
    /// Stored filenames of the attachments saved with this update.
    pub attachments: Vec<String>,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load a task the caller is allowed to act on.
///
/// Workers may only touch tasks assigned to them; supervisors and admins may
/// touch any task.
pub(crate) async fn load_task_for(
    state: &AppState,
    user: &AuthUser,
    task_id: &str,
) -> AppResult<Task> {
    let task = TaskRepo::find_by_task_id(&state.pool, task_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Task", task_id))?;
    ensure_can_access(user, &task.worker_id)?;
    Ok(task)
}

pub(crate) fn ensure_can_access(user: &AuthUser, worker_id: &str) -> Result<(), CoreError> {
    if user.is_worker() && user.user_id != worker_id {
        return Err(CoreError::Forbidden(
            "You can only act on tasks assigned to you".into(),
        ));
    }
    Ok(())
}

/// The guarded write matched no row: someone else moved the task first.
pub(crate) fn concurrent_change(task_id: &str) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Task '{task_id}' was modified concurrently; reload and retry"
    )))
}

/// Unwrap a status-change outcome for `task`, mapping refusals to 409.
pub(crate) fn applied_change(task: &Task, outcome: StatusChangeOutcome) -> AppResult<Task> {
    match outcome {
        StatusChangeOutcome::Applied(updated) => Ok(updated),
        StatusChangeOutcome::Stale => Err(concurrent_change(&task.task_id)),
        StatusChangeOutcome::WorkerBusy { current_task_id } => Err(CoreError::Conflict(format!(
            "Worker '{}' is busy with task '{current_task_id}'",
            task.worker_id
        ))
        .into()),
    }
}

fn required(field: &str, value: &Option<String>) -> Result<(), CoreError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(CoreError::Validation(format!("{field} is required"))),
    }
}

/// Trim optional text, dropping values that are blank.
fn normalize(value: &mut Option<String>) {
    *value = value
        .take()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
}

/// Check the creation payload for its task type.
fn validate_create(input: &CreateTask) -> Result<(), CoreError> {
    if input.worker_id.trim().is_empty() {
        return Err(CoreError::Validation("worker_id is required".into()));
    }

    match input.task_type {
        TaskType::General => {
            required("assigned_area", &input.assigned_area)?;
            required("task_description", &input.task_description)?;
            if let Some(task_id) = &input.task_id {
                validate_task_number(task_id)?;
            }
            if let Some(permit_number) = &input.permit_number {
                validate_permit_number(permit_number)?;
            }
        }
        TaskType::Ptw => {
            required("work_description", &input.work_description)?;
            required("location_of_work", &input.location_of_work)?;
            if let Some(task_id) = &input.task_id {
                validate_request_number(task_id)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GET /tasks/next-permit-number
// ---------------------------------------------------------------------------

/// GET /api/tasks/next-permit-number
///
/// Suggested request, task and permit numbers for today. Suggestions are not
/// reserved.
pub async fn next_permit_number(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> AppResult<Json<NextNumbers>> {
    let today = Utc::now().date_naive();
    let numbers = TaskRepo::next_numbers(&state.pool, today).await?;
    Ok(Json(numbers))
}

// ---------------------------------------------------------------------------
// GET /tasks
// ---------------------------------------------------------------------------

/// GET /api/tasks?worker_id=&supervisor_id=&status=
///
/// Tasks with worker and supervisor names, newest first. A worker only ever
/// sees their own tasks, whatever `worker_id` they pass.
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    Query(mut params): Query<TaskListParams>,
) -> AppResult<Json<Vec<TaskWithNames>>> {
    normalize(&mut params.worker_id);
    normalize(&mut params.supervisor_id);
    normalize(&mut params.status);

    if let Some(status) = &params.status {
        status.parse::<TaskStatus>()?;
    }
    if user.is_worker() {
        params.worker_id = Some(user.user_id.clone());
    }

    let tasks = TaskRepo::list(&state.pool, &params).await?;
    Ok(Json(tasks))
}

// ---------------------------------------------------------------------------
// POST /tasks
// ---------------------------------------------------------------------------

/// POST /api/tasks
///
/// Assign a new task to an available worker. Supervisor or admin. The task
/// starts in the type's initial status; `task_id` is generated when omitted.
pub async fn create_task(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Json(mut input): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<CreateTaskResponse>)> {
    input.worker_id = input.worker_id.trim().to_string();
    normalize(&mut input.task_id);
    normalize(&mut input.supervisor_id);
    normalize(&mut input.permit_number);
    validate_create(&input)?;

    let supervisor_id = input
        .supervisor_id
        .clone()
        .unwrap_or_else(|| user.user_id.clone());
    let today = Utc::now().date_naive();

    match TaskRepo::create(&state.pool, &input, &supervisor_id, today).await? {
        CreateTaskOutcome::Created(task) => {
            tracing::info!(
                task_id = %task.task_id,
                task_type = %task.task_type,
                worker_id = %task.worker_id,
                actor = %user.user_id,
                status = %task.status,
                "Task assigned"
            );
            Ok((
                StatusCode::CREATED,
                Json(CreateTaskResponse {
                    message: "Task assigned successfully".into(),
                    id: task.id,
                    task_id: task.task_id,
                }),
            ))
        }
        CreateTaskOutcome::WorkerNotFound => {
            Err(CoreError::not_found("Worker", input.worker_id).into())
        }
        CreateTaskOutcome::WorkerBusy { current_task_id } => {
            Err(CoreError::Conflict(format!(
                "Worker '{}' is busy with task '{current_task_id}'",
                input.worker_id
            ))
            .into())
        }
    }
}

// ---------------------------------------------------------------------------
// PUT /tasks/{task_id}/status
// ---------------------------------------------------------------------------

/// PUT /api/tasks/{task_id}/status
///
/// Multipart form with `action` (`start`, `pause`, `resume`, `complete`),
/// optional `remarks` and any number of `attachments` files. The transition
/// is checked against the current status before anything is written; the
/// status write and its history entry commit together.
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<StatusUpdateResponse>> {
    let form = state.uploads.read_form(multipart).await?;

    let action = TaskAction::parse_lifecycle(form.text("action").unwrap_or_default())?;
    if let Some(stray) = form.files.iter().find(|f| f.field_name != ATTACHMENTS_FIELD) {
        return Err(AppError::BadRequest(format!(
            "Unexpected upload field '{}'",
            stray.field_name
        )));
    }

    let task = load_task_for(&state, &user, &task_id).await?;
    let (from, to) = transition_from_stored(&task.status, action)?;

    let attachments = state.uploads.save_all(&form.files).await?;

    let change = StatusChange {
        task_id: &task.task_id,
        from,
        to,
        action,
        actor: &user.user_id,
        remarks: form.text("remarks"),
        attachments: &attachments,
    };
    let outcome = TaskRepo::apply_status_change(&state.pool, &change).await?;
    let updated = applied_change(&task, outcome)?;

    tracing::info!(
        task_id = %updated.task_id,
        actor = %user.user_id,
        action = %action,
        status = %to,
        attachments = attachments.len(),
        "Task status updated"
    );

    Ok(Json(StatusUpdateResponse {
        message: format!("Task {action} successful"),
        task_id: updated.task_id,
        status: to,
        attachments,
    }))
}

// ---------------------------------------------------------------------------
// GET /tasks/{task_id}/details
// ---------------------------------------------------------------------------

/// GET /api/tasks/{task_id}/details
///
/// Current task snapshot plus its history, oldest entry first.
pub async fn task_details(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
) -> AppResult<Json<TaskDetails>> {
    let details = TaskRepo::details(&state.pool, &task_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Task", &task_id))?;
    ensure_can_access(&user, &details.task.task.worker_id)?;
    Ok(Json(details))
}
