//! Handlers for the PTW sub-lifecycle: checklist submission, authorization,
//! cancellation and the authorization register.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::NaiveDate;
use ptw_core::error::CoreError;
use ptw_core::numbering::validate_permit_number;
use ptw_core::ptw_form::{
    insert_evidence, parse_evidence_field, ChecklistAnswer, PtwChecklist, PtwFiles,
};
use ptw_core::task_status::{transition_from_stored, TaskAction, TaskStatus, TaskType};
use ptw_db::models::ptw_authorization::{AuthorizePtw, PtwAuthorizationSummary};
use ptw_db::models::task::{StatusChange, SubmitPtwForm, Task};
use ptw_db::repositories::{PtwAuthorizationRepo, TaskRepo};
use serde::{Deserialize, Serialize};

use super::tasks::{applied_change, concurrent_change, load_task_for};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAuth, RequireSupervisor};
use crate::response::MessageResponse;
use crate::state::AppState;

/// Multipart text field holding the checklist JSON.
pub const FORM_DATA_FIELD: &str = "ptw_form_data";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Response of `PUT /tasks/{task_id}/ptw-form`.
#[derive(Debug, Serialize)]
pub struct SubmitPtwResponse {
    pub message: String,
    pub task_id: String,
    pub status: TaskStatus,
    pub ptw_files: PtwFiles,
}

/// Request body for `PUT /tasks/{task_id}/authorize`.
///
/// Every field is required; they are optional here so a missing one yields
/// the domain's 400 rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub supervisor_name: Option<String>,
    pub supervisor_signature: Option<String>,
    /// `YYYY-MM-DD`.
    pub authorization_date: Option<String>,
    pub permit_number: Option<String>,
}

/// Response of `PUT /tasks/{task_id}/authorize`.
#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub message: String,
    pub permit_number: String,
}

fn ensure_ptw(task: &Task) -> Result<(), CoreError> {
    if task.task_type != TaskType::Ptw.as_str() {
        return Err(CoreError::Validation(format!(
            "Task '{}' is not a PTW task",
            task.task_id
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// PUT /tasks/{task_id}/ptw-form
// ---------------------------------------------------------------------------

/// PUT /api/tasks/{task_id}/ptw-form
///
/// Multipart form with a `ptw_form_data` JSON checklist and optional evidence
/// files named `{category}_{item}_file`. The checklist must answer every item;
/// both stored columns are replaced wholesale.
pub async fn submit_ptw_form(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<SubmitPtwResponse>> {
    let form = state.uploads.read_form(multipart).await?;

    let raw = form.text(FORM_DATA_FIELD).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!("{FORM_DATA_FIELD} is required")))
    })?;
    let checklist = PtwChecklist::parse(raw)?;

    let mut evidence = Vec::with_capacity(form.files.len());
    for upload in &form.files {
        let (category, item) = parse_evidence_field(&upload.field_name)?;
        if evidence
            .iter()
            .any(|(c, i, _)| *c == category && *i == item)
        {
            return Err(AppError::BadRequest(format!(
                "Duplicate upload field '{}'",
                upload.field_name
            )));
        }
        evidence.push((category, item, upload));
    }

    let task = load_task_for(&state, &user, &task_id).await?;
    ensure_ptw(&task)?;
    transition_from_stored(&task.status, TaskAction::SubmitPtw)?;

    let mut files = PtwFiles::new();
    for (category, item, upload) in evidence {
        let stored = state.uploads.save(upload).await?;
        insert_evidence(&mut files, category, item, stored);
    }

    let submission = SubmitPtwForm {
        task_id: &task.task_id,
        actor: &user.user_id,
        checklist: &checklist,
        files: &files,
    };
    let updated = TaskRepo::submit_ptw_form(&state.pool, &submission)
        .await?
        .ok_or_else(|| concurrent_change(&task.task_id))?;

    tracing::info!(
        task_id = %updated.task_id,
        actor = %user.user_id,
        action = %TaskAction::SubmitPtw,
        status = %updated.status,
        evidence_files = form.files.len(),
        answered_no = checklist.count(ChecklistAnswer::No),
        not_applicable = checklist.count(ChecklistAnswer::NotApplicable),
        "PTW form submitted"
    );

    Ok(Json(SubmitPtwResponse {
        message: "PTW form submitted successfully".into(),
        task_id: updated.task_id,
        status: TaskStatus::PtwSubmitted,
        ptw_files: files,
    }))
}

// ---------------------------------------------------------------------------
// PUT /tasks/{task_id}/authorize
// ---------------------------------------------------------------------------

/// PUT /api/tasks/{task_id}/authorize
///
/// Sign off a submitted PTW and issue its permit number. Supervisor or
/// admin. The authorization record, task update and history entry commit
/// together; a task can be authorized once.
pub async fn authorize_ptw(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(task_id): Path<String>,
    Json(input): Json<AuthorizeRequest>,
) -> AppResult<Json<AuthorizeResponse>> {
    let (Some(supervisor_name), Some(supervisor_signature), Some(date), Some(permit_number)) = (
        non_blank(input.supervisor_name),
        non_blank(input.supervisor_signature),
        non_blank(input.authorization_date),
        non_blank(input.permit_number),
    ) else {
        return Err(AppError::BadRequest(
            "Missing required authorization data".into(),
        ));
    };

    let authorization_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
        CoreError::Validation(format!(
            "Invalid authorization_date '{date}'. Expected YYYY-MM-DD"
        ))
    })?;
    validate_permit_number(&permit_number)?;

    let task = load_task_for(&state, &user, &task_id).await?;
    ensure_ptw(&task)?;
    transition_from_stored(&task.status, TaskAction::Authorize)?;

    let input = AuthorizePtw {
        task_id: &task.task_id,
        supervisor_name: &supervisor_name,
        supervisor_signature: &supervisor_signature,
        authorization_date,
        permit_number: &permit_number,
        authorized_by: &user.user_id,
    };
    let (updated, authorization) = TaskRepo::authorize(&state.pool, &input)
        .await?
        .ok_or_else(|| concurrent_change(&task.task_id))?;

    tracing::info!(
        task_id = %updated.task_id,
        actor = %user.user_id,
        action = %TaskAction::Authorize,
        status = %updated.status,
        permit_number = %permit_number,
        authorization_id = authorization.id,
        "PTW authorized"
    );

    Ok(Json(AuthorizeResponse {
        message: "PTW authorized successfully".into(),
        permit_number,
    }))
}

// ---------------------------------------------------------------------------
// PUT /tasks/{task_id}/cancel-ptw
// ---------------------------------------------------------------------------

/// PUT /api/tasks/{task_id}/cancel-ptw
///
/// Reject a submitted PTW. Supervisor or admin. Terminal; no authorization
/// record is created.
pub async fn cancel_ptw(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(task_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let task = load_task_for(&state, &user, &task_id).await?;
    ensure_ptw(&task)?;
    let (from, to) = transition_from_stored(&task.status, TaskAction::CancelPtw)?;

    let change = StatusChange {
        task_id: &task.task_id,
        from,
        to,
        action: TaskAction::CancelPtw,
        actor: &user.user_id,
        remarks: None,
        attachments: &[],
    };
    let outcome = TaskRepo::apply_status_change(&state.pool, &change).await?;
    let updated = applied_change(&task, outcome)?;

    tracing::info!(
        task_id = %updated.task_id,
        actor = %user.user_id,
        action = %TaskAction::CancelPtw,
        status = %to,
        "PTW cancelled"
    );

    Ok(Json(MessageResponse::new("PTW cancelled successfully")))
}

// ---------------------------------------------------------------------------
// GET /ptw-authorizations
// ---------------------------------------------------------------------------

/// GET /api/ptw-authorizations
///
/// Every authorization with its permit, site, worker and assigning
/// supervisor, newest first.
pub async fn list_authorizations(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> AppResult<Json<Vec<PtwAuthorizationSummary>>> {
    let authorizations = PtwAuthorizationRepo::list_summaries(&state.pool).await?;
    Ok(Json(authorizations))
}
