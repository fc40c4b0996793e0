//! Repository for the `tasks` table and the lifecycle writes on it.
//!
//! Every status write is conditioned on the status the caller validated
//! against (`WHERE status = $expected`). If another request moved the task
//! first the write matches no row, the transaction is dropped (rolled back)
//! and the method returns `None`.

use chrono::NaiveDate;
use ptw_core::numbering::{self, NextNumbers};
use ptw_core::roles::USER_TYPE_WORKER;
use ptw_core::task_status::{TaskAction, TaskStatus, TaskType, BUSY_STATUS_NAMES};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::ptw_authorization::{AuthorizePtw, PtwAuthorization};
use crate::models::task::{
    CreateTask, CreateTaskOutcome, StatusChange, StatusChangeOutcome, SubmitPtwForm, Task, TaskDetails,
    TaskListParams, TaskWithNames,
};
use crate::models::task_update::CreateTaskUpdate;
use crate::repositories::{PtwAuthorizationRepo, TaskUpdateRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, task_id, worker_id, supervisor_id, task_type, status, site_id, \
    site_name, assigned_area, task_description, implementation_date, implementation_time, \
    permit_number, date_issued, time_issued, valid_until_date, valid_until_time, \
    work_description, location_of_work, ptw_form_data, ptw_files, authorized_by, \
    started_at, paused_at, resumed_at, completed_at, created_at";

/// Task rows joined with worker and supervisor display names.
const SELECT_WITH_NAMES: &str = "SELECT t.*, w.name AS worker_name, s.name AS supervisor_name
     FROM tasks t
     LEFT JOIN users w ON w.user_id = t.worker_id
     LEFT JOIN users s ON s.user_id = t.supervisor_id";

/// Keep `value` only when the field belongs to the task's cluster.
fn only_if<T: Clone>(keep: bool, value: &Option<T>) -> Option<T> {
    if keep {
        value.clone()
    } else {
        None
    }
}

pub struct TaskRepo;

impl TaskRepo {
    // -----------------------------------------------------------------------
    // Numbering
    // -----------------------------------------------------------------------

    /// Suggest the next request, task and permit numbers for `today`.
    ///
    /// Not reserved: two callers can receive the same suggestion. Inserts
    /// are protected by the unique constraints on `task_id` and PTW
    /// `permit_number`.
    pub async fn next_numbers(pool: &PgPool, today: NaiveDate) -> Result<NextNumbers, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let latest_ptw = Self::latest_ptw_task_id(&mut *conn).await?;
        let task_prefix = numbering::task_number_prefix(today);
        let task_ids = Self::task_ids_with_prefix(&mut *conn, &task_prefix).await?;
        let permit_prefix = numbering::permit_number_prefix(today);
        let permits = Self::permit_numbers_with_prefix(&mut *conn, &permit_prefix).await?;

        Ok(NextNumbers {
            request_number: numbering::next_request_number(latest_ptw.as_deref()),
            task_number: numbering::next_in_sequence(
                &task_prefix,
                task_ids.iter().map(String::as_str),
            ),
            permit_number: numbering::next_in_sequence(
                &permit_prefix,
                permits.iter().map(String::as_str),
            ),
        })
    }

    async fn latest_ptw_task_id(conn: &mut PgConnection) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT task_id FROM tasks WHERE task_type = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(TaskType::Ptw.as_str())
        .fetch_optional(conn)
        .await
    }

    async fn task_ids_with_prefix(
        conn: &mut PgConnection,
        prefix: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT task_id FROM tasks WHERE starts_with(task_id, $1)")
            .bind(prefix)
            .fetch_all(conn)
            .await
    }

    async fn permit_numbers_with_prefix(
        conn: &mut PgConnection,
        prefix: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT permit_number FROM tasks
             WHERE permit_number IS NOT NULL AND starts_with(permit_number, $1)",
        )
        .bind(prefix)
        .fetch_all(conn)
        .await
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create a task for an available worker.
    ///
    /// The worker row is locked `FOR UPDATE` for the whole check-and-insert,
    /// so two concurrent assignments to the same worker serialise and the
    /// second sees the first's task. When `input.task_id` is `None` the next
    /// number of the type's sequence is assigned inside the same transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTask,
        supervisor_id: &str,
        today: NaiveDate,
    ) -> Result<CreateTaskOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let worker: Option<String> = sqlx::query_scalar(
            "SELECT user_id FROM users WHERE user_id = $1 AND user_type = $2 FOR UPDATE",
        )
        .bind(&input.worker_id)
        .bind(USER_TYPE_WORKER)
        .fetch_optional(&mut *tx)
        .await?;
        if worker.is_none() {
            return Ok(CreateTaskOutcome::WorkerNotFound);
        }

        let busy: Option<String> = sqlx::query_scalar(
            "SELECT task_id FROM tasks
             WHERE worker_id = $1 AND status = ANY($2)
             ORDER BY id LIMIT 1",
        )
        .bind(&input.worker_id)
        .bind(&BUSY_STATUS_NAMES[..])
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(current_task_id) = busy {
            return Ok(CreateTaskOutcome::WorkerBusy { current_task_id });
        }

        let task_id = match &input.task_id {
            Some(task_id) => task_id.clone(),
            None => match input.task_type {
                TaskType::Ptw => {
                    let latest = Self::latest_ptw_task_id(&mut *tx).await?;
                    numbering::next_request_number(latest.as_deref())
                }
                TaskType::General => {
                    let prefix = numbering::task_number_prefix(today);
                    let existing = Self::task_ids_with_prefix(&mut *tx, &prefix).await?;
                    numbering::next_in_sequence(&prefix, existing.iter().map(String::as_str))
                }
            },
        };

        let general = input.task_type == TaskType::General;
        let ptw = input.task_type == TaskType::Ptw;

        let query = format!(
            "INSERT INTO tasks
                (task_id, worker_id, supervisor_id, task_type, status, site_id, site_name,
                 assigned_area, task_description, implementation_date, implementation_time,
                 permit_number,
                 date_issued, time_issued, valid_until_date, valid_until_time,
                 work_description, location_of_work)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                     $13, $14, $15, $16, $17, $18)
             RETURNING {COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(&task_id)
            .bind(&input.worker_id)
            .bind(supervisor_id)
            .bind(input.task_type.as_str())
            .bind(input.task_type.initial_status().as_str())
            .bind(&input.site_id)
            .bind(&input.site_name)
            .bind(only_if(general, &input.assigned_area))
            .bind(only_if(general, &input.task_description))
            .bind(only_if(general, &input.implementation_date))
            .bind(only_if(general, &input.implementation_time))
            .bind(only_if(general, &input.permit_number))
            .bind(only_if(ptw, &input.date_issued))
            .bind(only_if(ptw, &input.time_issued))
            .bind(only_if(ptw, &input.valid_until_date))
            .bind(only_if(ptw, &input.valid_until_time))
            .bind(only_if(ptw, &input.work_description))
            .bind(only_if(ptw, &input.location_of_work))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(CreateTaskOutcome::Created(task))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find a task by business key.
    pub async fn find_by_task_id(pool: &PgPool, task_id: &str) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE task_id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(task_id)
            .fetch_optional(pool)
            .await
    }

    /// List tasks matching every supplied filter, newest first.
    pub async fn list(
        pool: &PgPool,
        params: &TaskListParams,
    ) -> Result<Vec<TaskWithNames>, sqlx::Error> {
        let query = format!(
            "{SELECT_WITH_NAMES}
             WHERE ($1::TEXT IS NULL OR t.worker_id = $1)
               AND ($2::TEXT IS NULL OR t.supervisor_id = $2)
               AND ($3::TEXT IS NULL OR t.status = $3)
             ORDER BY t.created_at DESC, t.id DESC"
        );
        sqlx::query_as::<_, TaskWithNames>(&query)
            .bind(&params.worker_id)
            .bind(&params.supervisor_id)
            .bind(&params.status)
            .fetch_all(pool)
            .await
    }

    /// Task snapshot with names and its full history, oldest entry first.
    pub async fn details(pool: &PgPool, task_id: &str) -> Result<Option<TaskDetails>, sqlx::Error> {
        let query = format!("{SELECT_WITH_NAMES} WHERE t.task_id = $1");
        let Some(task) = sqlx::query_as::<_, TaskWithNames>(&query)
            .bind(task_id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let history = TaskUpdateRepo::list_for_task(pool, task_id).await?;
        Ok(Some(TaskDetails { task, history }))
    }

    // -----------------------------------------------------------------------
    // Lifecycle writes
    // -----------------------------------------------------------------------

    /// Apply a validated status change and append its history entry atomically.
    ///
    /// The lifecycle timestamp matching the action (`started_at`,
    /// `paused_at`, `resumed_at`, `completed_at`) is stamped in the same write.
    /// A change that makes the task occupy its worker again (`resume`) first
    /// locks the worker row and re-runs the availability check of [`Self::create`].
    pub async fn apply_status_change(
        pool: &PgPool,
        change: &StatusChange<'_>,
    ) -> Result<StatusChangeOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if change.to.occupies_worker() && !change.from.occupies_worker() {
            let worker_id: Option<String> = sqlx::query_scalar(
                "SELECT u.user_id FROM users u
                 JOIN tasks t ON t.worker_id = u.user_id
                 WHERE t.task_id = $1
                 FOR UPDATE OF u",
            )
            .bind(change.task_id)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(worker_id) = worker_id {
                let busy: Option<String> = sqlx::query_scalar(
                    "SELECT task_id FROM tasks
                     WHERE worker_id = $1 AND status = ANY($2) AND task_id <> $3
                     ORDER BY id LIMIT 1",
                )
                .bind(&worker_id)
                .bind(&BUSY_STATUS_NAMES[..])
                .bind(change.task_id)
                .fetch_optional(&mut *tx)
                .await?;
                if let Some(current_task_id) = busy {
                    return Ok(StatusChangeOutcome::WorkerBusy { current_task_id });
                }
            }
        }

        let query = format!(
            "UPDATE tasks SET
                status = $3,
                started_at = CASE WHEN $4::TEXT = 'start' THEN NOW() ELSE started_at END,
                paused_at = CASE WHEN $4::TEXT = 'pause' THEN NOW() ELSE paused_at END,
                resumed_at = CASE WHEN $4::TEXT = 'resume' THEN NOW() ELSE resumed_at END,
                completed_at = CASE WHEN $4::TEXT = 'complete' THEN NOW() ELSE completed_at END
             WHERE task_id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        let Some(task) = sqlx::query_as::<_, Task>(&query)
            .bind(change.task_id)
            .bind(change.from.as_str())
            .bind(change.to.as_str())
            .bind(change.action.as_str())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(StatusChangeOutcome::Stale);
        };

        TaskUpdateRepo::insert(
            &mut *tx,
            &CreateTaskUpdate {
                task_id: change.task_id,
                user_id: change.actor,
                status_change: change.action.as_str(),
                remarks: change.remarks,
                attachments: change.attachments,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(StatusChangeOutcome::Applied(task))
    }

    /// Store a checklist submission and move the task to `ptw_submitted`.
    ///
    /// Both JSONB columns are overwritten in full.
    pub async fn submit_ptw_form(
        pool: &PgPool,
        form: &SubmitPtwForm<'_>,
    ) -> Result<Option<Task>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE tasks SET ptw_form_data = $3, ptw_files = $4, status = $5
             WHERE task_id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        let Some(task) = sqlx::query_as::<_, Task>(&query)
            .bind(form.task_id)
            .bind(TaskStatus::PtwInitiated.as_str())
            .bind(Json(form.checklist))
            .bind(Json(form.files))
            .bind(TaskStatus::PtwSubmitted.as_str())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let attachments: Vec<String> = form
            .files
            .values()
            .flat_map(|items| items.values().cloned())
            .collect();

        TaskUpdateRepo::insert(
            &mut *tx,
            &CreateTaskUpdate {
                task_id: form.task_id,
                user_id: form.actor,
                status_change: TaskAction::SubmitPtw.as_str(),
                remarks: form.checklist.remarks.as_deref(),
                attachments: &attachments,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(Some(task))
    }

    /// Authorize a submitted PTW: stamp the permit, record the authorization
    /// and the history entry in one transaction.
    pub async fn authorize(
        pool: &PgPool,
        input: &AuthorizePtw<'_>,
    ) -> Result<Option<(Task, PtwAuthorization)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE tasks SET status = $3, authorized_by = $4, permit_number = $5
             WHERE task_id = $1 AND status = $2 AND task_type = $6
             RETURNING {COLUMNS}"
        );
        let Some(task) = sqlx::query_as::<_, Task>(&query)
            .bind(input.task_id)
            .bind(TaskStatus::PtwSubmitted.as_str())
            .bind(TaskStatus::PtwAuthorized.as_str())
            .bind(input.authorized_by)
            .bind(input.permit_number)
            .bind(TaskType::Ptw.as_str())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let authorization = PtwAuthorizationRepo::insert(&mut *tx, input).await?;

        TaskUpdateRepo::insert(
            &mut *tx,
            &CreateTaskUpdate {
                task_id: input.task_id,
                user_id: input.authorized_by,
                status_change: TaskAction::Authorize.as_str(),
                remarks: None,
                attachments: &[],
            },
        )
        .await?;

        tx.commit().await?;
        Ok(Some((task, authorization)))
    }
}
