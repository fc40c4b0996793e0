//! Repository for `ptw_authorizations`.

use sqlx::{PgConnection, PgPool};

use crate::models::ptw_authorization::{AuthorizePtw, PtwAuthorization, PtwAuthorizationSummary};

const COLUMNS: &str =
    "id, task_id, supervisor_name, supervisor_signature, authorization_date, created_at";

pub struct PtwAuthorizationRepo;

impl PtwAuthorizationRepo {
    /// Record an authorization on the caller's transaction.
    ///
    /// A second authorization for the same task violates
    /// `uq_ptw_authorizations_task_id`.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &AuthorizePtw<'_>,
    ) -> Result<PtwAuthorization, sqlx::Error> {
        let query = format!(
            "INSERT INTO ptw_authorizations
                (task_id, supervisor_name, supervisor_signature, authorization_date)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PtwAuthorization>(&query)
            .bind(input.task_id)
            .bind(input.supervisor_name)
            .bind(input.supervisor_signature)
            .bind(input.authorization_date)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_task_id(
        pool: &PgPool,
        task_id: &str,
    ) -> Result<Option<PtwAuthorization>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ptw_authorizations WHERE task_id = $1");
        sqlx::query_as::<_, PtwAuthorization>(&query)
            .bind(task_id)
            .fetch_optional(pool)
            .await
    }

    /// Every authorization joined with task, worker and supervisor names, newest first.
    pub async fn list_summaries(
        pool: &PgPool,
    ) -> Result<Vec<PtwAuthorizationSummary>, sqlx::Error> {
        sqlx::query_as::<_, PtwAuthorizationSummary>(
            "SELECT pa.task_id,
                    pa.supervisor_name,
                    pa.authorization_date,
                    t.permit_number,
                    t.site_name,
                    t.work_description,
                    w.name AS worker_name,
                    s.name AS assigned_supervisor_name,
                    pa.created_at
             FROM ptw_authorizations pa
             JOIN tasks t ON t.task_id = pa.task_id
             LEFT JOIN users w ON w.user_id = t.worker_id
             LEFT JOIN users s ON s.user_id = t.supervisor_id
             ORDER BY pa.created_at DESC, pa.id DESC",
        )
        .fetch_all(pool)
        .await
    }
}
