//! Repository for the append-only `task_updates` history.

use sqlx::{PgConnection, PgPool};

use crate::models::task_update::{CreateTaskUpdate, TaskUpdate};

const COLUMNS: &str = "id, task_id, user_id, status_change, remarks, attachments, created_at";

/// History entries are inserted inside the transaction of the status change
/// they record and never updated afterwards.
pub struct TaskUpdateRepo;

impl TaskUpdateRepo {
    /// Append a history entry on the caller's connection (usually a transaction).
    pub async fn insert(
        conn: &mut PgConnection,
        input: &CreateTaskUpdate<'_>,
    ) -> Result<TaskUpdate, sqlx::Error> {
        let query = format!(
            "INSERT INTO task_updates (task_id, user_id, status_change, remarks, attachments)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskUpdate>(&query)
            .bind(input.task_id)
            .bind(input.user_id)
            .bind(input.status_change)
            .bind(input.remarks)
            .bind(input.attachments)
            .fetch_one(conn)
            .await
    }

    /// All entries for a task, oldest first.
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: &str,
    ) -> Result<Vec<TaskUpdate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM task_updates
             WHERE task_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, TaskUpdate>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }
}
