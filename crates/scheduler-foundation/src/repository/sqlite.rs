//! SQLite-backed [`TaskRepository`]. Mirrors the connection/migration shape
//! used throughout this stack's other storage backends: a pooled handle,
//! an idempotent `run_migrations`, and row parsing via `try_get`.
//!
//! The full `Task` is stored as a JSON blob in `data`; the handful of
//! columns duplicated alongside it (`status`, `user_id`, `next_run_at`, …)
//! exist purely so `due_before`/`list_by_user`/`claim_for_processing` can be
//! expressed as indexed SQL instead of a full-table deserialize-and-filter.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use scheduler_kernel::error::RepositoryError;
use scheduler_kernel::repository::{ClaimOutcome, RepoResult, TaskRepository};
use scheduler_kernel::task::{Task, TaskFilter, TaskId, TaskPatch, TaskStatus, UserId};

use crate::patch::apply_patch;

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub async fn connect(database_url: &str) -> RepoResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn in_memory() -> RepoResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> RepoResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                status TEXT NOT NULL,
                task_type TEXT NOT NULL,
                next_run_at TEXT,
                last_run_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(status, next_run_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    fn parse_row(row: &SqliteRow) -> RepoResult<Task> {
        let data: String = row.try_get("data").map_err(|e| RepositoryError::Query(e.to_string()))?;
        serde_json::from_str(&data).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    async fn write(&self, task: &Task) -> RepoResult<()> {
        let data = serde_json::to_string(task).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO tasks (id, user_id, status, task_type, next_run_at, last_run_at, created_at, updated_at, data)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                user_id = excluded.user_id,
                status = excluded.status,
                task_type = excluded.task_type,
                next_run_at = excluded.next_run_at,
                last_run_at = excluded.last_run_at,
                updated_at = excluded.updated_at,
                data = excluded.data
            "#,
        )
        .bind(task.id.to_string())
        .bind(task.user_id.to_string())
        .bind(task.status.to_string_code())
        .bind(task.task_type.to_string())
        .bind(task.next_run_at.map(|t| t.to_rfc3339()))
        .bind(task.last_run_at.map(|t| t.to_rfc3339()))
        .bind(task.created_at.to_rfc3339())
        .bind(task.updated_at.to_rfc3339())
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert(&self, task: Task) -> RepoResult<TaskId> {
        let id = task.id;
        let existing: Option<SqliteRow> = sqlx::query("SELECT id FROM tasks WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        if existing.is_some() {
            return Err(RepositoryError::Constraint(format!("task {id} already exists")));
        }
        self.write(&task).await?;
        Ok(id)
    }

    async fn get(&self, id: TaskId) -> RepoResult<Task> {
        let row = sqlx::query("SELECT data FROM tasks WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        Self::parse_row(&row)
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> RepoResult<Task> {
        let mut task = self.get(id).await?;
        apply_patch(&mut task, patch);
        self.write(&task).await?;
        Ok(task)
    }

    async fn delete(&self, id: TaskId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_by_user(&self, user_id: UserId, filter: TaskFilter) -> RepoResult<Vec<Task>> {
        let mut sql = String::from("SELECT data FROM tasks WHERE user_id = ?1");
        if filter.status.is_some() {
            sql.push_str(" AND status = ?2");
        }
        if filter.task_type.is_some() {
            sql.push_str(if filter.status.is_some() {
                " AND task_type = ?3"
            } else {
                " AND task_type = ?2"
            });
        }
        sql.push_str(" ORDER BY next_run_at ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut query = sqlx::query(&sql).bind(user_id.to_string());
        if let Some(status) = filter.status {
            query = query.bind(status.to_string_code());
        }
        if let Some(task_type) = filter.task_type {
            query = query.bind(task_type.to_string());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        rows.iter().map(Self::parse_row).collect()
    }

    async fn due_before(&self, instant: DateTime<Utc>, limit: u32) -> RepoResult<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT data FROM tasks WHERE status = ?1 AND next_run_at IS NOT NULL AND next_run_at <= ?2 \
             ORDER BY next_run_at ASC LIMIT ?3",
        )
        .bind(TaskStatus::Active.to_string_code())
        .bind(instant.to_rfc3339())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
        rows.iter().map(Self::parse_row).collect()
    }

    async fn claim_for_processing(&self, id: TaskId, now: DateTime<Utc>) -> RepoResult<ClaimOutcome> {
        let result = sqlx::query(
            "UPDATE tasks SET status = ?1, last_run_at = ?2, updated_at = ?2 \
             WHERE id = ?3 AND status = ?4",
        )
        .bind(TaskStatus::Processing.to_string_code())
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .bind(TaskStatus::Active.to_string_code())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 1 {
            // Keep the JSON blob's status/last_run_at in sync with the columns
            // the UPDATE above just changed directly.
            let mut task = self.get(id).await?;
            task.status = TaskStatus::Processing;
            task.last_run_at = Some(now);
            self.write(&task).await?;
            return Ok(ClaimOutcome::Claimed);
        }

        self.get(id).await.map(|_| ClaimOutcome::AlreadyClaimed)
    }

    async fn find_stuck(&self, now: DateTime<Utc>, threshold: Duration) -> RepoResult<Vec<Task>> {
        let cutoff = now - threshold;
        let rows = sqlx::query(
            "SELECT data FROM tasks WHERE status = ?1 AND (last_run_at IS NULL OR last_run_at <= ?2)",
        )
        .bind(TaskStatus::Processing.to_string_code())
        .bind(cutoff.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
        rows.iter().map(Self::parse_row).collect()
    }

    async fn release(&self, id: TaskId, patch: TaskPatch) -> RepoResult<Task> {
        self.update(id, patch).await
    }
}

trait StatusCode {
    fn to_string_code(&self) -> &'static str;
}

impl StatusCode for TaskStatus {
    fn to_string_code(&self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Paused => "paused",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}
