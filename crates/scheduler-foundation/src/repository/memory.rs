//! In-memory [`TaskRepository`] backend. Suitable for tests and for running
//! the engine without a durable store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use scheduler_kernel::error::RepositoryError;
use scheduler_kernel::repository::{ClaimOutcome, RepoResult, TaskRepository};
use scheduler_kernel::task::{Task, TaskFilter, TaskId, TaskPatch, TaskStatus, UserId};

use crate::patch::apply_patch;

/// Thread-safe in-memory storage. All data lives in a single guarded map;
/// suitable for tests and development, not for multi-process deployments.
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert(&self, task: Task) -> RepoResult<TaskId> {
        let id = task.id;
        let mut guard = self.tasks.write().await;
        if guard.contains_key(&id) {
            return Err(RepositoryError::Constraint(format!("task {id} already exists")));
        }
        guard.insert(id, task);
        Ok(id)
    }

    async fn get(&self, id: TaskId) -> RepoResult<Task> {
        self.tasks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> RepoResult<Task> {
        let mut guard = self.tasks.write().await;
        let task = guard
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        apply_patch(task, patch);
        Ok(task.clone())
    }

    async fn delete(&self, id: TaskId) -> RepoResult<()> {
        let mut guard = self.tasks.write().await;
        guard
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn list_by_user(&self, user_id: UserId, filter: TaskFilter) -> RepoResult<Vec<Task>> {
        let guard = self.tasks.read().await;
        let mut matched: Vec<Task> = guard
            .values()
            .filter(|t| t.user_id == user_id)
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .filter(|t| filter.task_type.map_or(true, |ty| t.task_type == ty))
            .cloned()
            .collect();
        matched.sort_by_key(|t| t.next_run_at);
        if let Some(limit) = filter.limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }

    async fn due_before(&self, instant: DateTime<Utc>, limit: u32) -> RepoResult<Vec<Task>> {
        let guard = self.tasks.read().await;
        let mut due: Vec<Task> = guard
            .values()
            .filter(|t| t.status == TaskStatus::Active)
            .filter(|t| t.next_run_at.map_or(false, |at| at <= instant))
            .cloned()
            .collect();
        due.sort_by_key(|t| t.next_run_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn claim_for_processing(&self, id: TaskId, now: DateTime<Utc>) -> RepoResult<ClaimOutcome> {
        let mut guard = self.tasks.write().await;
        let task = guard
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        if task.status != TaskStatus::Active {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }
        task.status = TaskStatus::Processing;
        task.last_run_at = Some(now);
        task.updated_at = now;
        Ok(ClaimOutcome::Claimed)
    }

    async fn find_stuck(&self, now: DateTime<Utc>, threshold: Duration) -> RepoResult<Vec<Task>> {
        let guard = self.tasks.read().await;
        Ok(guard
            .values()
            .filter(|t| t.status == TaskStatus::Processing)
            .filter(|t| t.last_run_at.map_or(true, |at| now - at >= threshold))
            .cloned()
            .collect())
    }

    async fn release(&self, id: TaskId, patch: TaskPatch) -> RepoResult<Task> {
        let mut guard = self.tasks.write().await;
        let task = guard
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        apply_patch(task, patch);
        Ok(task.clone())
    }
}
