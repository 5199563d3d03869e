//! The [`TaskRepository`] contract (§4.2). Concrete backends (in-memory,
//! SQLite) live in `scheduler-foundation`; this crate only describes the
//! shape every backend must honor, in particular the atomic claim.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RepositoryError;
use crate::task::{Task, TaskFilter, TaskId, TaskPatch, UserId};

pub type RepoResult<T> = Result<T, RepositoryError>;

/// The outcome of [`TaskRepository::claim_for_processing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller won the compare-and-set; it now exclusively owns the task
    /// until it calls [`TaskRepository::release`].
    Claimed,
    /// Another worker (or a residual claim from before a crash) already holds
    /// this task. The caller must abandon silently (§4.8.1 step 1).
    AlreadyClaimed,
}

/// Durable storage for [`Task`]s (§4.2).
///
/// `claim_for_processing` is the single point that enforces at-most-one
/// concurrent execution per task id (testable property 4 in §8) —
/// backends MUST implement it as an atomic compare-and-set, not a
/// read-then-write.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert(&self, task: Task) -> RepoResult<TaskId>;

    async fn get(&self, id: TaskId) -> RepoResult<Task>;

    /// Apply `patch` to the task identified by `id`. Ownership is not
    /// enforced here — callers (`TaskManager`) check `user_id` themselves.
    async fn update(&self, id: TaskId, patch: TaskPatch) -> RepoResult<Task>;

    async fn delete(&self, id: TaskId) -> RepoResult<()>;

    /// Tasks owned by `user_id`, narrowed by `filter`, ordered by
    /// `next_run_at` ascending.
    async fn list_by_user(&self, user_id: UserId, filter: TaskFilter) -> RepoResult<Vec<Task>>;

    /// `active` tasks whose `next_run_at <= instant`, ordered ascending,
    /// bounded to `limit` results.
    async fn due_before(&self, instant: DateTime<Utc>, limit: u32) -> RepoResult<Vec<Task>>;

    /// Atomic `active -> processing` compare-and-set, stamping
    /// `last_run_at = now`.
    async fn claim_for_processing(&self, id: TaskId, now: DateTime<Utc>) -> RepoResult<ClaimOutcome>;

    /// Tasks stuck in `processing` with `last_run_at` older than `threshold`
    /// ago (relative to `now`).
    async fn find_stuck(
        &self,
        now: DateTime<Utc>,
        threshold: chrono::Duration,
    ) -> RepoResult<Vec<Task>>;

    /// End-of-execution transition: apply `patch` (including the new
    /// `status`) to a task this caller currently holds the claim on.
    async fn release(&self, id: TaskId, patch: TaskPatch) -> RepoResult<Task>;
}
