//! TaskManager (C6, §4.6) — the CRUD facade over Repository/Validator/
//! TimeParser/ScheduleCalculator that higher layers consume.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use scheduler_kernel::clock::Clock;
use scheduler_kernel::error::TaskManagerError;
use scheduler_kernel::repository::TaskRepository;
use scheduler_kernel::schedule::{NextRun, ScheduleCalculator, ScheduleConfig};
use scheduler_kernel::task::{
    NotificationChannel, Task, TaskFilter, TaskId, TaskPatch, TaskStatus, TaskType, UserId,
};
use scheduler_kernel::time::TimeParser;
use scheduler_foundation::validator::TaskValidator;
use tracing::debug;
use uuid::Uuid;

pub type TaskManagerResult<T> = Result<T, TaskManagerError>;

pub struct TaskManager {
    repository: Arc<dyn TaskRepository>,
    calculator: Arc<dyn ScheduleCalculator>,
    time_parser: Arc<dyn TimeParser>,
    validator: TaskValidator,
    clock: Arc<dyn Clock>,
    default_max_retries: u32,
}

impl TaskManager {
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        calculator: Arc<dyn ScheduleCalculator>,
        time_parser: Arc<dyn TimeParser>,
        validator: TaskValidator,
        clock: Arc<dyn Clock>,
        default_max_retries: u32,
    ) -> Self {
        Self {
            repository,
            calculator,
            time_parser,
            validator,
            clock,
            default_max_retries,
        }
    }

    /// `CreateReminder(user_id, text, time, channel)`: schedule_type forced
    /// to `once`, time resolved through the TimeParser.
    pub async fn create_reminder(
        &self,
        user_id: UserId,
        text: impl Into<String>,
        time: &str,
        channel: NotificationChannel,
    ) -> TaskManagerResult<Task> {
        let now = self.clock.now();
        let run_at = self.time_parser.parse(time, now)?;
        let schedule = ScheduleConfig::once(run_at);

        let task = Task {
            id: Uuid::new_v4(),
            user_id,
            title: text.into(),
            description: None,
            task_type: TaskType::Reminder,
            schedule,
            next_run_at: Some(run_at),
            last_run_at: None,
            status: TaskStatus::Active,
            notification_channels: vec![channel],
            ai_context: None,
            last_result: None,
            retry_count: 0,
            max_retries: self.default_max_retries,
            created_at: now,
            updated_at: now,
            quality: None,
            delivery_warnings: Vec::new(),
            occurrence_count: 0,
        };

        self.insert_validated(task, now).await
    }

    /// `CreateTask(...)`: `next_run_at` computed from `Clock.Now()` via the
    /// ScheduleCalculator (occurrence_count 0).
    #[allow(clippy::too_many_arguments)]
    pub async fn create_task(
        &self,
        user_id: UserId,
        title: impl Into<String>,
        description: Option<String>,
        task_type: TaskType,
        schedule: ScheduleConfig,
        notification_channels: Vec<NotificationChannel>,
        ai_context: Option<String>,
        max_retries: Option<u32>,
    ) -> TaskManagerResult<Task> {
        let now = self.clock.now();
        let next_run_at = match self.calculator.next_run(&schedule, now, 0) {
            NextRun::At(at) => Some(at),
            NextRun::Terminal => None,
        };

        let task = Task {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description,
            task_type,
            schedule,
            next_run_at,
            last_run_at: None,
            status: if next_run_at.is_some() { TaskStatus::Active } else { TaskStatus::Completed },
            notification_channels,
            ai_context,
            last_result: None,
            retry_count: 0,
            max_retries: max_retries.unwrap_or(self.default_max_retries),
            created_at: now,
            updated_at: now,
            quality: None,
            delivery_warnings: Vec::new(),
            occurrence_count: 0,
        };

        self.insert_validated(task, now).await
    }

    /// `List(user_id, filter)`.
    pub async fn list(&self, user_id: UserId, filter: TaskFilter) -> TaskManagerResult<Vec<Task>> {
        Ok(self.repository.list_by_user(user_id, filter).await?)
    }

    /// `Update(user_id, id, patch)`: ownership verified before write;
    /// `next_run_at` is recomputed only when the patch changes the
    /// schedule shape, or transitions status `paused -> active` (§10).
    pub async fn update(&self, user_id: UserId, id: TaskId, mut patch: TaskPatch) -> TaskManagerResult<Task> {
        let now = self.clock.now();
        let existing = self.get_owned(user_id, id).await?;

        self.validator.validate_patch(&patch, now).map_err(TaskManagerError::Validation)?;

        let resuming = existing.status == TaskStatus::Paused && patch.status == Some(TaskStatus::Active);
        if patch.changes_schedule() || resuming {
            let schedule = patch.schedule.clone().unwrap_or_else(|| existing.schedule.clone());
            let next_run_at = match self.calculator.next_run(&schedule, now, existing.occurrence_count) {
                NextRun::At(at) => Some(at),
                NextRun::Terminal => None,
            };
            patch.next_run_at = Some(next_run_at);
        }

        let updated = self.repository.update(id, patch).await?;
        Ok(updated)
    }

    /// `Delete(user_id, id)`: idempotent — deleting an already-absent task
    /// owned by `user_id` is not an error.
    pub async fn delete(&self, user_id: UserId, id: TaskId) -> TaskManagerResult<()> {
        match self.get_owned(user_id, id).await {
            Ok(_) => {
                self.repository.delete(id).await?;
                Ok(())
            }
            Err(TaskManagerError::NotFound) => Ok(()),
            Err(other) => Err(other),
        }
    }

    /// `CalculateNextRun(schedule_type, schedule_config)`: preview without
    /// persisting, exposed both here and as `ScheduleCalculator::next_run`
    /// directly for callers that don't need a TaskManager at all (§10).
    pub fn calculate_next_run(&self, schedule: &ScheduleConfig, anchor: DateTime<Utc>, occurrence_count: u32) -> NextRun {
        self.calculator.next_run(schedule, anchor, occurrence_count)
    }

    /// Ownership is enforced by matching `user_id`; any mismatch is reported
    /// as `not-found`, never `forbidden`, to avoid leaking existence (§4.6).
    async fn get_owned(&self, user_id: UserId, id: TaskId) -> TaskManagerResult<Task> {
        let task = self.repository.get(id).await.map_err(|_| TaskManagerError::NotFound)?;
        if task.user_id != user_id {
            return Err(TaskManagerError::NotFound);
        }
        Ok(task)
    }

    async fn insert_validated(&self, task: Task, now: DateTime<Utc>) -> TaskManagerResult<Task> {
        if let Err(err) = self.validator.validate_new(&task, now, false) {
            debug!(issues = ?err.issues, "task rejected by validator");
            return Err(TaskManagerError::Validation(err));
        }
        self.repository.insert(task.clone()).await?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_foundation::{DefaultScheduleCalculator, DefaultTimeParser, InMemoryTaskRepository};
    use scheduler_kernel::clock::SystemClock;
    use scheduler_kernel::schedule::ScheduleKind;

    fn manager() -> TaskManager {
        TaskManager::new(
            Arc::new(InMemoryTaskRepository::new()),
            Arc::new(DefaultScheduleCalculator),
            Arc::new(DefaultTimeParser),
            TaskValidator::default(),
            Arc::new(SystemClock),
            3,
        )
    }

    #[tokio::test]
    async fn create_reminder_forces_schedule_once() {
        let mgr = manager();
        let user_id = Uuid::new_v4();
        let task = mgr
            .create_reminder(user_id, "Drink water", "in 1 hour", NotificationChannel::Push)
            .await
            .unwrap();
        assert!(matches!(task.schedule.kind, ScheduleKind::Once { .. }));
        assert_eq!(task.task_type, TaskType::Reminder);
    }

    #[tokio::test]
    async fn create_reminder_rejects_unparseable_time() {
        let mgr = manager();
        let user_id = Uuid::new_v4();
        let err = mgr
            .create_reminder(user_id, "Drink water", "whenever", NotificationChannel::Push)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskManagerError::Parse(_)));
    }

    #[tokio::test]
    async fn update_by_non_owner_is_not_found() {
        let mgr = manager();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let task = mgr
            .create_reminder(owner, "Stretch", "in 1 hour", NotificationChannel::Push)
            .await
            .unwrap();

        let err = mgr
            .update(intruder, task.id, TaskPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskManagerError::NotFound));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let mgr = manager();
        let user_id = Uuid::new_v4();
        let task = mgr
            .create_reminder(user_id, "Stretch", "in 1 hour", NotificationChannel::Push)
            .await
            .unwrap();

        mgr.delete(user_id, task.id).await.unwrap();
        mgr.delete(user_id, task.id).await.unwrap();
    }

    #[tokio::test]
    async fn update_recomputes_next_run_when_schedule_changes() {
        let mgr = manager();
        let user_id = Uuid::new_v4();
        let task = mgr
            .create_reminder(user_id, "Stretch", "in 1 hour", NotificationChannel::Push)
            .await
            .unwrap();

        let new_schedule = ScheduleConfig {
            kind: ScheduleKind::Daily {
                hour: 9,
                minute: 0,
                interval_days: None,
            },
            end_date: None,
            max_occurrences: None,
        };
        let updated = mgr
            .update(
                user_id,
                task.id,
                TaskPatch {
                    schedule: Some(new_schedule),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.next_run_at.is_some());
        assert_ne!(updated.next_run_at, task.next_run_at);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let mgr = manager();
        let user_id = Uuid::new_v4();
        mgr.create_reminder(user_id, "A", "in 1 hour", NotificationChannel::Push).await.unwrap();
        let filter = TaskFilter {
            status: Some(TaskStatus::Active),
            ..Default::default()
        };
        let tasks = mgr.list(user_id, filter).await.unwrap();
        assert_eq!(tasks.len(), 1);
    }
}
