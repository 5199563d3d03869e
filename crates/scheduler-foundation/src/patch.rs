//! Shared [`TaskPatch`] application logic, used by every repository backend
//! so the `Option<Option<T>>` clearing semantics (§10)
//! are implemented exactly once.

use chrono::Utc;
use scheduler_kernel::task::{Task, TaskPatch};

/// Applies `patch` onto `task` in place and stamps `updated_at`. This is a
/// row-bookkeeping timestamp (like a DB trigger's `updated_at`), not a
/// business-logic clock read, so it does not go through `Clock`.
pub fn apply_patch(task: &mut Task, patch: TaskPatch) {
    if let Some(title) = patch.title {
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(schedule) = patch.schedule {
        task.schedule = schedule;
    }
    if let Some(channels) = patch.notification_channels {
        task.notification_channels = channels;
    }
    if let Some(ai_context) = patch.ai_context {
        task.ai_context = ai_context;
    }
    if let Some(max_retries) = patch.max_retries {
        task.max_retries = max_retries;
    }
    if let Some(status) = patch.status {
        task.status = status;
    }
    if let Some(next_run_at) = patch.next_run_at {
        task.next_run_at = next_run_at;
    }
    if let Some(last_run_at) = patch.last_run_at {
        task.last_run_at = last_run_at;
    }
    if let Some(last_result) = patch.last_result {
        task.last_result = last_result;
    }
    if let Some(retry_count) = patch.retry_count {
        task.retry_count = retry_count;
    }
    if let Some(quality) = patch.quality {
        task.quality = quality;
    }
    if let Some(delivery_warnings) = patch.delivery_warnings {
        task.delivery_warnings = delivery_warnings;
    }
    if let Some(occurrence_count) = patch.occurrence_count {
        task.occurrence_count = occurrence_count;
    }
    task.updated_at = Utc::now();
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler_kernel::schedule::ScheduleConfig;
    use scheduler_kernel::task::{NotificationChannel, TaskStatus, TaskType};
    use uuid::Uuid;

    fn task() -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Original".into(),
            description: Some("keep me".into()),
            task_type: TaskType::Reminder,
            schedule: ScheduleConfig::once(now),
            next_run_at: Some(now),
            last_run_at: None,
            status: TaskStatus::Active,
            notification_channels: vec![NotificationChannel::Email],
            ai_context: Some("ctx".into()),
            last_result: None,
            retry_count: 0,
            max_retries: 3,
            created_at: now,
            updated_at: now,
            quality: None,
            delivery_warnings: Vec::new(),
            occurrence_count: 0,
        }
    }

    #[test]
    fn untouched_fields_survive() {
        let mut t = task();
        apply_patch(&mut t, TaskPatch::default());
        assert_eq!(t.title, "Original");
        assert_eq!(t.description, Some("keep me".into()));
    }

    #[test]
    fn some_none_clears_optional_field() {
        let mut t = task();
        apply_patch(
            &mut t,
            TaskPatch {
                description: Some(None),
                ..Default::default()
            },
        );
        assert_eq!(t.description, None);
    }

    #[test]
    fn some_some_sets_optional_field() {
        let mut t = task();
        apply_patch(
            &mut t,
            TaskPatch {
                ai_context: Some(Some("new ctx".into())),
                ..Default::default()
            },
        );
        assert_eq!(t.ai_context, Some("new ctx".into()));
    }

    #[test]
    fn title_change_applies() {
        let mut t = task();
        apply_patch(
            &mut t,
            TaskPatch {
                title: Some("Renamed".into()),
                ..Default::default()
            },
        );
        assert_eq!(t.title, "Renamed");
    }
}
