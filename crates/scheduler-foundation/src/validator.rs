//! Concrete [`Validator`] (C5, §4.5): task-shape invariants enforced before
//! a `Task` is ever persisted or patched.
//!
//! Kernel has no `Validator` trait of its own — validation is a pure
//! function of already-built kernel types, so it lives entirely here as a
//! free function plus a thin struct for callers that want to inject a
//! different grace window or title limit (e.g. in tests).

use chrono::{DateTime, Duration, Utc};
use scheduler_kernel::error::{ValidationError, ValidationIssue};
use scheduler_kernel::schedule::ScheduleKind;
use scheduler_kernel::task::{NotificationChannel, Task, TaskPatch};

const DEFAULT_TITLE_MAX_LEN: usize = 1024;
const DEFAULT_PAST_GRACE: Duration = Duration::seconds(60);

/// Validates tasks per §4.5. The grace window and title
/// length cap are configurable; production code should build this from
/// `SchedulerConfig` rather than `Default`.
#[derive(Debug, Clone, Copy)]
pub struct TaskValidator {
    pub title_max_len: usize,
    pub past_grace: Duration,
}

impl Default for TaskValidator {
    fn default() -> Self {
        Self {
            title_max_len: DEFAULT_TITLE_MAX_LEN,
            past_grace: DEFAULT_PAST_GRACE,
        }
    }
}

impl TaskValidator {
    pub fn new(title_max_len: usize, past_grace: Duration) -> Self {
        Self {
            title_max_len,
            past_grace,
        }
    }

    /// Validates a freshly built `Task` prior to insertion. `now` drives the
    /// past-schedule grace check; `allow_past` is set by callers recomputing
    /// a missed occurrence, where a past `next_run_at` is expected.
    pub fn validate_new(&self, task: &Task, now: DateTime<Utc>, allow_past: bool) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        self.check_title(&task.title, &mut issues);
        self.check_channels(&task.notification_channels, &mut issues);
        self.check_schedule_shape(&task.schedule.kind, &mut issues);
        if !allow_past {
            self.check_next_run_not_past(task.next_run_at, now, &mut issues);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }

    /// Validates only the fields a [`TaskPatch`] actually touches, so an
    /// update that leaves `title` untouched doesn't re-reject a title that
    /// was valid when the task was created under looser rules.
    pub fn validate_patch(&self, patch: &TaskPatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if let Some(title) = &patch.title {
            self.check_title(title, &mut issues);
        }
        if let Some(channels) = &patch.notification_channels {
            self.check_channels(channels, &mut issues);
        }
        if let Some(schedule) = &patch.schedule {
            self.check_schedule_shape(&schedule.kind, &mut issues);
        }
        if let Some(Some(next_run_at)) = patch.next_run_at {
            self.check_next_run_not_past(Some(next_run_at), now, &mut issues);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }

    fn check_title(&self, title: &str, issues: &mut Vec<ValidationIssue>) {
        if title.trim().is_empty() {
            issues.push(ValidationIssue::new("title", "title_empty", "title must not be empty"));
        } else if title.len() > self.title_max_len {
            issues.push(ValidationIssue::new(
                "title",
                "title_too_long",
                format!("title exceeds {} characters", self.title_max_len),
            ));
        }
    }

    fn check_channels(&self, channels: &[NotificationChannel], issues: &mut Vec<ValidationIssue>) {
        if channels.is_empty() {
            issues.push(ValidationIssue::new(
                "notification_channels",
                "channels_empty",
                "at least one notification channel is required",
            ));
        }
    }

    fn check_schedule_shape(&self, kind: &ScheduleKind, issues: &mut Vec<ValidationIssue>) {
        match kind {
            ScheduleKind::Weekly { weekdays, .. } => {
                if weekdays.is_empty() {
                    issues.push(ValidationIssue::new(
                        "schedule.weekdays",
                        "schedule_mismatch",
                        "weekly schedule requires at least one weekday",
                    ));
                } else if weekdays.iter().any(|d| *d > 6) {
                    issues.push(ValidationIssue::new(
                        "schedule.weekdays",
                        "schedule_mismatch",
                        "weekday must be in 0..=6 (0 = Monday)",
                    ));
                }
            }
            ScheduleKind::Monthly { day_of_month, .. } => {
                if !(1..=31).contains(day_of_month) {
                    issues.push(ValidationIssue::new(
                        "schedule.day_of_month",
                        "schedule_mismatch",
                        "day_of_month must be in 1..=31",
                    ));
                }
            }
            ScheduleKind::Yearly { month, day, .. } => {
                if !(1..=12).contains(month) {
                    issues.push(ValidationIssue::new(
                        "schedule.month",
                        "schedule_mismatch",
                        "month must be in 1..=12",
                    ));
                }
                if !(1..=31).contains(day) {
                    issues.push(ValidationIssue::new(
                        "schedule.day",
                        "schedule_mismatch",
                        "day must be in 1..=31",
                    ));
                }
            }
            ScheduleKind::Custom { interval_minutes } => {
                if *interval_minutes == 0 {
                    issues.push(ValidationIssue::new(
                        "schedule.interval_minutes",
                        "schedule_mismatch",
                        "custom interval must be greater than zero",
                    ));
                }
            }
            ScheduleKind::Once { .. } | ScheduleKind::Daily { .. } => {}
        }
    }

    fn check_next_run_not_past(
        &self,
        next_run_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if let Some(next_run_at) = next_run_at {
            if next_run_at < now - self.past_grace {
                issues.push(ValidationIssue::new(
                    "next_run_at",
                    "next_run_in_past",
                    "next_run_at is further in the past than the grace window allows",
                ));
            }
        }
    }
}
