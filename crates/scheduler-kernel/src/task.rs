//! The central [`Task`] entity and its supporting enums.
//!
//! Everything here is plain data — no I/O, no clock reads. The repository,
//! validator and calculator traits (see sibling modules) operate on these
//! types without owning them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque task identifier.
pub type TaskId = Uuid;

/// Opaque owner reference. The scheduler never interprets this beyond
/// equality comparison for ownership checks.
pub type UserId = Uuid;

/// What kind of thing a task represents, driving prompt-template selection
/// in the executor (see `scheduler-runtime::executor::prompt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Reminder,
    PeriodicTask,
    AutomatedTask,
    Custom,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Reminder => "reminder",
            Self::PeriodicTask => "periodic_task",
            Self::AutomatedTask => "automated_task",
            Self::Custom => "custom",
        };
        f.write_str(s)
    }
}

/// The lifecycle state of a [`Task`]. See the invariants in `DESIGN.md` /
/// §3 for which transitions are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Processing,
    Completed,
    Failed,
    Paused,
    Cancelled,
}

impl TaskStatus {
    /// Whether a task in this status must carry a non-null `next_run_at`.
    pub fn requires_next_run(&self) -> bool {
        matches!(self, Self::Active | Self::Processing)
    }
}

/// A notification channel the dispatcher can fan a result out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Sms,
    Email,
    Push,
    InApp,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
            Self::Push => "push",
            Self::InApp => "in_app",
        }
    }
}

impl std::str::FromStr for NotificationChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sms" => Ok(Self::Sms),
            "email" => Ok(Self::Email),
            "push" => Ok(Self::Push),
            "in_app" | "inapp" => Ok(Self::InApp),
            other => Err(format!("unknown notification channel: {other}")),
        }
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five binary indicators behind a response's quality score, plus the
/// derived machine-readable record consumed by dispatch/UX layers.
///
/// Each `true` flag contributes 0.2 to [`QualityAssessment::score`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct QualityFlags {
    pub acknowledgment: bool,
    pub actionable_advice: bool,
    pub structured_format: bool,
    pub supportive_tone: bool,
    pub substantial_response: bool,
}

impl QualityFlags {
    /// Sum of the five 0.2-weighted indicators, in `[0.0, 1.0]`.
    pub fn score(&self) -> f32 {
        let mut score = 0.0;
        for flag in [
            self.acknowledgment,
            self.actionable_advice,
            self.structured_format,
            self.supportive_tone,
            self.substantial_response,
        ] {
            if flag {
                score += 0.2;
            }
        }
        score
    }

    /// A response with `score >= 0.6` is considered high-quality.
    pub fn is_high_quality(&self) -> bool {
        self.score() >= 0.6
    }
}

/// Structured record extracted from an assessed response, independent of the
/// 0.2-weighted scoring above. Consumed by dispatch/UX layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInfo {
    pub has_acknowledgment: bool,
    pub has_actions: bool,
    pub has_summary: bool,
    pub has_encouragement: bool,
    pub is_structured: bool,
    pub response_length: usize,
}

/// The full result of assessing one Agent response (§4.8.3 / §4.8.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub flags: QualityFlags,
    pub extracted: ExtractedInfo,
}

impl QualityAssessment {
    pub fn score(&self) -> f32 {
        self.flags.score()
    }
}

/// The central persisted record the whole engine revolves around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub task_type: TaskType,
    pub schedule: crate::schedule::ScheduleConfig,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub notification_channels: Vec<NotificationChannel>,
    pub ai_context: Option<String>,
    pub last_result: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub quality: Option<QualityAssessment>,
    pub delivery_warnings: Vec<NotificationChannel>,
    /// Number of times this schedule has already fired; feeds `max_occurrences`.
    pub occurrence_count: u32,
}

impl Task {
    /// Whether `schedule.kind` is [`ScheduleKind::Once`].
    pub fn is_one_shot(&self) -> bool {
        matches!(
            self.schedule.kind,
            crate::schedule::ScheduleKind::Once { .. }
        )
    }
}

/// A partial update applied by [`crate::repository::TaskRepository::update`]
/// or the management API's `Update` operation. `None` fields are left
/// untouched; `Some(None)` clears an `Option` field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub schedule: Option<crate::schedule::ScheduleConfig>,
    pub notification_channels: Option<Vec<NotificationChannel>>,
    pub ai_context: Option<Option<String>>,
    pub max_retries: Option<u32>,
    pub status: Option<TaskStatus>,
    pub next_run_at: Option<Option<DateTime<Utc>>>,
    pub last_run_at: Option<Option<DateTime<Utc>>>,
    pub last_result: Option<Option<String>>,
    pub retry_count: Option<u32>,
    pub quality: Option<Option<QualityAssessment>>,
    pub delivery_warnings: Option<Vec<NotificationChannel>>,
    pub occurrence_count: Option<u32>,
}

impl TaskPatch {
    /// Whether this patch touches any field that drives `next_run_at`
    /// recomputation (schedule shape changed, not just status/result bookkeeping).
    pub fn changes_schedule(&self) -> bool {
        self.schedule.is_some()
    }
}

/// A narrowing filter for [`crate::repository::TaskRepository::list_by_user`].
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub task_type: Option<TaskType>,
    pub limit: Option<u32>,
}
