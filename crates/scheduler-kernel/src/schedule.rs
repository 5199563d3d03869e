//! Schedule configuration shapes and the [`ScheduleCalculator`] contract.
//!
//! Per the microkernel split this crate follows: the trait lives here, the
//! concrete calculation (§4.4) lives in
//! `scheduler-foundation`, so kernel consumers never depend on a specific
//! date-math implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The `schedule_type` discriminant plus its type-specific configuration.
///
/// Exactly one variant is active per task; `end_date` / `max_occurrences`
/// are shared caps that apply to any recurring kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub kind: ScheduleKind,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_occurrences: Option<u32>,
}

impl ScheduleConfig {
    pub fn once(run_at: DateTime<Utc>) -> Self {
        Self {
            kind: ScheduleKind::Once { run_at },
            end_date: None,
            max_occurrences: None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self.kind, ScheduleKind::Once { .. })
    }
}

/// Type-specific schedule configuration (§6.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schedule_type", rename_all = "snake_case")]
pub enum ScheduleKind {
    Once {
        run_at: DateTime<Utc>,
    },
    Daily {
        hour: u32,
        minute: u32,
        #[serde(default)]
        interval_days: Option<u32>,
    },
    Weekly {
        /// 0 = Monday … 6 = Sunday.
        weekdays: Vec<u8>,
        hour: u32,
        minute: u32,
        #[serde(default)]
        interval_weeks: Option<u32>,
    },
    Monthly {
        day_of_month: u32,
        hour: u32,
        minute: u32,
        #[serde(default)]
        interval_months: Option<u32>,
    },
    Yearly {
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        #[serde(default)]
        interval_years: Option<u32>,
    },
    Custom {
        interval_minutes: u64,
    },
}

impl ScheduleKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Once { .. } => "once",
            Self::Daily { .. } => "daily",
            Self::Weekly { .. } => "weekly",
            Self::Monthly { .. } => "monthly",
            Self::Yearly { .. } => "yearly",
            Self::Custom { .. } => "custom",
        }
    }
}

/// The result of computing the next occurrence for a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextRun {
    /// The schedule fires again at this instant.
    At(DateTime<Utc>),
    /// The schedule has no further occurrences (one-shot already fired, or
    /// `end_date` / `max_occurrences` exhausted).
    Terminal,
}

/// Computes the next due instant for a schedule, given the instant the
/// previous run just completed at (the "anchor").
///
/// Implementations must be a pure function of `(kind, anchor, occurrence_count)`
/// — see the determinism property in §8.
pub trait ScheduleCalculator: Send + Sync {
    /// Compute the next run instant after `anchor`.
    ///
    /// `occurrence_count` is the number of times this schedule has already
    /// fired (0 before the first execution), used to enforce `max_occurrences`.
    fn next_run(
        &self,
        config: &ScheduleConfig,
        anchor: DateTime<Utc>,
        occurrence_count: u32,
    ) -> NextRun;
}
