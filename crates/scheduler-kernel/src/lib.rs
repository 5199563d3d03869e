//! Core contracts for the AI Task Scheduler.
//!
//! Per the kernel/foundation/runtime split: trait definitions and plain
//! data types live here; concrete implementations (repository backends,
//! the schedule calculator, the time parser) live in `scheduler-foundation`,
//! and the orchestration (poller, executor, dispatcher) lives in
//! `scheduler-runtime`. Nothing in this crate depends on tokio's I/O
//! drivers, `sqlx`, or any concrete date-math crate — it is pure contract.

pub mod agent;
pub mod clock;
pub mod error;
pub mod notify;
pub mod repository;
pub mod schedule;
pub mod task;
pub mod time;

pub mod prelude {
    pub use crate::agent::Agent;
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::error::{
        AgentError as KernelAgentError, ParseError, RepositoryError, TaskManagerError,
        ValidationError, ValidationIssue,
    };
    pub use crate::notify::{DispatchError, NotificationSink};
    pub use crate::repository::{ClaimOutcome, RepoResult, TaskRepository};
    pub use crate::schedule::{NextRun, ScheduleCalculator, ScheduleConfig, ScheduleKind};
    pub use crate::task::{
        ExtractedInfo, NotificationChannel, QualityAssessment, QualityFlags, Task, TaskFilter,
        TaskId, TaskPatch, TaskStatus, TaskType, UserId,
    };
    pub use crate::time::TimeParser;
}
