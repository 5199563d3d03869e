//! The error taxonomy from §7, one enum per subsystem
//! boundary so callers can match narrowly instead of on one god-enum.

use thiserror::Error;

/// One field-bound validation failure, with a stable machine-readable `code`
/// alongside the human-readable `message` (§10).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A non-empty list of [`ValidationIssue`]s. Never retried by callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("validation failed: {} issue(s)", issues.len())]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![ValidationIssue::new(field, code, message)])
    }
}

/// Raised by [`crate::time::TimeParser`] when input can't be resolved.
/// The engine never silently guesses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("could not parse time from {offending_token:?}: {reason}")]
pub struct ParseError {
    pub offending_token: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(offending_token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            offending_token: offending_token.into(),
            reason: reason.into(),
        }
    }
}

/// Unexpected persistence failure. Surfaced to callers of the management
/// API; logged and swallowed by background loops (Poller/Executor).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("optimistic update conflict on {0}")]
    Conflict(String),
    #[error("persistence error: {0}")]
    Other(String),
}

/// External Agent invocation failure (timeout or execution error).
/// Triggers the retry policy (§4.8.1).
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
    #[error("agent execution failed: {0}")]
    ExecutionFailed(String),
}

/// The composite error surfaced by `TaskManager` operations (§4.6).
#[derive(Debug, Error)]
pub enum TaskManagerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("task not found")]
    NotFound,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
