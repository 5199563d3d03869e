//! The CLI's own error type. Management API errors (`TaskManagerError`) are
//! wrapped rather than flattened, so a caller piping JSON output can still
//! distinguish validation issues from not-found from I/O.

use scheduler_kernel::error::TaskManagerError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    TaskManager(#[from] TaskManagerError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type CliResult<T> = Result<T, CliError>;
