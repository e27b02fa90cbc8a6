//! Executor-local failure modes, mapped onto [`sg_core::ErrorKind`] at the
//! boundary where a result leaves this crate.

use sg_core::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("matcher binary '{0}' could not be spawned: {1}")]
    MatcherMissing(String, std::io::Error),

    #[error("matcher exited with status {status}: {stderr}")]
    MatcherFailed { status: i32, stderr: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation cancelled")]
    Cancelled,
}

impl From<ExecutorError> for CoreError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::MatcherMissing(bin, io) => CoreError::new(
                ErrorKind::MatcherMissing,
                format!("could not spawn matcher binary '{bin}': {io}"),
            ),
            ExecutorError::MatcherFailed { status, stderr } => CoreError::new(
                ErrorKind::MatcherFailed,
                format!("matcher exited with status {status}: {stderr}"),
            ),
            ExecutorError::Io(io) => CoreError::new(ErrorKind::IoError, io.to_string()),
            ExecutorError::Cancelled => {
                CoreError::new(ErrorKind::CancelRequested, "operation cancelled")
            }
        }
    }
}
