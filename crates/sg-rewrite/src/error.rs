use sg_core::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("failed to read '{path}': {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    WriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax validation failed for '{path}': {errors:?}")]
    ValidationFailed {
        path: std::path::PathBuf,
        errors: Vec<String>,
    },

    #[error("apply failed ({apply_error}) and rollback also failed: {rollback_error}")]
    RollbackAlsoFailed {
        apply_error: String,
        rollback_error: String,
    },

    #[error(transparent)]
    Backup(#[from] CoreError),
}

impl From<RewriteError> for CoreError {
    fn from(err: RewriteError) -> Self {
        match err {
            RewriteError::ReadFailed { .. } | RewriteError::WriteFailed { .. } => {
                CoreError::new(ErrorKind::IoError, err.to_string())
            }
            RewriteError::ValidationFailed { .. } => {
                CoreError::new(ErrorKind::ValidationFailed, err.to_string())
            }
            RewriteError::RollbackAlsoFailed { .. } => {
                CoreError::new(ErrorKind::RollbackFailed, err.to_string())
            }
            RewriteError::Backup(core_error) => core_error,
        }
    }
}
