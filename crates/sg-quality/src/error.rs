use sg_core::{CoreError, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QualityError {
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("metrics store operation failed: {reason}")]
    StoreFailed { reason: String },

    #[error(transparent)]
    Executor(#[from] CoreError),
}

impl From<QualityError> for CoreError {
    fn from(err: QualityError) -> Self {
        match err {
            QualityError::ReadFailed { .. } => CoreError::new(ErrorKind::IoError, err.to_string()),
            QualityError::StoreFailed { .. } => {
                CoreError::new(ErrorKind::IoError, err.to_string())
            }
            QualityError::Executor(core_error) => core_error,
        }
    }
}
