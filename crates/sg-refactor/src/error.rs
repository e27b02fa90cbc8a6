use sg_core::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefactorError {
    #[error("rename would conflict: {0}")]
    Conflict(String),

    #[error("selection crosses a control-flow boundary: {0}")]
    InvalidSelection(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Rewrite(#[from] CoreError),
}

impl From<RefactorError> for CoreError {
    fn from(err: RefactorError) -> Self {
        match err {
            RefactorError::Conflict(_) => CoreError::new(ErrorKind::ConflictDetected, err.to_string()),
            RefactorError::InvalidSelection(_) => {
                CoreError::new(ErrorKind::ValidationFailed, err.to_string())
            }
            RefactorError::Io(e) => CoreError::new(ErrorKind::IoError, e.to_string()),
            RefactorError::Rewrite(core_error) => core_error,
        }
    }
}
