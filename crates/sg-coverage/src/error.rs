use sg_core::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("failed to enumerate test files under '{root}': {source}")]
    GlobFailed { root: String, source: String },

    #[error("failed to read '{path}': {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },
}

impl From<CoverageError> for CoreError {
    fn from(err: CoverageError) -> Self {
        CoreError::new(ErrorKind::IoError, err.to_string())
    }
}
