use sg_core::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("failed to read '{path}': {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("embedding backend error: {0}")]
    EmbeddingFailed(String),

    #[error("failed to enumerate project files: {0}")]
    ScanFailed(String),
}

impl From<DedupError> for CoreError {
    fn from(err: DedupError) -> Self {
        match &err {
            DedupError::ReadFailed { .. } => CoreError::new(ErrorKind::IoError, err.to_string()),
            DedupError::EmbeddingFailed(_) => {
                CoreError::new(ErrorKind::EnrichmentFailed, err.to_string())
            }
            DedupError::ScanFailed(_) => CoreError::new(ErrorKind::IoError, err.to_string()),
        }
    }
}
