use sg_core::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("failed to read '{path}': {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write backup: {0}")]
    WriteFailed(std::io::Error),

    #[error("backup '{0}' not found")]
    NotFound(String),

    #[error("manifest for backup '{0}' is corrupt: {1}")]
    CorruptManifest(String, serde_json::Error),
}

impl From<BackupError> for CoreError {
    fn from(err: BackupError) -> Self {
        match &err {
            BackupError::ReadFailed { .. } | BackupError::WriteFailed(_) => {
                CoreError::new(ErrorKind::BackupFailed, err.to_string())
            }
            BackupError::NotFound(_) => CoreError::new(ErrorKind::BackupFailed, err.to_string()),
            BackupError::CorruptManifest(_, _) => {
                CoreError::new(ErrorKind::BackupFailed, err.to_string())
            }
        }
    }
}
