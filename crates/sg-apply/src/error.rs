use sg_core::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("template generation failed for candidate '{candidate}': {reason}")]
    TemplateFailed { candidate: String, reason: String },

    #[error(transparent)]
    Rewrite(#[from] CoreError),
}

impl From<ApplyError> for CoreError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::TemplateFailed { .. } => {
                CoreError::new(ErrorKind::ValidationFailed, err.to_string())
            }
            ApplyError::Rewrite(core_error) => core_error,
        }
    }
}
