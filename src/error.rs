use std::path::PathBuf;
use thiserror::Error;

use crate::adapter::{DefinitionError, ResponseError};
use crate::template::UnresolvedPlaceholder;

/// Why a single task failed
///
/// None of these abort the batch; the orchestrator records the error on the
/// task's outcome and moves on to the next input.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid adapter definition: {0}")]
    Definition(#[from] DefinitionError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("response status code {status} is not expected. resp: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error("object store error: {0}")]
    Storage(#[from] object_store::Error),
}

impl From<UnresolvedPlaceholder> for UploadError {
    fn from(err: UnresolvedPlaceholder) -> Self {
        UploadError::Definition(DefinitionError::Unresolved(err))
    }
}

impl UploadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        UploadError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;
