use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure kinds produced while ingesting or serving media.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payload too large: {0}")]
    TooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    #[error("Rewrite failed: {0}")]
    RewriteFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IngestError {
    /// True for failures caused by the request itself rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IngestError::InvalidInput(_)
                | IngestError::Unauthorized(_)
                | IngestError::UnsupportedMediaType(_)
                | IngestError::TooLarge(_)
        )
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;

/// States of a single video ingestion, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStage {
    Received,
    Staged,
    Probed,
    Classified,
    Rewritten,
    Uploaded,
    Finalized,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Received => "received",
            IngestStage::Staged => "staged",
            IngestStage::Probed => "probed",
            IngestStage::Classified => "classified",
            IngestStage::Rewritten => "rewritten",
            IngestStage::Uploaded => "uploaded",
            IngestStage::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// Terminal failure of an ingestion: the stage that could not be reached and why.
#[derive(Error, Debug)]
#[error("ingestion failed before reaching '{stage}': {source}")]
pub struct StageError {
    pub stage: IngestStage,
    #[source]
    pub source: IngestError,
}

impl StageError {
    pub fn new(stage: IngestStage, source: IngestError) -> Self {
        Self { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classes() {
        assert!(IngestError::InvalidInput("x".into()).is_client_error());
        assert!(IngestError::TooLarge("x".into()).is_client_error());
        assert!(IngestError::UnsupportedMediaType("x".into()).is_client_error());
        assert!(IngestError::Unauthorized("x".into()).is_client_error());
        assert!(!IngestError::ProbeFailed("x".into()).is_client_error());
        assert!(!IngestError::UploadFailed("x".into()).is_client_error());
        assert!(!IngestError::NotFound("x".into()).is_client_error());
    }

    #[test]
    fn test_stage_error_message() {
        let err = StageError::new(
            IngestStage::Rewritten,
            IngestError::RewriteFailed("moov atom not found".into()),
        );
        let msg = err.to_string();
        assert!(msg.contains("rewritten"));
        assert!(msg.contains("moov atom not found"));
    }
}
