//! External media tools used by the ingestion pipeline.
//!
//! Both tools are capabilities behind a trait so the orchestrator never deals
//! with process management, and tests can swap in in-process fakes.

pub mod probe;
pub mod remux;

pub use probe::{FfprobeTool, probe_geometry};
pub use remux::{FfmpegTool, faststart_path, processing_path, rewrite_for_streaming};

use crate::error::IngestError;
use crate::models::GeometryInfo;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;

/// Reads stream geometry from a local media file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<GeometryInfo, IngestError>;
}

/// Copies every stream of `input` into `output` with the container index
/// moved to the front of the file.
#[async_trait]
pub trait MediaRemux: Send + Sync {
    async fn remux_faststart(&self, input: &Path, output: &Path) -> Result<(), IngestError>;
}

/// Fails unless `path` names an existing regular file.
pub(crate) async fn ensure_regular_file(path: &Path) -> Result<(), IngestError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            IngestError::NotFound(format!("{} does not exist", path.display()))
        } else {
            IngestError::Internal(format!("unable to stat {}: {}", path.display(), e))
        }
    })?;

    if metadata.is_dir() {
        return Err(IngestError::InvalidInput(format!(
            "{} is a directory, expecting a file",
            path.display()
        )));
    }
    if !metadata.is_file() {
        return Err(IngestError::InvalidInput(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    Ok(())
}
