use super::{MediaProbe, ensure_regular_file};
use crate::error::IngestError;
use crate::models::GeometryInfo;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// `ffprobe` invoked with JSON stream output.
pub struct FfprobeTool {
    binary: String,
}

impl FfprobeTool {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl MediaProbe for FfprobeTool {
    async fn probe(&self, path: &Path) -> Result<GeometryInfo, IngestError> {
        let output = Command::new(&self.binary)
            .args(["-v", "error"])
            .args(["-print_format", "json"])
            .arg("-show_streams")
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                IngestError::ProbeFailed(format!("unable to run {}: {}", self.binary, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("{} failed on {}: {}", self.binary, path.display(), stderr);
            return Err(IngestError::ProbeFailed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        parse_probe_output(&output.stdout)
    }
}

/// Extracts the dimensions of the first video stream from ffprobe JSON.
pub fn parse_probe_output(stdout: &[u8]) -> Result<GeometryInfo, IngestError> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| IngestError::ProbeFailed(format!("unparsable probe output: {}", e)))?;

    parsed
        .streams
        .iter()
        .filter(|s| s.codec_type.as_deref() == Some("video"))
        .find_map(|s| match (s.width, s.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => {
                Some(GeometryInfo { width, height })
            }
            _ => None,
        })
        .ok_or_else(|| {
            IngestError::ProbeFailed("no video stream with dimensions found".to_string())
        })
}

/// Checks that `path` is a regular file, then asks `tool` for its geometry.
pub async fn probe_geometry(
    tool: &dyn MediaProbe,
    path: &Path,
) -> Result<GeometryInfo, IngestError> {
    ensure_regular_file(path).await?;
    let geometry = tool.probe(path).await?;
    tracing::debug!(
        "Probed {}: {}x{}",
        path.display(),
        geometry.width,
        geometry.height
    );
    Ok(geometry)
}
