use super::{MediaRemux, ensure_regular_file};
use crate::error::IngestError;
use crate::services::staging::StagedFile;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const PROCESSING_SUFFIX: &str = ".processing";
const FASTSTART_MARKER: &str = ".faststart";

/// `ffmpeg` stream copy with `-movflags faststart`.
pub struct FfmpegTool {
    binary: String,
}

impl FfmpegTool {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl MediaRemux for FfmpegTool {
    async fn remux_faststart(&self, input: &Path, output: &Path) -> Result<(), IngestError> {
        let result = Command::new(&self.binary)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-c", "copy"])
            .args(["-movflags", "faststart"])
            .args(["-f", "mp4"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                IngestError::RewriteFailed(format!("unable to run {}: {}", self.binary, e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::error!("{} failed on {}: {}", self.binary, input.display(), stderr);
            return Err(IngestError::RewriteFailed(format!(
                "{} exited with {}: {}",
                self.binary,
                result.status,
                stderr_tail(&stderr, 10)
            )));
        }
        Ok(())
    }
}

fn stderr_tail(stderr: &str, lines: usize) -> String {
    let all: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

/// Scratch output next to `path`, so the final rename never crosses filesystems.
pub fn processing_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(PROCESSING_SUFFIX);
    PathBuf::from(name)
}

/// `dir/name.ext` becomes `dir/name.faststart.ext`.
pub fn faststart_path(path: &Path) -> PathBuf {
    let mut name = path.file_stem().unwrap_or_default().to_os_string();
    name.push(FASTSTART_MARKER);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// Produces a streaming-friendly sibling of `path` and returns a guard over it.
///
/// The input is never touched. The result only appears at its final name
/// through an atomic rename. The scratch file is guarded from before the
/// remux starts, so it is removed on failure and on cancellation alike.
pub async fn rewrite_for_streaming(
    tool: &dyn MediaRemux,
    path: &Path,
) -> Result<StagedFile, IngestError> {
    ensure_regular_file(path).await?;

    let scratch = StagedFile::adopt(processing_path(path));
    tool.remux_faststart(path, scratch.path())
        .await
        .map_err(|e| match e {
            IngestError::RewriteFailed(_) => e,
            other => IngestError::RewriteFailed(other.to_string()),
        })?;

    let target = faststart_path(path);
    let rewritten = scratch.persist(target.clone()).map_err(|e| {
        IngestError::RewriteFailed(format!(
            "unable to move {} into place: {}",
            target.display(),
            e
        ))
    })?;

    tracing::debug!("Rewrote {} -> {}", path.display(), target.display());
    Ok(rewritten)
}
