use crate::error::IngestError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Prefix of every file created by [`StagedFile::stage`].
pub const STAGING_PREFIX: &str = "tubely-upload-";

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Exclusive ownership of a local file for the duration of one request.
///
/// Backed by a [`TempPath`], so the file is removed when the guard is
/// dropped, including when the owning future is cancelled.
/// [`StagedFile::keep`] is the only way to leave it on disk.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    size: u64,
}

impl StagedFile {
    /// Copies `reader` into a fresh file under `dir`, named `<prefix><random>.<extension>`.
    ///
    /// Fails with `TooLarge` as soon as more than `max_size` bytes have been read.
    pub async fn stage<R>(
        dir: &Path,
        extension: &str,
        reader: R,
        max_size: u64,
    ) -> Result<Self, IngestError>
    where
        R: AsyncRead + Unpin,
    {
        let suffix = format!(".{}", extension);
        let (file, path) = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|e| {
                IngestError::Internal(format!(
                    "Could not allocate temp file in {}: {}",
                    dir.display(),
                    e
                ))
            })?
            .into_parts();

        let mut staged = Self { path, size: 0 };
        let mut file = tokio::fs::File::from_std(file);
        staged.size = copy_capped(reader, &mut file, max_size).await?;
        Ok(staged)
    }

    /// Takes ownership of a file that already exists (or is about to).
    pub fn adopt(path: PathBuf) -> Self {
        Self {
            path: TempPath::from_path(path),
            size: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written by [`StagedFile::stage`]; zero for adopted files.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Renames the file to `target` and keeps guarding it there.
    ///
    /// No await point separates the rename from the new guard. On failure
    /// the file is removed from its old location.
    pub fn persist(self, target: PathBuf) -> std::io::Result<Self> {
        let size = self.size;
        self.path.persist(&target).map_err(|e| e.error)?;
        Ok(Self {
            path: TempPath::from_path(target),
            size,
        })
    }

    /// Disarms the guard and hands the path back to the caller.
    pub fn keep(self) -> Result<PathBuf, IngestError> {
        self.path.keep().map_err(|e| {
            IngestError::Internal(format!("Could not keep {}: {}", e.path.display(), e.error))
        })
    }

    /// Removes the file now instead of at the end of the scope.
    pub fn release(self) {
        let path = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => tracing::debug!("Removed staged file {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove staged file {}: {}", path.display(), e),
        }
    }
}

/// Streams `reader` into `writer`, refusing to write more than `max_size` bytes.
pub async fn copy_capped<R, W>(
    mut reader: R,
    writer: &mut W,
    max_size: u64,
) -> Result<u64, IngestError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = reader.read(&mut buffer).await.map_err(read_error)?;
        if n == 0 {
            break;
        }
        total += n as u64;
        if total > max_size {
            return Err(IngestError::TooLarge(format!(
                "Upload exceeds maximum allowed {} bytes",
                max_size
            )));
        }
        writer
            .write_all(&buffer[..n])
            .await
            .map_err(|e| IngestError::Internal(format!("Could not write temp file: {}", e)))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| IngestError::Internal(format!("Could not flush temp file: {}", e)))?;
    Ok(total)
}

fn read_error(e: std::io::Error) -> IngestError {
    let msg = e.to_string();
    if msg.contains("length limit exceeded") {
        IngestError::TooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        IngestError::InvalidInput(format!("Could not read upload body: {}", msg))
    }
}
