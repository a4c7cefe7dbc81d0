use crate::config::IngestConfig;
use crate::error::{IngestError, IngestStage, StageError};
use crate::models::{AspectLabel, AssetReference, GeometryInfo, StorageObjectRef, UploadRequest};
use crate::services::aspect::classify;
use crate::services::media::{MediaProbe, MediaRemux, probe_geometry, rewrite_for_streaming};
use crate::services::staging::StagedFile;
use crate::services::storage::StorageService;
use crate::utils::keys::{STORAGE_KEY_BYTES, generate_key};
use crate::utils::validation::{parse_content_type, resolve_extension, validate_declared_size};
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Everything known about a video once it has been stored remotely.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub object: StorageObjectRef,
    pub reference: AssetReference,
    pub aspect: AspectLabel,
    pub geometry: GeometryInfo,
}

/// Drives one upload from request body to stored, streaming-ready object.
pub struct IngestService {
    config: Arc<IngestConfig>,
    storage: Arc<dyn StorageService>,
    prober: Arc<dyn MediaProbe>,
    remuxer: Arc<dyn MediaRemux>,
}

impl IngestService {
    pub fn new(
        config: Arc<IngestConfig>,
        storage: Arc<dyn StorageService>,
        prober: Arc<dyn MediaProbe>,
        remuxer: Arc<dyn MediaRemux>,
    ) -> Self {
        Self {
            config,
            storage,
            prober,
            remuxer,
        }
    }

    /// Runs the full pipeline for one upload.
    ///
    /// Every local file created along the way is gone when this returns,
    /// whether it succeeds or not. On failure the error names the stage that
    /// could not be reached.
    #[tracing::instrument(
        skip_all,
        fields(video_id = %request.video_id, user_id = %request.user_id)
    )]
    pub async fn ingest<R>(&self, request: UploadRequest<R>) -> Result<IngestOutcome, StageError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let UploadRequest {
            body,
            content_type,
            declared_size,
            ..
        } = request;

        // 1. Validate the declared type and size before touching the body
        let (media_type, extension) = self
            .validate(&content_type, declared_size)
            .map_err(failed_at(IngestStage::Received))?;
        tracing::debug!("Upload received: type={}, ext={}", media_type, extension);

        // 2. Stage to local disk
        let staged = StagedFile::stage(
            &self.config.staging_dir,
            &extension,
            body,
            self.config.max_video_size,
        )
        .await
        .map_err(failed_at(IngestStage::Staged))?;
        tracing::debug!(
            "Upload staged at {} ({} bytes)",
            staged.path().display(),
            staged.size()
        );

        // 3. Probe and classify
        let geometry = probe_geometry(self.prober.as_ref(), staged.path())
            .await
            .map_err(failed_at(IngestStage::Probed))?;
        let aspect = classify(geometry.width, geometry.height);
        tracing::debug!(
            "Classified {}x{} as {}",
            geometry.width,
            geometry.height,
            aspect
        );

        // 4. Rewrite for progressive playback; the staged original is no longer needed
        let rewritten = rewrite_for_streaming(self.remuxer.as_ref(), staged.path())
            .await
            .map_err(failed_at(IngestStage::Rewritten))?;
        staged.release();

        // 5. Upload under a fresh, aspect-namespaced key
        let key = format!(
            "{}/{}.{}",
            aspect,
            generate_key(STORAGE_KEY_BYTES),
            extension
        );
        let object = self
            .storage
            .upload_file(&key, rewritten.path(), &media_type)
            .await
            .map_err(failed_at(IngestStage::Uploaded))?;
        rewritten.release();

        // 6. Build the reference persisted on the video record
        let reference = object
            .reference()
            .map_err(failed_at(IngestStage::Finalized))?;

        tracing::info!(
            "Ingested video into {} ({}x{}, {})",
            reference,
            geometry.width,
            geometry.height,
            aspect
        );

        Ok(IngestOutcome {
            object,
            reference,
            aspect,
            geometry,
        })
    }

    fn validate(
        &self,
        content_type: &str,
        declared_size: Option<u64>,
    ) -> Result<(String, String), IngestError> {
        let media_type = parse_content_type(content_type)?;
        let extension = resolve_extension(&self.config.allowed_video_types, &media_type)?;
        validate_declared_size(declared_size, self.config.max_video_size)?;
        Ok((media_type, extension.to_string()))
    }
}

fn failed_at(stage: IngestStage) -> impl FnOnce(IngestError) -> StageError {
    move |source| {
        if source.is_client_error() {
            tracing::warn!("Rejected upload before '{}': {}", stage, source);
        } else {
            tracing::error!("Ingestion failed before '{}': {}", stage, source);
        }
        StageError::new(stage, source)
    }
}
