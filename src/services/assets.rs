use crate::error::IngestError;
use crate::services::staging::{StagedFile, copy_capped};
use crate::utils::keys::{STORAGE_KEY_BYTES, generate_key};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

/// URL path segment under which the assets directory is served.
pub const ASSETS_ROUTE: &str = "assets";

/// A file written to the local assets directory.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssetFile {
    pub file_name: String,
    #[serde(skip)]
    #[schema(value_type = String)]
    pub path: PathBuf,
    pub url: String,
    pub mime_type: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
}

/// Local-disk store for thumbnails, served statically under `/assets`.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    public_base_url: Url,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Result<Self, IngestError> {
        let mut public_base_url = Url::parse(public_base_url).map_err(|e| {
            IngestError::InvalidInput(format!("Invalid public base URL '{}': {}", public_base_url, e))
        })?;
        if !public_base_url.path().ends_with('/') {
            let path = format!("{}/", public_base_url.path());
            public_base_url.set_path(&path);
        }
        Ok(Self {
            root: root.into(),
            public_base_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the assets directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), IngestError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            IngestError::Internal(format!(
                "Could not create assets directory {}: {}",
                self.root.display(),
                e
            ))
        })
    }

    pub fn asset_url(&self, file_name: &str) -> Result<String, IngestError> {
        self.public_base_url
            .join(&format!("{}/{}", ASSETS_ROUTE, file_name))
            .map(String::from)
            .map_err(|e| IngestError::Internal(format!("Could not build asset URL: {}", e)))
    }

    /// Writes `reader` to a new asset and hands it to `on_stored`.
    ///
    /// The file only survives if `on_stored` succeeds; on any failure,
    /// including a body over `max_size`, nothing is left in the directory.
    pub async fn add<R, F, Fut, T>(
        &self,
        reader: R,
        extension: &str,
        mime_type: &str,
        user_id: Uuid,
        max_size: u64,
        on_stored: F,
    ) -> Result<T, IngestError>
    where
        R: AsyncRead + Unpin,
        F: FnOnce(AssetFile) -> Fut,
        Fut: Future<Output = Result<T, IngestError>>,
    {
        let file_name = format!("{}.{}", generate_key(STORAGE_KEY_BYTES), extension);
        let path = self.root.join(&file_name);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                IngestError::Internal(format!("Could not create asset {}: {}", path.display(), e))
            })?;
        let guard = StagedFile::adopt(path.clone());

        let size = copy_capped(reader, &mut file, max_size).await?;
        drop(file);

        let asset = AssetFile {
            url: self.asset_url(&file_name)?,
            file_name,
            path,
            mime_type: mime_type.to_string(),
            size,
            created_at: Utc::now(),
            user_id,
        };

        let result = on_stored(asset).await?;
        let kept = guard.keep()?;
        tracing::info!("Stored asset {}", kept.display());
        Ok(result)
    }
}
