use crate::error::IngestError;
use crate::models::StorageObjectRef;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;
use std::time::Duration;

/// Longest validity SigV4 allows for a presigned request.
pub const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[async_trait]
pub trait StorageService: Send + Sync {
    fn bucket(&self) -> &str;
    fn region(&self) -> &str;

    /// Stores the file at `path` under exactly `key`. No retries.
    async fn upload_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<StorageObjectRef, IngestError>;

    /// Signs a GET for `bucket`/`key` valid for `ttl` from now.
    async fn presign(&self, bucket: &str, key: &str, ttl: Duration)
    -> Result<String, IngestError>;

    async fn file_exists(&self, key: &str) -> Result<bool, IngestError>;
}

/// Rejects presign requests the signer could never honour.
pub fn validate_presign_request(bucket: &str, key: &str, ttl: Duration) -> Result<(), IngestError> {
    if bucket.trim().is_empty() || key.trim().is_empty() {
        return Err(IngestError::SigningFailed(
            "bucket and key must not be empty".to_string(),
        ));
    }
    if ttl.is_zero() || ttl > MAX_PRESIGN_TTL {
        return Err(IngestError::SigningFailed(format!(
            "presign validity must be between 1s and {}s, got {}s",
            MAX_PRESIGN_TTL.as_secs(),
            ttl.as_secs()
        )));
    }
    Ok(())
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
    region: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        let region = client
            .config()
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "us-east-1".to_string());
        Self {
            client,
            bucket,
            region,
        }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn region(&self) -> &str {
        &self.region
    }

    async fn upload_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<StorageObjectRef, IngestError> {
        let body = ByteStream::from_path(path).await.map_err(|e| {
            IngestError::UploadFailed(format!("unable to open {}: {}", path.display(), e))
        })?;

        let res = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, error={}",
                self.bucket,
                key,
                DisplayErrorContext(&e)
            );
            return Err(IngestError::UploadFailed(format!(
                "PutObject {} failed: {}",
                key,
                DisplayErrorContext(&e)
            )));
        }

        Ok(StorageObjectRef {
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            key: key.to_string(),
        })
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, IngestError> {
        validate_presign_request(bucket, key, ttl)?;

        let config = PresigningConfig::expires_in(ttl)
            .map_err(|e| IngestError::SigningFailed(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| {
                IngestError::SigningFailed(format!(
                    "unable to presign {}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(request.uri().to_string())
    }

    async fn file_exists(&self, key: &str) -> Result<bool, IngestError> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(IngestError::Internal(service_error.to_string()))
                }
            }
        }
    }
}
