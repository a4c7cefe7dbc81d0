#![allow(dead_code)]

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tubely::error::IngestError;
use tubely::models::{GeometryInfo, StorageObjectRef};
use tubely::services::media::{MediaProbe, MediaRemux};
use tubely::services::storage::{S3StorageService, StorageService};

pub const TEST_BUCKET: &str = "tubely-test-bucket";
pub const TEST_REGION: &str = "us-west-2";

pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Keeps uploads in memory and signs through a real, offline S3 client.
pub struct MockStorageService {
    pub objects: Mutex<HashMap<String, StoredObject>>,
    signer: S3StorageService,
    fail_uploads: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            signer: offline_s3_service(),
            fail_uploads: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::new()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    fn bucket(&self) -> &str {
        TEST_BUCKET
    }

    fn region(&self) -> &str {
        TEST_REGION
    }

    async fn upload_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<StorageObjectRef, IngestError> {
        if self.fail_uploads {
            return Err(IngestError::UploadFailed(
                "connection reset by peer".to_string(),
            ));
        }
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| IngestError::UploadFailed(e.to_string()))?;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(StorageObjectRef {
            bucket: TEST_BUCKET.to_string(),
            region: TEST_REGION.to_string(),
            key: key.to_string(),
        })
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, IngestError> {
        self.signer.presign(bucket, key, ttl).await
    }

    async fn file_exists(&self, key: &str) -> Result<bool, IngestError> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }
}

pub fn offline_s3_service() -> S3StorageService {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(TEST_REGION))
        .credentials_provider(Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            None,
            None,
            "static",
        ))
        .build();
    S3StorageService::new(aws_sdk_s3::Client::from_conf(config), TEST_BUCKET.to_string())
}

/// Reports fixed dimensions for any file.
pub struct FakeProbe(pub GeometryInfo);

impl FakeProbe {
    pub fn new(width: u32, height: u32) -> Self {
        Self(GeometryInfo { width, height })
    }
}

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn probe(&self, _path: &Path) -> Result<GeometryInfo, IngestError> {
        Ok(self.0)
    }
}

pub struct FailingProbe;

#[async_trait]
impl MediaProbe for FailingProbe {
    async fn probe(&self, path: &Path) -> Result<GeometryInfo, IngestError> {
        Err(IngestError::ProbeFailed(format!(
            "{}: Invalid data found when processing input",
            path.display()
        )))
    }
}

/// Writes `moov` followed by the input bytes, like a faststart rewrite would
/// move the index to the front.
pub struct FakeRemux;

#[async_trait]
impl MediaRemux for FakeRemux {
    async fn remux_faststart(&self, input: &Path, output: &Path) -> Result<(), IngestError> {
        let mut data = b"moov".to_vec();
        data.extend(
            tokio::fs::read(input)
                .await
                .map_err(|e| IngestError::RewriteFailed(e.to_string()))?,
        );
        tokio::fs::write(output, data)
            .await
            .map_err(|e| IngestError::RewriteFailed(e.to_string()))
    }
}

pub struct FailingRemux;

#[async_trait]
impl MediaRemux for FailingRemux {
    async fn remux_faststart(&self, _input: &Path, output: &Path) -> Result<(), IngestError> {
        tokio::fs::write(output, b"half-written")
            .await
            .map_err(|e| IngestError::RewriteFailed(e.to_string()))?;
        Err(IngestError::RewriteFailed(
            "moov atom not found".to_string(),
        ))
    }
}

/// Writes part of its output and then hangs, like an ffmpeg stuck on a bad input.
pub struct SlowRemux;

#[async_trait]
impl MediaRemux for SlowRemux {
    async fn remux_faststart(&self, _input: &Path, output: &Path) -> Result<(), IngestError> {
        tokio::fs::write(output, b"partial")
            .await
            .map_err(|e| IngestError::RewriteFailed(e.to_string()))?;
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
