use crate::config::StorageConfig;
use crate::services::storage::S3StorageService;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &StorageConfig) -> Arc<S3StorageService> {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        loader = loader.credentials_provider(Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "static",
        ));
    }

    let aws_config = loader.load().await;

    // Custom endpoints (MinIO and friends) only speak path-style addressing
    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.endpoint.is_some())
        .build();
    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    match &config.endpoint {
        Some(endpoint) => {
            info!("☁️  S3 Storage: {} (Bucket: {})", endpoint, config.bucket);
            ensure_bucket(&s3_client, &config.bucket).await;
        }
        None => info!(
            "☁️  S3 Storage: region {} (Bucket: {})",
            config.region, config.bucket
        ),
    }

    Arc::new(S3StorageService::new(s3_client, config.bucket.clone()))
}

async fn ensure_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    match client.head_bucket().bucket(bucket).send().await {
        Ok(_) => info!("✅ Bucket '{}' is ready", bucket),
        Err(_) => {
            info!("🪣 Bucket '{}' not found, creating...", bucket);
            if let Err(e) = client.create_bucket().bucket(bucket).send().await {
                tracing::error!("❌ Failed to create bucket '{}': {}", bucket, e);
            } else {
                info!("✅ Bucket '{}' created successfully", bucket);
            }
        }
    }
}
