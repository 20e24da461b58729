#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use lander_core::Config;
use std::sync::Arc;

/// Public URL of a bucket when objects are served through a storage gateway:
/// `{base}/storage/v1/object/public/{bucket}`
pub fn public_bucket_url(public_base_url: &str, bucket: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}",
        public_base_url.trim_end_matches('/'),
        bucket
    )
}

/// Create a storage backend bound to `bucket` based on configuration
pub async fn create_storage(config: &Config, bucket: &str) -> StorageResult<Arc<dyn Storage>> {
    let backend = config.storage_backend().unwrap_or(StorageBackend::S3);
    let public_base = config
        .public_storage_base_url()
        .map(|base| public_bucket_url(base, bucket));

    tracing::info!(backend = %backend, bucket = %bucket, "Creating storage backend");

    match backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = config
                .s3_region()
                .map(String::from)
                .or_else(|| config.aws_region().map(String::from))
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let storage = S3Storage::new(bucket.to_string(), region, endpoint)
                .await?
                .with_public_base_url(public_base);
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;

            let base_url = public_base
                .unwrap_or_else(|| format!("{}/{}", base_url.trim_end_matches('/'), bucket));
            let path = std::path::Path::new(base_path).join(bucket);

            let storage = LocalStorage::new(path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
