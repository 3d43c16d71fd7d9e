use crate::{LocalStorage, S3Storage, Storage, StorageBackend, StorageError, StorageResult};
use pdfbind_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3 bucket not configured".to_string()))?;
            let region = config
                .s3_region
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3 region not configured".to_string()))?;
            let access_key_id = config.aws_access_key_id.clone().ok_or_else(|| {
                StorageError::ConfigError("AWS_ACCESS_KEY_ID not configured".to_string())
            })?;
            let secret_access_key = config.aws_secret_access_key.clone().ok_or_else(|| {
                StorageError::ConfigError("AWS_SECRET_ACCESS_KEY not configured".to_string())
            })?;

            let storage = S3Storage::new(
                bucket,
                region,
                config.s3_endpoint.clone(),
                access_key_id,
                secret_access_key,
            )
            .await?;
            Ok(Arc::new(storage))
        }

        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("Local storage path not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("Local storage base URL not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }
    }
}
