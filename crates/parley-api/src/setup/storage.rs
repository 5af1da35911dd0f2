//! Storage backend selection.

use anyhow::{Context, Result};
use parley_core::config::StorageBackendKind;
use parley_core::Config;
use parley_storage::{LocalStorage, S3Storage, Storage};
use std::sync::Arc;

/// Construct the configured blob-store backend.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackendKind::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .context("S3_BUCKET must be set for the s3 backend")?;
            let region = config
                .s3_region
                .clone()
                .context("S3_REGION must be set for the s3 backend")?;

            tracing::info!(
                bucket = %bucket,
                region = %region,
                endpoint = ?config.s3_endpoint,
                "Using S3 storage backend"
            );
            let storage = S3Storage::new(bucket, region, config.s3_endpoint.clone())?;
            Ok(Arc::new(storage))
        }
        StorageBackendKind::Local => {
            tracing::info!(
                path = %config.local_storage_path,
                base_url = %config.local_storage_base_url,
                "Using local storage backend"
            );
            let storage = LocalStorage::new(
                config.local_storage_path.clone(),
                config.local_storage_base_url.clone(),
            )
            .await?;
            Ok(Arc::new(storage))
        }
    }
}
