pub mod backend;
#[cfg(test)]
pub mod memory;
pub mod s3;

pub use backend::{ObjectStore, PRESIGN_EXPIRY};
pub use s3::S3Storage;

use crate::config::Config;
use std::sync::Arc;

/// Create the shared store handle from validated configuration
pub async fn create_storage(config: &Config) -> Arc<dyn ObjectStore> {
    tracing::info!(
        "Using bucket {} at {}",
        config.storage_bucket,
        config.storage_endpoint
    );
    Arc::new(S3Storage::new(config).await)
}
