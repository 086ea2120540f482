use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::time::Duration;

/// Lifetime of every presigned URL handed out by this service
pub const PRESIGN_EXPIRY: Duration = Duration::from_secs(5 * 60);

/// Streaming object body
pub type ObjectBody = BoxStream<'static, std::io::Result<Bytes>>;

/// An object read back from the store
pub struct StoredObject {
    /// Content type recorded at upload time, if any
    pub content_type: Option<String>,
    pub body: ObjectBody,
}

/// Trait defining the interface for object storage backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`
    async fn put_object(&self, key: &str, bytes: Bytes, content_type: Option<&str>) -> Result<()>;

    /// Fetch an object. A missing key is an error.
    async fn get_object(&self, key: &str) -> Result<StoredObject>;

    /// Presigned URL allowing one PUT of `key` with the given content type
    async fn presign_put(&self, key: &str, content_type: &str, expires_in: Duration)
        -> Result<String>;

    /// Presigned URL allowing GET of `key`
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String>;
}
