use super::backend::{ObjectStore, StoredObject};
use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    presigning::PresigningConfig,
    primitives::ByteStream,
    Client,
};
use bytes::Bytes;
use futures::StreamExt;
use std::time::Duration;

/// S3-compatible storage (AWS, Cloudflare R2, MinIO, ...)
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Build the client once; it is shared by every request afterwards
    pub async fn new(config: &Config) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.storage_region.clone()))
            .credentials_provider(Credentials::new(
                &config.storage_access_key,
                &config.storage_secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&config.storage_endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        S3Storage {
            client: Client::from_conf(s3_config),
            bucket: config.storage_bucket.clone(),
        }
    }

    fn presigning(expires_in: Duration) -> Result<PresigningConfig> {
        PresigningConfig::expires_in(expires_in)
            .map_err(|e| anyhow::anyhow!("Invalid presign expiry: {}", e))
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    async fn put_object(&self, key: &str, bytes: Bytes, content_type: Option<&str>) -> Result<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes));

        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request.send().await?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        let content_type = response.content_type().map(str::to_string);
        let body = futures::stream::unfold(response.body, |mut stream| async move {
            let chunk = stream.next().await?;
            Some((chunk.map_err(std::io::Error::other), stream))
        })
        .boxed();

        Ok(StoredObject { content_type, body })
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(Self::presigning(expires_in)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presigning(expires_in)?)
            .await?;

        Ok(presigned.uri().to_string())
    }
}
