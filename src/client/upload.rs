use super::form::{SelectedFile, TargetUrl};
use super::{ClientError, Result};
use crate::config::TransferMode;
use crate::models::{ErrorResponse, PresignUploadRequest, PresignUploadResponse, UploadResponse};
use async_trait::async_trait;
use reqwest::{header, multipart, Response, Url};

/// Sends a selected file to storage and returns the URL to encode
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, file: &SelectedFile) -> Result<TargetUrl>;
}

/// Talks to a running server's `/api/upload`
pub struct HttpUploader {
    client: reqwest::Client,
    server: Url,
    mode: TransferMode,
}

impl HttpUploader {
    /// `mode` must match the server's `TRANSFER_MODE`
    pub fn new(server: Url, mode: TransferMode) -> Self {
        HttpUploader {
            client: reqwest::Client::new(),
            server,
            mode,
        }
    }

    fn upload_endpoint(&self) -> String {
        format!("{}/api/upload", self.server.as_str().trim_end_matches('/'))
    }

    /// Ask for a presigned URL, then PUT the bytes straight to the bucket
    async fn upload_presigned(&self, file: &SelectedFile) -> Result<TargetUrl> {
        let response = self
            .client
            .post(self.upload_endpoint())
            .json(&PresignUploadRequest {
                file_name: file.name.clone(),
                file_type: file.content_type.clone(),
            })
            .send()
            .await?;

        let presigned: PresignUploadResponse = read_json(response).await?;

        // The bucket checks the signed content type against this header
        let put = self
            .client
            .put(&presigned.signed_url)
            .header(header::CONTENT_TYPE, &file.content_type)
            .body(file.bytes.clone())
            .send()
            .await?;

        if !put.status().is_success() {
            return Err(ClientError::Upload(format!(
                "storage rejected upload with status {}",
                put.status()
            )));
        }

        TargetUrl::parse(&presigned.url)
            .map_err(|_| ClientError::Upload(format!("server returned bad URL {}", presigned.url)))
    }

    /// Send the bytes through the server as multipart form data
    async fn upload_proxied(&self, file: &SelectedFile) -> Result<TargetUrl> {
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;

        let response = self
            .client
            .post(self.upload_endpoint())
            .multipart(multipart::Form::new().part("file", part))
            .send()
            .await?;

        let uploaded: UploadResponse = read_json(response).await?;

        TargetUrl::parse(&uploaded.url)
            .map_err(|_| ClientError::Upload(format!("server returned bad URL {}", uploaded.url)))
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, file: &SelectedFile) -> Result<TargetUrl> {
        tracing::debug!(
            "Uploading {} ({} bytes) via {} mode",
            file.name,
            file.bytes.len(),
            self.mode
        );

        match self.mode {
            TransferMode::Presigned => self.upload_presigned(file).await,
            TransferMode::Proxy => self.upload_proxied(file).await,
        }
    }
}

/// Decode a success body, or surface the server's `{ok: false, error}` message
async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => format!("server responded with status {}", status),
    };
    Err(ClientError::Upload(message))
}
