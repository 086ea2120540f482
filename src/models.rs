use serde::{Deserialize, Serialize};

/// Body of `POST /api/upload` in presigned mode
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadRequest {
    pub file_name: String,
    pub file_type: String,
}

/// Successful direct upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub url: String,
}

/// Successful presign request: the browser PUTs to `signed_url`, the QR code
/// encodes `url`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadResponse {
    pub ok: bool,
    pub signed_url: String,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl UploadResponse {
    pub fn new(url: String) -> Self {
        UploadResponse { ok: true, url }
    }
}

impl PresignUploadResponse {
    pub fn new(signed_url: String, url: String) -> Self {
        PresignUploadResponse {
            ok: true,
            signed_url,
            url,
        }
    }
}

impl ErrorResponse {
    pub fn new(error: String) -> Self {
        ErrorResponse { ok: false, error }
    }
}
