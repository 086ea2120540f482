use crate::config::{Config, TransferMode};
use crate::errors::ApiError;
use crate::keys::{slugify, timestamped_key};
use crate::models::{PresignUploadRequest, PresignUploadResponse, UploadResponse};
use crate::storage::{ObjectStore, PRESIGN_EXPIRY};
use axum::{
    body::Body,
    extract::{
        multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, Path,
        State,
    },
    http::{header, StatusCode},
    response::{Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn ObjectStore>,
    pub config: Config,
}

/// Build the route table. The transfer mode picks exactly one implementation
/// for each route.
pub fn router(state: AppState) -> Router {
    let routes = match state.config.transfer_mode {
        TransferMode::Proxy => Router::new()
            .route("/api/upload", post(upload_file))
            .route("/api/download/:id", get(download_file)),
        TransferMode::Presigned => Router::new()
            .route("/api/upload", post(presign_upload))
            .route("/api/download/:id", get(redirect_download)),
    };

    routes
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// POST /api/upload (proxy mode) - store a multipart `file` field through the server
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Option<String>, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart data", e))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file", e))?;

        upload = Some((file_name, content_type, data));
    }

    let (file_name, content_type, data) =
        upload.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    let key = timestamped_key(chrono::Utc::now().timestamp_millis(), &file_name);

    tracing::info!(
        "Uploading {} ({} bytes, {}) as {}",
        file_name,
        data.len(),
        content_type.as_deref().unwrap_or("no content type"),
        key
    );

    state
        .storage
        .put_object(&key, data, content_type.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("Failed to upload {}: {:#}", key, e);
            ApiError::Internal("Failed to upload file")
        })?;

    Ok(Json(UploadResponse::new(state.config.download_url(&key))))
}

/// Bodies over the upload limit surface as multipart errors; keep their 413
fn multipart_error(context: &str, err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge;
    }
    ApiError::BadRequest(format!("{}: {}", context, err))
}

/// POST /api/upload (presigned mode) - hand out a URL the browser PUTs the file to
pub async fn presign_upload(
    State(state): State<AppState>,
    payload: Result<Json<PresignUploadRequest>, JsonRejection>,
) -> Result<Json<PresignUploadResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.file_type.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing file type".to_string()));
    }

    let key = slugify(&request.file_name);
    if key.is_empty() {
        return Err(ApiError::BadRequest("Invalid file name".to_string()));
    }

    let signed_url = state
        .storage
        .presign_put(&key, &request.file_type, PRESIGN_EXPIRY)
        .await
        .map_err(|e| {
            tracing::error!("Failed to presign upload of {}: {:#}", key, e);
            ApiError::Internal("Failed to create upload URL")
        })?;

    tracing::debug!("Issued upload URL for {} ({})", key, request.file_type);

    Ok(Json(PresignUploadResponse::new(
        signed_url,
        state.config.download_url(&key),
    )))
}

/// GET /api/download/:id (proxy mode) - stream the object through the server
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let object = state.storage.get_object(&id).await.map_err(|e| {
        tracing::error!("Failed to download {}: {:#}", id, e);
        ApiError::Internal("Failed to download file")
    })?;

    let content_type = object
        .content_type
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", id.replace('"', "")),
        )
        .body(Body::from_stream(object.body))
        .map_err(|e| {
            tracing::error!("Failed to build download response for {}: {}", id, e);
            ApiError::Internal("Failed to download file")
        })
}

/// GET /api/download/:id (presigned mode) - redirect to a short-lived store URL
pub async fn redirect_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, ApiError> {
    let url = state
        .storage
        .presign_get(&id, PRESIGN_EXPIRY)
        .await
        .map_err(|e| {
            tracing::error!("Failed to presign download of {}: {:#}", id, e);
            ApiError::Internal("Failed to download file")
        })?;

    Ok(Redirect::temporary(&url))
}
