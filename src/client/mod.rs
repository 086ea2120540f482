//! The QR code form: input validation, the upload flow, rendering and export.
//!
//! Everything here runs on the user's side of the HTTP API. The server never
//! renders images.

pub mod form;
pub mod generator;
pub mod render;
pub mod upload;

pub use form::GenerateCodeForm;
pub use generator::{FormState, QrCodeGenerator};
pub use render::ExportFormat;
pub use upload::HttpUploader;

use thiserror::Error;

/// Result type alias using the client's error type
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// A form field failed validation; blocks submission
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    /// The upload endpoint or the bucket rejected the file
    #[error("Failed to upload file: {0}")]
    Upload(String),

    /// The value does not fit in a QR code
    #[error("Failed to encode QR code: {0}")]
    QrEncode(String),

    /// Image encoding failed
    #[error("Failed to export image: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Upload(err.to_string())
    }
}
