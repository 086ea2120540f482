use super::{ClientError, Result};
use bytes::Bytes;
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Raw form submission, tagged by the selected content type.
///
/// Deserializes from `{"type": "url", "url": "..."}` or
/// `{"type": "file", "file": "path"}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum GenerateCodeForm {
    Url { url: String },
    File { file: Option<PathBuf> },
}

/// Validated input. Only obtainable through [`GenerateCodeForm::validate`].
#[derive(Debug, Clone)]
pub enum GenerateCodeInput {
    Url(TargetUrl),
    File(SelectedFile),
}

/// A well-formed absolute URL, kept exactly as entered so the QR code encodes
/// the literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl(String);

impl TargetUrl {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        Url::parse(input).map_err(|_| ClientError::Validation {
            field: "url",
            message: "Invalid URL",
        })?;
        Ok(TargetUrl(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file picked for upload, with its bytes already read
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let name = name.into();
        SelectedFile {
            content_type: content_type_for(&name).to_string(),
            name,
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(ClientError::Validation {
                field: "file",
                message: "Select a file",
            })?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            tracing::warn!("Could not read {}: {}", path.display(), e);
            ClientError::Validation {
                field: "file",
                message: "File could not be read",
            }
        })?;

        Ok(Self::new(name, bytes))
    }
}

impl GenerateCodeForm {
    /// Validate the submission as a whole
    pub async fn validate(self) -> Result<GenerateCodeInput> {
        match self {
            GenerateCodeForm::Url { url } => Ok(GenerateCodeInput::Url(TargetUrl::parse(&url)?)),
            GenerateCodeForm::File { file: Some(path) } => Ok(GenerateCodeInput::File(
                SelectedFile::from_path(&path).await?,
            )),
            GenerateCodeForm::File { file: None } => Err(ClientError::Validation {
                field: "file",
                message: "Select a file",
            }),
        }
    }
}

/// Content type declared for an upload, inferred from the file extension
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_deserializes_tagged() {
        let form: GenerateCodeForm =
            serde_json::from_str(r#"{"type": "url", "url": "https://example.com"}"#).unwrap();
        assert_eq!(
            form,
            GenerateCodeForm::Url {
                url: "https://example.com".to_string()
            }
        );

        let form: GenerateCodeForm = serde_json::from_str(r#"{"type": "file"}"#).unwrap();
        assert_eq!(form, GenerateCodeForm::File { file: None });
    }

    #[test]
    fn test_url_and_file_fields_do_not_mix() {
        // a url-typed form has nowhere to put a file
        let result: std::result::Result<GenerateCodeForm, _> =
            serde_json::from_str(r#"{"type": "url", "url": "https://example.com", "file": "a.pdf"}"#);
        assert!(result.is_err());

        let result: std::result::Result<GenerateCodeForm, _> =
            serde_json::from_str(r#"{"type": "file", "file": "a.pdf", "url": "https://example.com"}"#);
        assert!(result.is_err());

        let result: std::result::Result<GenerateCodeForm, _> =
            serde_json::from_str(r#"{"type": "url", "url": "https://example.com"}"#);
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_valid_url_kept_literally() {
        let input = GenerateCodeForm::Url {
            url: "https://example.com".to_string(),
        }
        .validate()
        .await
        .unwrap();

        match input {
            GenerateCodeInput::Url(url) => assert_eq!(url.as_str(), "https://example.com"),
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_field_error() {
        for url in ["", "example.com", "not a url", "http://"] {
            let err = GenerateCodeForm::Url {
                url: url.to_string(),
            }
            .validate()
            .await
            .unwrap_err();

            assert!(
                matches!(err, ClientError::Validation { field: "url", .. }),
                "{:?} should be rejected",
                url
            );
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_field_error() {
        let err = GenerateCodeForm::File { file: None }
            .validate()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation { field: "file", .. }));

        let err = GenerateCodeForm::File {
            file: Some(PathBuf::from("/definitely/not/here.pdf")),
        }
        .validate()
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::Validation { field: "file", .. }));
    }

    #[tokio::test]
    async fn test_selected_file_from_path() {
        let path = std::env::temp_dir().join(format!("qrdrop-form-{}.pdf", std::process::id()));
        tokio::fs::write(&path, b"%PDF-1.4").await.unwrap();

        let input = GenerateCodeForm::File {
            file: Some(path.clone()),
        }
        .validate()
        .await
        .unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        match input {
            GenerateCodeInput::File(file) => {
                assert!(file.name.ends_with(".pdf"));
                assert_eq!(file.content_type, "application/pdf");
                assert_eq!(file.bytes.as_ref(), b"%PDF-1.4");
            }
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("My Report (final).PDF"), "application/pdf");
        assert_eq!(content_type_for("photo.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("README"), "application/octet-stream");
    }
}
