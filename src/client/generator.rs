use super::form::{GenerateCodeInput, TargetUrl};
use super::render::RenderedCode;
use super::upload::Uploader;
use super::{ClientError, Result};

/// Where the form is between submissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    /// Ready for input; `error` holds the last failure notice, if any
    Idle { error: Option<String> },
    UrlReady(TargetUrl),
    /// A file upload is in flight
    Uploading,
    FileReady(TargetUrl),
}

/// Drives a submission to a rendered code.
///
/// Holds at most one code: each successful submission replaces the previous
/// one. `submit` takes `&mut self`, so a second submission cannot start while
/// an upload is pending.
pub struct QrCodeGenerator<U> {
    uploader: U,
    state: FormState,
    code: Option<RenderedCode>,
}

impl<U: Uploader> QrCodeGenerator<U> {
    pub fn new(uploader: U) -> Self {
        QrCodeGenerator {
            uploader,
            state: FormState::Idle { error: None },
            code: None,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// The code on display
    pub fn code(&self) -> Option<&RenderedCode> {
        self.code.as_ref()
    }

    pub async fn submit(&mut self, input: GenerateCodeInput) -> Result<&RenderedCode> {
        let (url, ready) = match input {
            GenerateCodeInput::Url(url) => (url.clone(), FormState::UrlReady(url)),
            GenerateCodeInput::File(file) => {
                self.state = FormState::Uploading;

                let uploaded = self.uploader.upload(&file).await;
                match uploaded {
                    Ok(url) => {
                        tracing::info!("Uploaded {} as {}", file.name, url);
                        (url.clone(), FormState::FileReady(url))
                    }
                    Err(e) => {
                        tracing::error!("Error uploading {}: {}", file.name, e);
                        return Err(self.fail("Failed to upload file", e));
                    }
                }
            }
        };

        match RenderedCode::new(url.as_str()) {
            Ok(code) => {
                self.state = ready;
                Ok(self.code.insert(code))
            }
            Err(e) => Err(self.fail("Failed to generate QR code", e)),
        }
    }

    fn fail(&mut self, notice: &str, err: ClientError) -> ClientError {
        self.state = FormState::Idle {
            error: Some(notice.to_string()),
        };
        err
    }
}
