//! QR code rendering and image export

use super::{ClientError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GrayImage, Luma};
use qrcode::{render::svg, QrCode};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Edge length of exported codes in pixels
pub const QR_SIZE: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpg,
    Svg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpg => "image/jpeg",
            ExportFormat::Svg => "image/svg+xml",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "svg" => Ok(ExportFormat::Svg),
            _ => Err(anyhow::anyhow!("Invalid export format: {}", s)),
        }
    }
}

/// The code currently on display, mapped to the value it encodes
pub struct RenderedCode {
    value: String,
    code: QrCode,
}

impl std::fmt::Debug for RenderedCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedCode")
            .field("value", &self.value)
            .field("width", &self.code.width())
            .finish()
    }
}

/// An exported image ready to be written out
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl RenderedCode {
    pub fn new(value: &str) -> Result<Self> {
        let code = QrCode::new(value.as_bytes())
            .map_err(|e| ClientError::QrEncode(e.to_string()))?;

        Ok(RenderedCode {
            value: value.to_string(),
            code,
        })
    }

    /// The exact string encoded in the code
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Raster rendering, at least [`QR_SIZE`] pixels wide, quiet zone included
    pub fn to_image(&self) -> GrayImage {
        self.code
            .render::<Luma<u8>>()
            .min_dimensions(QR_SIZE, QR_SIZE)
            .build()
    }

    pub fn export(&self, format: ExportFormat) -> Result<ExportedImage> {
        let bytes = match format {
            ExportFormat::Svg => self
                .code
                .render::<svg::Color>()
                .min_dimensions(QR_SIZE, QR_SIZE)
                .build()
                .into_bytes(),
            ExportFormat::Png => self.encode_raster(image::ImageFormat::Png)?,
            ExportFormat::Jpg => self.encode_raster(image::ImageFormat::Jpeg)?,
        };

        Ok(ExportedImage {
            file_name: format!("qrcode.{}", format.extension()),
            mime: format.mime(),
            bytes,
        })
    }

    /// `data:` URL of the exported image, for embedding without a file
    pub fn to_data_url(&self, format: ExportFormat) -> Result<String> {
        let image = self.export(format)?;
        Ok(format!(
            "data:{};base64,{}",
            image.mime,
            STANDARD.encode(&image.bytes)
        ))
    }

    fn encode_raster(&self, format: image::ImageFormat) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(self.to_image())
            .write_to(&mut Cursor::new(&mut bytes), format)
            .map_err(|e| ClientError::Export(e.to_string()))?;
        Ok(bytes)
    }
}

impl ExportedImage {
    /// Write the image into `dir` under its file name
    pub async fn save(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}
