//! Uploaded image handling and input validation before any network call.

use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};
use serde::Serialize;

/// Binary image payload plus its MIME type.
///
/// Consumed once by a pipeline run. The MIME type is what the caption hop
/// forwards as the upstream `Content-Type`.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    bytes: Vec<u8>,
    mime_type: String,
    name: Option<String>,
}

/// Lightweight description of an upload, kept on the display state in place
/// of the bytes themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl UploadedImage {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            name: None,
        }
    }

    /// Attach a display name (usually the file name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read an image from disk, sniffing the MIME type from its magic bytes.
    ///
    /// Falls back to the file extension when the header is not recognized.
    /// Size is checked against the upload limit before the file is read.
    pub async fn from_path(path: &Path, limits: &LimitsConfig) -> PipelineResult<Self> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::FileNotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(PipelineError::Read {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        check_size(metadata.len(), limits)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mime_type = sniff_mime(&bytes)
            .or_else(|| mime_from_extension(path))
            .unwrap_or("application/octet-stream");

        let mut image = Self::new(bytes, mime_type);
        if let Some(name) = path.file_name() {
            image.name = Some(name.to_string_lossy().into_owned());
        }
        Ok(image)
    }

    /// Reject non-image MIME types and oversized payloads.
    pub fn validate(&self, limits: &LimitsConfig) -> PipelineResult<()> {
        if !self.mime_type.starts_with("image/") {
            return Err(PipelineError::InvalidImage {
                mime_type: self.mime_type.clone(),
            });
        }
        check_size(self.bytes.len() as u64, limits)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.bytes.len() as u64,
        }
    }
}

fn check_size(len: u64, limits: &LimitsConfig) -> PipelineResult<()> {
    if len > limits.max_upload_bytes() {
        return Err(PipelineError::ImageTooLarge {
            size_mb: len / (1024 * 1024),
            max_mb: limits.max_upload_mb,
        });
    }
    Ok(())
}

/// Detect an image MIME type from the leading magic bytes.
pub fn sniff_mime(header: &[u8]) -> Option<&'static str> {
    if header.len() < 4 {
        return None;
    }

    // JPEG: FF D8 FF
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // PNG: 89 50 4E 47
    if header.starts_with(&[0x89, b'P', b'N', b'G']) {
        return Some("image/png");
    }

    // GIF: GIF8
    if header.starts_with(b"GIF8") {
        return Some("image/gif");
    }

    // WebP: RIFF....WEBP
    if header.starts_with(b"RIFF") && header.len() >= 12 && &header[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    // BMP: BM
    if header.starts_with(b"BM") {
        return Some("image/bmp");
    }

    // TIFF: II (little-endian) or MM (big-endian) followed by version 42
    if header.starts_with(&[b'I', b'I', 0x2A, 0x00]) || header.starts_with(&[b'M', b'M', 0x00, 0x2A])
    {
        return Some("image/tiff");
    }

    // HEIC/HEIF/AVIF: ftyp box at offset 4, brand at offset 8
    if header.len() >= 12 && &header[4..8] == b"ftyp" {
        return match &header[8..12] {
            b"avif" | b"avis" => Some("image/avif"),
            b"heic" | b"heix" | b"hevc" | b"hevx" => Some("image/heic"),
            _ => Some("image/heif"),
        };
    }

    None
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "heic" => Some("image/heic"),
        "avif" => Some("image/avif"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
