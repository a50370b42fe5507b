//! Image attachments for multipart uploads.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use reqwest::multipart::Part;

use crate::api::ApiError;

/// Largest image accepted for upload.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// An image file ready to be attached to a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Photo {
    /// Wraps in-memory image bytes, checking type and size.
    ///
    /// # Errors
    /// Returns an error for non-image file names or images over 5 MiB.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let Some(mime) = image_mime(&file_name) else {
            bail!("{file_name} is not a supported image (jpg, png, gif, webp)");
        };
        if bytes.len() > MAX_PHOTO_BYTES {
            bail!("{file_name} is too large; images must be under 5 MB");
        }
        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }

    /// Reads an image from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not an acceptable image.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("{} has no usable file name", path.display()))?
            .to_string();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
        Self::new(file_name, bytes)
    }

    pub(crate) fn into_part(self) -> Result<Part, ApiError> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(self.mime)
            .map_err(|e| ApiError::invalid_request(format!("invalid image type: {e}")))
    }
}

fn image_mime(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
