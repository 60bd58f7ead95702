//! Header-only inspection of image bytes returned by the service.
//!
//! Only the format signature and the dimensions are read; pixel data is
//! never decoded.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use serde::Serialize;

use crate::error::CoreError;

/// Format and dimensions of an accepted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    #[serde(serialize_with = "serialize_format")]
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    /// Canonical media type for the detected format (e.g. `image/png`).
    pub fn media_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

fn serialize_format<S: serde::Serializer>(format: &ImageFormat, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(format.extensions_str().first().copied().unwrap_or("unknown"))
}

/// Detect the format from magic bytes and read the dimensions from the
/// header.
///
/// Fails with [`CoreError::UnsupportedImage`] for empty input, unknown
/// signatures, or headers that cannot be parsed.
pub fn inspect_image(bytes: &[u8]) -> Result<ImageInfo, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::UnsupportedImage("empty body".into()));
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CoreError::UnsupportedImage(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| CoreError::UnsupportedImage("unrecognised image signature".into()))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| CoreError::UnsupportedImage(e.to_string()))?;

    Ok(ImageInfo {
        format,
        width,
        height,
    })
}
