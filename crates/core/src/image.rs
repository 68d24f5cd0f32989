//! Image intake and inline encoding.
//!
//! Uploaded room photos arrive as raw bytes with an optional declared MIME
//! type (browsers frequently send `application/octet-stream` for camera
//! captures). The real type is sniffed from the file header; the declared
//! type is only trusted for formats the sniffer does not know (HEIC/HEIF).
//!
//! Images travel to the generation backend and to the renderer as base64,
//! so both [`UploadedImage`] and [`EncodedImage`] carry that form.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// MIME types accepted as room photos (the inline types the backend accepts).
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/heic",
    "image/heif",
];

const DATA_URL_PREFIX: &str = "data:";
const DATA_URL_BASE64_MARKER: &str = ";base64,";

// ---------------------------------------------------------------------------
// EncodedImage
// ---------------------------------------------------------------------------

/// An image held as MIME type plus base64 payload.
///
/// This is the representation exchanged with the generation backend and the
/// one stored on every proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedImage {
    pub mime_type: String,
    /// Standard-alphabet base64, no line breaks.
    pub data: String,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, BASE64.encode(bytes))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    pub fn parse_data_url(url: &str) -> Result<Self, CoreError> {
        let rest = url
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or_else(|| CoreError::Validation("Image is not a data URL".to_string()))?;
        let (mime_type, data) = rest.split_once(DATA_URL_BASE64_MARKER).ok_or_else(|| {
            CoreError::Validation("Data URL is not base64 encoded".to_string())
        })?;
        Ok(Self::new(mime_type, data))
    }

    /// Render as a `data:` URL suitable for direct display.
    pub fn to_data_url(&self) -> String {
        format!(
            "{DATA_URL_PREFIX}{}{DATA_URL_BASE64_MARKER}{}",
            self.mime_type, self.data
        )
    }

    /// Decode the payload, rejecting empty or malformed base64.
    pub fn decode(&self) -> Result<Vec<u8>, CoreError> {
        if self.data.trim().is_empty() {
            return Err(CoreError::Validation(
                "Image payload is empty".to_string(),
            ));
        }
        let bytes = BASE64
            .decode(self.data.trim())
            .map_err(|e| CoreError::Validation(format!("Invalid base64 image payload: {e}")))?;
        if bytes.is_empty() {
            return Err(CoreError::Validation(
                "Image payload is empty".to_string(),
            ));
        }
        Ok(bytes)
    }
}

// ---------------------------------------------------------------------------
// UploadedImage
// ---------------------------------------------------------------------------

/// A room photo supplied by the user. Immutable once created.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    bytes: Vec<u8>,
    encoded: EncodedImage,
    dimensions: Option<(u32, u32)>,
}

impl UploadedImage {
    /// Validate an upload and build its encoded representation.
    ///
    /// The sniffed format wins over `declared_mime`. A declared type is
    /// only used when the header is not recognised, and must still be one of
    /// [`SUPPORTED_MIME_TYPES`].
    pub fn from_upload(bytes: Vec<u8>, declared_mime: Option<&str>) -> Result<Self, CoreError> {
        if bytes.is_empty() {
            return Err(CoreError::Validation("Uploaded image is empty".to_string()));
        }

        let mime_type = match image::guess_format(&bytes) {
            Ok(format) => format.to_mime_type().to_string(),
            Err(_) => declared_mime
                .map(normalize_mime)
                .ok_or_else(|| {
                    CoreError::Validation("Could not determine the image type".to_string())
                })?,
        };

        if !SUPPORTED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(CoreError::Validation(format!(
                "Unsupported image type '{mime_type}'. Supported: {}",
                SUPPORTED_MIME_TYPES.join(", ")
            )));
        }

        let dimensions = read_dimensions(&bytes);
        let encoded = EncodedImage::from_bytes(mime_type, &bytes);

        Ok(Self {
            bytes,
            encoded,
            dimensions,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.encoded.mime_type
    }

    pub fn encoded(&self) -> &EncodedImage {
        &self.encoded
    }

    pub fn data_url(&self) -> String {
        self.encoded.to_data_url()
    }

    /// Pixel dimensions `(width, height)` when the header could be read.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }
}

/// Lower-case a MIME type and drop any parameters (`; charset=...`).
fn normalize_mime(raw: &str) -> String {
    let base = raw.split(';').next().unwrap_or_default().trim();
    match base.to_ascii_lowercase().as_str() {
        "image/jpg" => "image/jpeg".to_string(),
        other => other.to_string(),
    }
}

/// Header-only dimension read; `None` when the decoder cannot parse it.
fn read_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
