//! Opaque image handles passed between the workflow and the generation service.
//!
//! An `ImageHandle` owns immutable encoded bytes plus their MIME type. Cloning
//! shares the bytes, and nothing can mutate them afterwards, so a clone taken
//! at one point in time (e.g. the locked master style) is unaffected by later
//! edits, which always produce a fresh handle.

use crate::error::{Result, RoomcraftError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

const DEFAULT_MIME_TYPE: &str = "image/png";

/// Encoded image bytes with a MIME type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    mime_type: String,
    data: Arc<[u8]>,
}

impl ImageHandle {
    /// Wraps already-encoded bytes.
    pub fn new(mime_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Wraps PNG bytes.
    pub fn png(data: impl Into<Arc<[u8]>>) -> Self {
        Self::new(DEFAULT_MIME_TYPE, data)
    }

    /// Decodes base64 image data with the given MIME type.
    pub fn from_base64(mime_type: impl Into<String>, encoded: &str) -> Result<Self> {
        let bytes = BASE64_STANDARD
            .decode(encoded.trim())
            .map_err(|e| RoomcraftError::Image(format!("Invalid base64 image data: {e}")))?;
        Ok(Self::new(mime_type, bytes))
    }

    /// Infers the MIME type of an image file from its extension.
    ///
    /// Paths without a recognised extension are treated as PNG.
    pub fn mime_type_for_path(path: impl AsRef<Path>) -> &'static str {
        mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    ///
    /// A bare base64 payload without the `data:` prefix is accepted as PNG.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let Some(rest) = url.strip_prefix("data:") else {
            return Self::from_base64(DEFAULT_MIME_TYPE, url);
        };
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| RoomcraftError::Image("Data URL has no payload".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE);
        Self::from_base64(mime_type, payload)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Base64 payload without any prefix.
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.data)
    }

    /// `data:<mime>;base64,<payload>` form used by the presentation layer.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// File extension matching the MIME type, `png` when it is unknown.
    pub fn extension(&self) -> &'static str {
        let essence = self.mime_type.split(';').next().unwrap_or_default().trim();
        // JPEG has several registered extensions; always write "jpg".
        if essence.eq_ignore_ascii_case("image/jpeg") || essence.eq_ignore_ascii_case("image/jpg")
        {
            return "jpg";
        }
        mime_guess::get_mime_extensions_str(essence)
            .and_then(|extensions| extensions.first().copied())
            .unwrap_or("png")
    }

    /// Pixel dimensions, read from the encoded header.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let reader = image::ImageReader::new(std::io::Cursor::new(self.bytes()))
            .with_guessed_format()
            .map_err(RoomcraftError::from)?;
        Ok(reader.into_dimensions()?)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Serialize for ImageHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

impl<'de> Deserialize<'de> for ImageHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let url = String::deserialize(deserializer)?;
        Self::from_data_url(&url).map_err(serde::de::Error::custom)
    }
}
