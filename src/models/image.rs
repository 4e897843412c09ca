// Inline image payload and its data-URI transport encoding
//
// Images cross the caller boundary as `data:<mime>;base64,<payload>` strings
// (or bare base64). The provider only ever sees the raw base64 payload plus a
// separate mime type, so the prefix is stripped on the way in and re-added on
// the way out.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Mime type assumed when the caller sends bare base64 without a prefix
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

const DATA_URI_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Decoded image bytes together with their mime type
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Bytes,
}

/// Reasons a transport-encoded image cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageDecodeError {
    #[error("image payload is empty")]
    Empty,
    #[error("data URI is missing the ';base64,' marker")]
    NotBase64,
    #[error("image payload is not valid base64")]
    InvalidBase64,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Decode a caller-facing image string.
    ///
    /// Accepts either a full data URI or a bare base64 payload. Whitespace
    /// around the input is ignored.
    pub fn from_transport(encoded: &str) -> Result<Self, ImageDecodeError> {
        let (mime_type, payload) = split_data_uri(encoded.trim())?;
        if payload.is_empty() {
            return Err(ImageDecodeError::Empty);
        }
        let data = STANDARD
            .decode(payload)
            .map_err(|_| ImageDecodeError::InvalidBase64)?;
        if data.is_empty() {
            return Err(ImageDecodeError::Empty);
        }
        Ok(Self::new(mime_type, data))
    }

    /// Build from the provider's `inlineData` fields (bare base64 + mime type).
    pub fn from_base64(mime_type: &str, payload: &str) -> Result<Self, ImageDecodeError> {
        let mime = if mime_type.is_empty() { DEFAULT_IMAGE_MIME } else { mime_type };
        let data = STANDARD
            .decode(payload.trim())
            .map_err(|_| ImageDecodeError::InvalidBase64)?;
        if data.is_empty() {
            return Err(ImageDecodeError::Empty);
        }
        Ok(Self::new(mime, data))
    }

    /// Raw base64 payload without any transport prefix
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// Caller-facing form: `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("{}{}{}{}", DATA_URI_SCHEME, self.mime_type, BASE64_MARKER, self.to_base64())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Split an encoded image into (mime_type, base64 payload).
///
/// Strings without the `data:` scheme are treated as bare base64.
pub fn split_data_uri(encoded: &str) -> Result<(&str, &str), ImageDecodeError> {
    match encoded.strip_prefix(DATA_URI_SCHEME) {
        Some(rest) => {
            let (mime, payload) = rest
                .split_once(BASE64_MARKER)
                .ok_or(ImageDecodeError::NotBase64)?;
            let mime = if mime.is_empty() { DEFAULT_IMAGE_MIME } else { mime };
            Ok((mime, payload))
        }
        None => Ok((DEFAULT_IMAGE_MIME, encoded)),
    }
}

// Payloads can be megabytes; never dump them into logs.
impl std::fmt::Debug for InlineImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

impl TryFrom<String> for InlineImage {
    type Error = ImageDecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_transport(&value)
    }
}

impl From<InlineImage> for String {
    fn from(image: InlineImage) -> Self {
        image.to_data_uri()
    }
}
