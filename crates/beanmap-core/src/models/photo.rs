use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("Not a base64 data URL")]
    NotDataUrl,

    #[error("Invalid base64 payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// A photo attached to a shop, embedded inline as a base64 data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredPhoto")]
pub struct Photo {
    pub id: i64,
    #[serde(rename = "url")]
    pub data_url: String,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "edited", skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

/// On-disk shape; `edited` and the older `editedAt` may both be present.
#[derive(Deserialize)]
struct StoredPhoto {
    id: i64,
    url: String,
    date: DateTime<Utc>,
    #[serde(default)]
    edited: Option<DateTime<Utc>>,
    #[serde(default, rename = "editedAt")]
    edited_at: Option<DateTime<Utc>>,
}

impl From<StoredPhoto> for Photo {
    fn from(stored: StoredPhoto) -> Self {
        Self {
            id: stored.id,
            data_url: stored.url,
            created_at: stored.date,
            edited_at: stored.edited.max(stored.edited_at),
        }
    }
}

impl Photo {
    pub fn new(id: i64, data_url: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            data_url: data_url.into(),
            created_at,
            edited_at: None,
        }
    }

    /// Build a photo from raw image bytes.
    pub fn from_image_bytes(id: i64, bytes: &[u8], mime: &str, created_at: DateTime<Utc>) -> Self {
        Self::new(id, encode_data_url(bytes, mime), created_at)
    }

    /// Replace the image with a new capture and stamp the edit time.
    pub fn retake(&mut self, data_url: impl Into<String>, at: DateTime<Utc>) {
        self.data_url = data_url.into();
        self.edited_at = Some(at);
    }

    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    /// MIME type declared in the data URL, e.g. `image/jpeg`.
    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.data_url.strip_prefix("data:")?;
        let (meta, _) = rest.split_once(',')?;
        meta.strip_suffix(";base64")
    }

    /// Decode the embedded image.
    pub fn image_bytes(&self) -> Result<Vec<u8>, PhotoError> {
        let rest = self.data_url.strip_prefix("data:").ok_or(PhotoError::NotDataUrl)?;
        let (meta, payload) = rest.split_once(',').ok_or(PhotoError::NotDataUrl)?;
        if !meta.ends_with(";base64") {
            return Err(PhotoError::NotDataUrl);
        }
        Ok(STANDARD.decode(payload)?)
    }

    /// Approximate decoded size, for display.
    pub fn approx_size_bytes(&self) -> usize {
        let payload_len = self
            .data_url
            .split_once(',')
            .map(|(_, p)| p.len())
            .unwrap_or(0);
        payload_len / 4 * 3
    }
}

/// Encode image bytes as a `data:<mime>;base64,...` URL.
pub fn encode_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// MIME type for a file extension, falling back to JPEG.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}
