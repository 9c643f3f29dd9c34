use serde::{Deserialize, Serialize};
use url::Url;

use super::OfflineError;

/// A resource request as seen by the fetch interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub url: Url,
}

impl AssetRequest {
    pub fn new(url: &str) -> Result<Self, OfflineError> {
        Ok(Self {
            url: Url::parse(url)?,
        })
    }

    /// Cache key: the URL without its fragment.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }

    /// Browser-extension URLs (`chrome-extension://`, `moz-extension://`, ...)
    /// are never cached.
    pub fn is_extension(&self) -> bool {
        self.url.scheme().ends_with("-extension")
    }
}

impl From<Url> for AssetRequest {
    fn from(url: Url) -> Self {
        Self { url }
    }
}

/// How the response relates to the requesting origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same-origin, fully readable.
    Basic,
    /// Cross-origin but readable.
    Cors,
    /// Cross-origin and unreadable.
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetResponse {
    pub status: u16,
    pub kind: ResponseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(with = "body_base64")]
    pub body: Vec<u8>,
}

impl AssetResponse {
    pub fn new(status: u16, kind: ResponseKind, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            kind,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Bodies are stored as base64 strings inside the JSON cache files.
mod body_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_drops_fragment() {
        let req = AssetRequest::new("https://app.example/index.html#top").unwrap();
        assert_eq!(req.cache_key(), "https://app.example/index.html");
    }

    #[test]
    fn test_is_extension() {
        assert!(AssetRequest::new("chrome-extension://abc/script.js").unwrap().is_extension());
        assert!(AssetRequest::new("moz-extension://abc/script.js").unwrap().is_extension());
        assert!(!AssetRequest::new("https://app.example/").unwrap().is_extension());
    }

    #[test]
    fn test_body_stored_as_base64() {
        let resp = AssetResponse::new(200, ResponseKind::Basic, b"hi".to_vec())
            .with_content_type("text/plain");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["body"], "aGk=");
        assert_eq!(json["kind"], "basic");

        let back: AssetResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, resp);
    }
}
