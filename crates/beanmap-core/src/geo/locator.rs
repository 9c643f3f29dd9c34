//! Single-fix position lookup.
//!
//! A terminal has no platform location service, so the fix comes either from
//! configuration (`FixedLocator`) or from an IP geolocation endpoint
//! (`IpLocator`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::Coordinates;

/// HTTP request timeout for the IP lookup in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Location unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid location: {0}")]
    Invalid(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Something that can produce the user's current position.
#[async_trait]
pub trait Locator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Always answers with the same configured position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator {
    position: Coordinates,
}

impl FixedLocator {
    pub fn new(position: Coordinates) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Locator for FixedLocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        if !self.position.is_valid() {
            return Err(LocationError::Invalid(self.position.display()));
        }
        Ok(self.position)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate position from the public IP address.
#[derive(Clone)]
pub struct IpLocator {
    client: Client,
    endpoint: String,
}

impl IpLocator {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Locator for IpLocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        let response = self.client.get(&self.endpoint).send().await?;
        if !response.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "lookup returned {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response.json().await?;
        debug!(status = %body.status, "IP location lookup finished");
        parse_lookup(body)
    }
}

fn parse_lookup(body: IpLookupResponse) -> Result<Coordinates, LocationError> {
    if body.status != "success" {
        return Err(LocationError::Unavailable(
            body.message.unwrap_or_else(|| "lookup failed".to_string()),
        ));
    }
    match (body.lat, body.lon) {
        (Some(lat), Some(lon)) => {
            let coords = Coordinates::new(lat, lon);
            if coords.is_valid() {
                Ok(coords)
            } else {
                Err(LocationError::Invalid(coords.display()))
            }
        }
        _ => Err(LocationError::Unavailable("lookup returned no position".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_locator() {
        let locator = FixedLocator::new(Coordinates::new(40.0, -73.0));
        assert_eq!(locator.locate().await.unwrap(), Coordinates::new(40.0, -73.0));

        let bad = FixedLocator::new(Coordinates::new(200.0, 0.0));
        assert!(matches!(bad.locate().await, Err(LocationError::Invalid(_))));
    }

    #[test]
    fn test_parse_lookup_success() {
        let body: IpLookupResponse =
            serde_json::from_str(r#"{"status":"success","lat":51.5,"lon":-0.12}"#).unwrap();
        assert_eq!(parse_lookup(body).unwrap(), Coordinates::new(51.5, -0.12));
    }

    #[test]
    fn test_parse_lookup_failure() {
        let body: IpLookupResponse =
            serde_json::from_str(r#"{"status":"fail","message":"private range"}"#).unwrap();
        match parse_lookup(body) {
            Err(LocationError::Unavailable(msg)) => assert_eq!(msg, "private range"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
