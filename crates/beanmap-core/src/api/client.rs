//! HTTP client for the Overpass interpreter endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, error, info};

use super::query::build_query;
use super::ApiError;
use crate::geo::Coordinates;
use crate::models::{OverpassResponse, ShopRecord};

/// Public Overpass interpreter used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// HTTP request timeout in seconds.
/// Comfortably above the 25s server-side query timeout.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Overpass API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct OverpassClient {
    client: Client,
    endpoint: String,
}

impl OverpassClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("beanmap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Cafés within `radius_m` meters of `user`, nearest first.
    pub async fn fetch_cafes(&self, user: Coordinates, radius_m: f64) -> Result<Vec<ShopRecord>> {
        let query = build_query(&user, radius_m);
        debug!(endpoint = %self.endpoint, %query, "Sending Overpass query");

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .map_err(ApiError::NetworkError)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body).into());
        }

        let body: OverpassResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .context("Failed to parse Overpass response")?;

        let shops = shops_from_response(&body, &user);
        info!(
            elements = body.elements.len(),
            shops = shops.len(),
            radius_m,
            "Fetched nearby cafés"
        );
        Ok(shops)
    }
}

/// Normalize every usable element and sort by distance, nearest first.
pub fn shops_from_response(body: &OverpassResponse, user: &Coordinates) -> Vec<ShopRecord> {
    let mut shops: Vec<ShopRecord> = body
        .elements
        .iter()
        .filter_map(|e| ShopRecord::from_element(e, user))
        .collect();
    shops.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    shops
}

/// Outcome of a nearby lookup that never fails outright.
#[derive(Debug, Clone, Default)]
pub struct NearbyShops {
    pub shops: Vec<ShopRecord>,
    /// User-facing message when the lookup failed.
    pub error: Option<String>,
}

impl NearbyShops {
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

/// Look up nearby cafés, turning any failure into an empty list plus a
/// logged, displayable error.
pub async fn nearby_shops(client: &OverpassClient, user: Coordinates, radius_m: f64) -> NearbyShops {
    match client.fetch_cafes(user, radius_m).await {
        Ok(shops) => NearbyShops { shops, error: None },
        Err(e) => {
            error!(error = %e, "Error fetching coffee shops");
            NearbyShops {
                shops: Vec::new(),
                error: Some("Error fetching coffee shops".to_string()),
            }
        }
    }
}
