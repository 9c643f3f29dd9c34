use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use url::{Origin, Url};

use super::{AssetRequest, AssetResponse, OfflineError, ResponseKind};

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// The network side of the fetch interceptor.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, OfflineError>;
}

/// `Fetcher` over reqwest. Responses whose final URL (after redirects)
/// shares the app origin are `Basic`, everything else `Cors`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    origin: Origin,
}

impl HttpFetcher {
    pub fn new(app_origin: &Url) -> Result<Self, OfflineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| OfflineError::Network(e.to_string()))?;
        Ok(Self {
            client,
            origin: app_origin.origin(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, OfflineError> {
        let response = self
            .client
            .get(request.url.clone())
            .send()
            .await
            .map_err(|e| OfflineError::Network(e.to_string()))?;

        let kind = if response.url().origin() == self.origin {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        };
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| OfflineError::Network(e.to_string()))?;

        Ok(AssetResponse {
            status,
            kind,
            content_type,
            body: body.to_vec(),
        })
    }
}
