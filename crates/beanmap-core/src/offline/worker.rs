use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use url::{Origin, Url};

use super::{AssetRequest, AssetResponse, CacheState, Fetcher, OfflineError};

/// Maximum concurrent manifest fetches during install.
const MAX_CONCURRENT_INSTALL_FETCHES: usize = 6;

/// Static description of one deployment.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name of the current cache generation, e.g. `beanmap-cache-v1`.
    pub generation: String,
    /// Origin the application is served from.
    pub origin: Url,
    /// Asset paths to pre-populate, relative to the origin.
    pub manifest: Vec<String>,
}

impl WorkerConfig {
    pub fn new(
        generation: impl Into<String>,
        origin: &str,
        manifest: Vec<String>,
    ) -> Result<Self, OfflineError> {
        let generation = generation.into();
        let valid_name = !generation.is_empty()
            && generation
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !generation.starts_with('.');
        if !valid_name {
            return Err(OfflineError::InvalidGeneration(generation));
        }

        let origin = Url::parse(origin)?;
        if !origin.origin().is_tuple() {
            return Err(OfflineError::InvalidOrigin(origin.to_string()));
        }

        Ok(Self {
            generation,
            origin,
            manifest,
        })
    }
}

/// Result of pre-populating a generation.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub generation: String,
    pub cached: Vec<String>,
    /// `(asset, reason)` for every asset left uncached.
    pub failed: Vec<(String, String)>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    /// Answered from a cache generation without touching the network.
    Cache,
    /// Same-origin miss answered by the network; `stored` tells whether the
    /// response went into the current generation.
    Network { stored: bool },
    /// Cross-origin request sent straight to the network.
    Bypass,
}

#[derive(Debug, Clone)]
pub struct Served {
    pub response: AssetResponse,
    pub source: ServedFrom,
}

/// Install / fetch / activate lifecycle for one deployment.
#[derive(Debug, Clone)]
pub struct OfflineWorker {
    config: WorkerConfig,
    origin: Origin,
}

impl OfflineWorker {
    pub fn new(config: WorkerConfig) -> Self {
        let origin = config.origin.origin();
        Self { config, origin }
    }

    pub fn generation(&self) -> &str {
        &self.config.generation
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    fn resolve(&self, asset: &str) -> Result<AssetRequest, OfflineError> {
        Ok(AssetRequest::from(self.config.origin.join(asset)?))
    }

    fn is_same_origin(&self, request: &AssetRequest) -> bool {
        request.url.origin() == self.origin
    }

    /// Only complete, same-origin responses are worth keeping.
    fn is_cacheable(request: &AssetRequest, response: &AssetResponse) -> bool {
        response.status == 200
            && response.kind == super::ResponseKind::Basic
            && !request.is_extension()
    }

    /// Pre-populate the current generation from the manifest. Failures are
    /// logged and reported but never stop the remaining assets.
    pub async fn install<F>(&self, mut state: CacheState, fetcher: &F) -> (CacheState, InstallReport)
    where
        F: Fetcher + ?Sized,
    {
        let generation = self.config.generation.as_str();
        state.open(generation);
        let mut report = InstallReport {
            generation: generation.to_string(),
            ..Default::default()
        };

        let mut requests = Vec::new();
        for asset in &self.config.manifest {
            match self.resolve(asset) {
                Ok(request) => requests.push((asset.clone(), request)),
                Err(e) => {
                    warn!(asset = %asset, error = %e, "Failed to cache");
                    report.failed.push((asset.clone(), e.to_string()));
                }
            }
        }

        let results: Vec<_> = stream::iter(requests)
            .map(|(asset, request)| async move {
                let result = fetcher.fetch(&request).await;
                (asset, request, result)
            })
            .buffer_unordered(MAX_CONCURRENT_INSTALL_FETCHES)
            .collect()
            .await;

        for (asset, request, result) in results {
            match result {
                Ok(response) if response.is_success() => {
                    state.put(generation, request.cache_key(), response);
                    report.cached.push(asset);
                }
                Ok(response) => {
                    warn!(asset = %asset, status = response.status, "Failed to cache");
                    report
                        .failed
                        .push((asset, format!("status {}", response.status)));
                }
                Err(e) => {
                    warn!(asset = %asset, error = %e, "Failed to cache");
                    report.failed.push((asset, e.to_string()));
                }
            }
        }

        report.cached.sort();
        report.failed.sort();
        info!(
            generation,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "Install finished"
        );
        (state, report)
    }

    /// Answer one request. Same-origin requests are served cache-first and
    /// fill the current generation on a miss; cross-origin requests bypass
    /// the cache entirely. Network failures are returned, not retried.
    pub async fn handle_fetch<F>(
        &self,
        mut state: CacheState,
        request: &AssetRequest,
        fetcher: &F,
    ) -> (CacheState, Result<Served, OfflineError>)
    where
        F: Fetcher + ?Sized,
    {
        if !self.is_same_origin(request) {
            debug!(url = %request.url, "Cross-origin request, bypassing cache");
            let result = fetcher.fetch(request).await.map(|response| Served {
                response,
                source: ServedFrom::Bypass,
            });
            return (state, result);
        }

        let key = request.cache_key();
        if let Some(hit) = state.lookup(&key, &self.config.generation).cloned() {
            debug!(url = %request.url, "Cache hit");
            return (
                state,
                Ok(Served {
                    response: hit,
                    source: ServedFrom::Cache,
                }),
            );
        }

        let response = match fetcher.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %request.url, error = %e, "Network fetch failed");
                return (state, Err(e));
            }
        };

        let stored = Self::is_cacheable(request, &response);
        if stored {
            state.put(&self.config.generation, key, response.clone());
        }
        debug!(url = %request.url, status = response.status, stored, "Served from network");
        (
            state,
            Ok(Served {
                response,
                source: ServedFrom::Network { stored },
            }),
        )
    }

    /// Delete every generation but the current one. Returns the deleted
    /// names.
    pub fn activate(&self, mut state: CacheState) -> (CacheState, Vec<String>) {
        let stale: Vec<String> = state
            .names()
            .into_iter()
            .filter(|name| name != &self.config.generation)
            .collect();

        for name in &stale {
            state.delete(name);
            info!(generation = %name, "Deleted stale cache generation");
        }
        (state, stale)
    }
}
