//! Application configuration management.
//!
//! Configuration lives at `~/.config/beanmap/config.json`; every field is
//! optional in the file and falls back to its default. Notes and photos are
//! kept under the platform data directory, the asset cache and logs under
//! the platform cache directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::DEFAULT_ENDPOINT;
use crate::geo::{self, Coordinates};
use crate::offline::{OfflineError, WorkerConfig};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "beanmap";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured location, `"lat,lon"`.
pub const LOCATION_ENV: &str = "BEANMAP_LOCATION";

/// Search radius used when nothing is configured, in meters.
pub const DEFAULT_RADIUS_METERS: f64 = 3000.0;

/// Nearest shops listed on the landing screen.
pub const DEFAULT_LANDING_PREVIEW: usize = 5;

pub const DEFAULT_LOCATOR_URL: &str = "http://ip-api.com/json/?fields=status,message,lat,lon";

pub const DEFAULT_CACHE_GENERATION: &str = "beanmap-cache-v1";

/// Application shell and static assets pre-populated on install.
pub const DEFAULT_ASSET_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/manifest.json",
    "/favicon.ico",
    "/logo192.png",
    "/logo512.png",
    "/static/js/bundle.js",
    "/static/css/main.css",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed position; when unset the IP locator is used.
    pub location: Option<Coordinates>,
    pub radius_meters: f64,
    pub landing_preview: usize,
    pub overpass_url: String,
    pub locator_url: String,
    /// Origin the web shell is served from; enables the offline asset cache.
    pub asset_origin: Option<String>,
    pub cache_generation: String,
    pub asset_manifest: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: None,
            radius_meters: DEFAULT_RADIUS_METERS,
            landing_preview: DEFAULT_LANDING_PREVIEW,
            overpass_url: DEFAULT_ENDPOINT.to_string(),
            locator_url: DEFAULT_LOCATOR_URL.to_string(),
            asset_origin: None,
            cache_generation: DEFAULT_CACHE_GENERATION.to_string(),
            asset_manifest: DEFAULT_ASSET_MANIFEST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            debug!(path = %path.display(), "Config loaded");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in practice.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(LOCATION_ENV) {
            let location = geo::parse_coordinates(&raw)
                .with_context(|| format!("Invalid {}", LOCATION_ENV))?;
            self.location = Some(location);
        }
        Ok(self)
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Directory holding the per-shop notes and photos.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join("shops"))
    }

    pub fn asset_cache_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join("assets"))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join("logs"))
    }

    /// Offline worker settings, if an asset origin is configured.
    pub fn worker_config(&self) -> Result<Option<WorkerConfig>, OfflineError> {
        self.asset_origin
            .as_deref()
            .map(|origin| {
                WorkerConfig::new(
                    self.cache_generation.clone(),
                    origin,
                    self.asset_manifest.clone(),
                )
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.radius_meters, 3000.0);
        assert_eq!(config.landing_preview, 5);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"radius_meters": 3218.69, "location": {"lat": 40.0, "lon": -73.0}}"#)
            .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.radius_meters, 3218.69);
        assert_eq!(config.location, Some(Coordinates::new(40.0, -73.0)));
        assert_eq!(config.overpass_url, DEFAULT_ENDPOINT);
        assert_eq!(config.cache_generation, DEFAULT_CACHE_GENERATION);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            asset_origin: Some("https://app.example".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_env_override() {
        let config = Config::default()
            .with_env_overrides(|name| (name == LOCATION_ENV).then(|| "51.5,-0.12".to_string()))
            .unwrap();
        assert_eq!(config.location, Some(Coordinates::new(51.5, -0.12)));

        let bad = Config::default().with_env_overrides(|_| Some("nowhere".to_string()));
        assert!(bad.is_err());
    }

    #[test]
    fn test_worker_config() {
        assert!(Config::default().worker_config().unwrap().is_none());

        let config = Config {
            asset_origin: Some("https://app.example".to_string()),
            cache_generation: "beanmap-cache-v2".to_string(),
            ..Config::default()
        };
        let worker = config.worker_config().unwrap().unwrap();
        assert_eq!(worker.generation, "beanmap-cache-v2");
        assert_eq!(worker.manifest.len(), DEFAULT_ASSET_MANIFEST.len());
    }
}
