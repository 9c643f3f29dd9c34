//! Cache generations and their on-disk form.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AssetResponse, OfflineError};

/// Cached responses of one deployment, keyed by request URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    entries: BTreeMap<String, AssetResponse>,
}

impl Generation {
    pub fn get(&self, key: &str) -> Option<&AssetResponse> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All cache generations known to the worker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheState {
    generations: BTreeMap<String, Generation>,
}

impl CacheState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a generation, creating it empty if needed.
    pub fn open(&mut self, name: &str) -> &mut Generation {
        self.generations.entry(name.to_string()).or_default()
    }

    pub fn generation(&self, name: &str) -> Option<&Generation> {
        self.generations.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.generations.keys().cloned().collect()
    }

    pub fn delete(&mut self, name: &str) -> bool {
        self.generations.remove(name).is_some()
    }

    pub fn put(&mut self, name: &str, key: String, response: AssetResponse) {
        self.open(name).entries.insert(key, response);
    }

    /// Find `key` in any generation, looking in `preferred` first.
    pub fn lookup(&self, key: &str, preferred: &str) -> Option<&AssetResponse> {
        self.generations
            .get(preferred)
            .and_then(|g| g.get(key))
            .or_else(|| self.generations.values().find_map(|g| g.get(key)))
    }

    /// Load every `<generation>.json` file in `dir`. A missing directory is
    /// an empty state.
    pub fn load(dir: &Path) -> Result<Self, OfflineError> {
        let mut state = Self::default();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(state),
            Err(source) => {
                return Err(OfflineError::Io {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let contents = std::fs::read_to_string(&path).map_err(|source| OfflineError::Io {
                path: path.clone(),
                source,
            })?;
            let generation: Generation = serde_json::from_str(&contents)
                .map_err(|source| OfflineError::Corrupt { path: path.clone(), source })?;
            debug!(generation = %name, entries = generation.len(), "Loaded cache generation");
            state.generations.insert(name, generation);
        }
        Ok(state)
    }

    /// Write one file per generation and remove files of generations that
    /// are gone.
    pub fn save(&self, dir: &Path) -> Result<(), OfflineError> {
        std::fs::create_dir_all(dir).map_err(|source| OfflineError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for (name, generation) in &self.generations {
            let contents = serde_json::to_string(generation)?;
            write_replacing(dir, name, &contents)?;
        }

        let stale: Vec<_> = std::fs::read_dir(dir)
            .map_err(|source| OfflineError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter(|p| {
                p.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|name| !self.generations.contains_key(name))
                    .unwrap_or(false)
            })
            .collect();

        for path in stale {
            std::fs::remove_file(&path).map_err(|source| OfflineError::Io {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "Removed stale cache generation file");
        }
        Ok(())
    }
}

/// Write `<name>.json` through a temporary file so an interrupted save
/// leaves the previous file intact.
fn write_replacing(dir: &Path, name: &str, contents: &str) -> Result<(), OfflineError> {
    let path = dir.join(format!("{}.json", name));
    let tmp = dir.join(format!("{}.json.tmp", name));
    std::fs::write(&tmp, contents).map_err(|source| OfflineError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, &path).map_err(|source| OfflineError::Io {
        path: path.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::ResponseKind;
    use tempfile::TempDir;

    fn response(body: &str) -> AssetResponse {
        AssetResponse::new(200, ResponseKind::Basic, body.as_bytes().to_vec())
    }

    #[test]
    fn test_lookup_prefers_current_generation() {
        let mut state = CacheState::new();
        state.put("v1", "k".to_string(), response("old"));
        state.put("v2", "k".to_string(), response("new"));
        state.put("v1", "only-old".to_string(), response("legacy"));

        assert_eq!(state.lookup("k", "v2").unwrap().body, b"new");
        assert_eq!(state.lookup("only-old", "v2").unwrap().body, b"legacy");
        assert!(state.lookup("missing", "v2").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let mut state = CacheState::new();
        state.put("v1", "https://app.example/".to_string(), response("<html>"));
        state.open("v2");
        state.save(dir.path()).unwrap();

        let loaded = CacheState::load(dir.path()).unwrap();
        assert_eq!(loaded, state);

        state.delete("v1");
        state.save(dir.path()).unwrap();
        assert!(!dir.path().join("v1.json").exists());
        assert_eq!(CacheState::load(dir.path()).unwrap().names(), vec!["v2".to_string()]);
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let state = CacheState::load(&dir.path().join("nope")).unwrap();
        assert!(state.names().is_empty());
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("v1.json"), "not json").unwrap();
        assert!(matches!(
            CacheState::load(dir.path()),
            Err(OfflineError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_interrupted_save_keeps_previous_generation() {
        let dir = TempDir::new().unwrap();
        let mut state = CacheState::new();
        state.put("v1", "https://app.example/".to_string(), response("<html>"));
        state.save(dir.path()).unwrap();

        // A save that died after writing its temporary file.
        std::fs::write(dir.path().join("v1.json.tmp"), "{\"entr").unwrap();
        assert_eq!(CacheState::load(dir.path()).unwrap(), state);

        state.put("v1", "https://app.example/app.js".to_string(), response("js"));
        state.save(dir.path()).unwrap();
        assert!(!dir.path().join("v1.json.tmp").exists());
        assert_eq!(CacheState::load(dir.path()).unwrap(), state);
    }
}
