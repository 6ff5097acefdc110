//! Directory-backed, name-addressed cache of [`GameConfig`]s.
//!
//! Lookups are synchronous: config files are small, read once per
//! process lifetime per name, and cached, so a blocking `RwLock` (the
//! same discipline `mathieufro-strobe`'s session manager uses for its
//! in-memory side tables) is the right tool rather than pulling tokio
//! into a crate that otherwise has none.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::config::GameConfig;
use crate::error::EngineError;

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// One entry of [`ConfigRegistry::list`].
#[derive(Clone, Debug, serde::Serialize)]
pub struct ConfigInfo {
    pub name: String,
    pub description: String,
    pub grid_size: u32,
}

pub struct ConfigRegistry {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<GameConfig>>>,
    default_name: String,
}

impl ConfigRegistry {
    /// `dir` need not exist yet; it's created lazily on first `save`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let default = crate::default_config();
        let mut cache = HashMap::new();
        let default_name = default.name.clone();
        cache.insert(default_name.clone(), Arc::new(default));
        Self {
            dir: dir.into(),
            cache: RwLock::new(cache),
            default_name,
        }
    }

    /// Validate and persist `config` under `name`, then cache it.
    pub fn save(&self, name: &str, config: GameConfig) -> Result<Arc<GameConfig>, EngineError> {
        let validated = GameConfig::validated(config)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            EngineError::InvalidConfig(format!("could not create configs dir: {e}"))
        })?;
        let body = toml::to_string_pretty(&validated)
            .map_err(|e| EngineError::InvalidConfig(format!("could not serialize config: {e}")))?;
        let path = self.path_for(name);
        let tmp_path = self.dir.join(format!(".tmp-{name}"));
        std::fs::write(&tmp_path, body)
            .map_err(|e| EngineError::InvalidConfig(format!("could not write config: {e}")))?;
        std::fs::rename(&tmp_path, &path)
            .map_err(|e| EngineError::InvalidConfig(format!("could not commit config: {e}")))?;

        let arc = Arc::new(validated);
        write_lock(&self.cache).insert(name.to_string(), arc.clone());
        Ok(arc)
    }

    /// Load `name` from cache, falling back to disk, falling back to the
    /// compiled-in default for an empty or unknown name. Callers that
    /// need to distinguish "unknown name" from "using the default"
    /// should check `list()` first; this is the lenient path the
    /// command service's `create_session` uses.
    pub fn load_or_default(&self, name: &str) -> Arc<GameConfig> {
        if name.is_empty() {
            return self.must_get_cached(&self.default_name);
        }
        self.load(name).unwrap_or_else(|_| self.must_get_cached(&self.default_name))
    }

    /// Load `name`, failing if it is neither cached nor on disk.
    pub fn load(&self, name: &str) -> Result<Arc<GameConfig>, EngineError> {
        if let Some(cached) = read_lock(&self.cache).get(name) {
            return Ok(cached.clone());
        }

        let path = self.path_for(name);
        let body = std::fs::read_to_string(&path)
            .map_err(|_| EngineError::InvalidConfig(format!("no such config: {name}")))?;
        let raw: GameConfig = toml::from_str(&body)
            .map_err(|e| EngineError::InvalidConfig(format!("malformed config {name}: {e}")))?;
        let validated = GameConfig::validated(raw)?;
        let arc = Arc::new(validated);
        write_lock(&self.cache).insert(name.to_string(), arc.clone());
        Ok(arc)
    }

    /// Names and summaries of every config on disk, plus the compiled-in
    /// default.
    pub fn list(&self) -> Vec<ConfigInfo> {
        let mut out = vec![ConfigInfo {
            name: self.default_name.clone(),
            description: self.must_get_cached(&self.default_name).description.clone(),
            grid_size: self.must_get_cached(&self.default_name).grid_size,
        }];

        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return out;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem == self.default_name {
                continue;
            }
            match self.load(stem) {
                Ok(cfg) => out.push(ConfigInfo {
                    name: stem.to_string(),
                    description: cfg.description.clone(),
                    grid_size: cfg.grid_size,
                }),
                Err(e) => tracing::warn!("skipping malformed config {stem}: {e}"),
            }
        }
        out
    }

    fn path_for(&self, name: &str) -> PathBuf {
        Path::new(&self.dir).join(format!("{name}.toml"))
    }

    fn must_get_cached(&self, name: &str) -> Arc<GameConfig> {
        read_lock(&self.cache)
            .get(name)
            .cloned()
            .expect("default config is always present in the cache")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ConfigRegistry::new(dir.path());
        let cfg = registry.load_or_default("");
        assert_eq!(cfg.name, "default");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ConfigRegistry::new(dir.path());
        let mut raw = (*registry.must_get_cached("default")).clone();
        raw.name = "custom".into();
        registry.save("custom", raw).unwrap();

        let fresh = ConfigRegistry::new(dir.path());
        let loaded = fresh.load("custom").unwrap();
        assert_eq!(loaded.name, "custom");
    }

    #[test]
    fn unknown_name_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ConfigRegistry::new(dir.path());
        assert!(registry.load("does-not-exist").is_err());
    }

    #[test]
    fn list_includes_default_and_saved_configs() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ConfigRegistry::new(dir.path());
        let mut raw = (*registry.must_get_cached("default")).clone();
        raw.name = "extra".into();
        registry.save("extra", raw).unwrap();

        let names: Vec<_> = registry.list().into_iter().map(|c| c.name).collect();
        assert!(names.contains(&"default".to_string()));
        assert!(names.contains(&"extra".to_string()));
    }
}
