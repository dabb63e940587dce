//! Directory config resolution.
//!
//! # Data Flow
//! ```text
//! file path + root
//!     → ancestor directories (root first)
//!     → index.config.* lookup per directory (memoized)
//!     → load per config file (memoized)
//!     → merge root → leaf into EffectiveConfig + ConfigChain
//! ```
//!
//! # Design Decisions
//! - Scalars: last writer wins, the deepest directory overrides ancestors
//! - Headers: shallow union, deeper keys win
//! - Middlewares: concatenated in traversal order, tagged with source
//! - Both caches live in `ScanCache`, owned by one scan cycle
//! - An invalid config file is logged and treated as absent

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::dispatch::middleware::{MiddlewarePosition, ResolvedMiddleware};
use crate::scan::exports::DirectoryConfig;
use crate::scan::kind;
use crate::scan::loader::{load_config_file, ModuleLoader};

/// Fields of a directory config, for provenance tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigField {
    Headers,
    Status,
    Delay,
    Enabled,
    IgnorePrefix,
    Include,
    Exclude,
    Middleware,
}

/// A config chain reduced to one logical config.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfig {
    pub headers: BTreeMap<String, String>,
    pub status: Option<u16>,
    pub delay: Option<u64>,
    pub enabled: Option<bool>,
    pub ignore_prefix: Option<Vec<String>>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub middlewares: Vec<ResolvedMiddleware>,
    /// Config file that last set each field.
    pub config_sources: BTreeMap<ConfigField, PathBuf>,
}

impl EffectiveConfig {
    pub fn source(&self, field: ConfigField) -> Option<&Path> {
        self.config_sources.get(&field).map(PathBuf::as_path)
    }

    fn merge(&mut self, path: &Path, config: &DirectoryConfig) {
        if let Some(headers) = &config.headers {
            self.headers
                .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
            self.mark(ConfigField::Headers, path);
        }
        if let Some(status) = config.status {
            self.status = Some(status);
            self.mark(ConfigField::Status, path);
        }
        if let Some(delay) = config.delay {
            self.delay = Some(delay);
            self.mark(ConfigField::Delay, path);
        }
        if let Some(enabled) = config.enabled {
            self.enabled = Some(enabled);
            self.mark(ConfigField::Enabled, path);
        }
        if let Some(prefixes) = &config.ignore_prefix {
            self.ignore_prefix = Some(prefixes.clone().into_vec());
            self.mark(ConfigField::IgnorePrefix, path);
        }
        if let Some(include) = &config.include {
            self.include = Some(include.clone().into_vec());
            self.mark(ConfigField::Include, path);
        }
        if let Some(exclude) = &config.exclude {
            self.exclude = Some(exclude.clone().into_vec());
            self.mark(ConfigField::Exclude, path);
        }

        let before = self.middlewares.len();
        self.push_bucket(path, config, MiddlewarePosition::Pre);
        self.push_bucket(path, config, MiddlewarePosition::Normal);
        if let Some(legacy) = &config.legacy_middleware {
            self.middlewares.push(ResolvedMiddleware {
                handle: legacy.clone(),
                source: path.to_path_buf(),
                index: config.middleware.normal.len(),
                position: MiddlewarePosition::Normal,
            });
        }
        self.push_bucket(path, config, MiddlewarePosition::Post);
        if self.middlewares.len() > before {
            self.mark(ConfigField::Middleware, path);
        }
    }

    fn push_bucket(&mut self, path: &Path, config: &DirectoryConfig, position: MiddlewarePosition) {
        for (index, handle) in config.middleware.bucket(position).iter().enumerate() {
            self.middlewares.push(ResolvedMiddleware {
                handle: handle.clone(),
                source: path.to_path_buf(),
                index,
                position,
            });
        }
    }

    fn mark(&mut self, field: ConfigField, path: &Path) {
        self.config_sources.insert(field, path.to_path_buf());
    }
}

/// Effective config plus the config files it was built from, root first.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub effective: EffectiveConfig,
    pub chain: Vec<PathBuf>,
}

/// Caches owned by a single scan cycle.
#[derive(Debug, Default)]
pub struct ScanCache {
    /// Directory → config file found in it.
    lookup: HashMap<PathBuf, Option<PathBuf>>,
    /// Config file → parsed config (`None` when invalid).
    configs: HashMap<PathBuf, Option<Arc<DirectoryConfig>>>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Resolves effective directory config for files under a root.
pub struct ConfigResolver<'a> {
    modules: &'a dyn ModuleLoader,
    cache: &'a mut ScanCache,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(modules: &'a dyn ModuleLoader, cache: &'a mut ScanCache) -> Self {
        Self { modules, cache }
    }

    /// Resolve the config that applies to `file`.
    pub fn resolve(&mut self, file: &Path, root: &Path) -> ResolvedConfig {
        match file.parent() {
            Some(dir) => self.resolve_dir(dir, root),
            None => ResolvedConfig::default(),
        }
    }

    /// Resolve the config that applies inside `dir`.
    pub fn resolve_dir(&mut self, dir: &Path, root: &Path) -> ResolvedConfig {
        let mut resolved = ResolvedConfig::default();

        for ancestor in ancestors(dir, root) {
            let Some(config_path) = self.find_config(&ancestor) else {
                continue;
            };
            let Some(config) = self.load(&config_path) else {
                continue;
            };
            resolved.effective.merge(&config_path, &config);
            resolved.chain.push(config_path);
        }

        resolved
    }

    fn find_config(&mut self, dir: &Path) -> Option<PathBuf> {
        self.cache
            .lookup
            .entry(dir.to_path_buf())
            .or_insert_with(|| {
                kind::config_file_names()
                    .map(|name| dir.join(name))
                    .find(|candidate| candidate.is_file())
            })
            .clone()
    }

    fn load(&mut self, path: &Path) -> Option<Arc<DirectoryConfig>> {
        if let Some(cached) = self.cache.configs.get(path) {
            return cached.clone();
        }

        let loaded = match load_config_file(path, self.modules) {
            Ok(config) => {
                tracing::debug!(config = %path.display(), "Loaded directory config");
                Some(Arc::new(config))
            }
            Err(e) => {
                tracing::warn!(config = %path.display(), error = %e, "Invalid directory config, ignoring");
                None
            }
        };
        self.cache.configs.insert(path.to_path_buf(), loaded.clone());
        loaded
    }
}

/// Directories from `root` down to `dir`, inclusive.
fn ancestors(dir: &Path, root: &Path) -> Vec<PathBuf> {
    let mut chain = Vec::new();
    let mut current = dir.to_path_buf();

    loop {
        chain.push(current.clone());
        if current == root {
            break;
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => break,
        }
    }

    chain.reverse();
    chain
}
