//! Loading route files and directory-config files.
//!
//! # Responsibilities
//! - Parse data route files (`.json`, `.jsonc`) into one static rule
//! - Parse declarative directory configs (`.toml`, `.json`)
//! - Resolve module-format files through a `ModuleLoader`
//!
//! # Design Decisions
//! - Module files cannot be evaluated; host code registers their exports
//!   per path in a `ModuleRegistry`
//! - Every failure is a `LoadError`; callers log and treat the file as absent

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::scan::exports::{ConfigExport, DirectoryConfig, MockRule, RuleExport};
use crate::scan::kind::{self, FileKind};

/// Error type for file loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no module registered for {0}")]
    NotRegistered(PathBuf),

    #[error("{0} does not export an object")]
    NotAnObject(PathBuf),

    #[error("{0} is not a loadable file")]
    Unsupported(PathBuf),
}

/// Resolves exports of module-format files.
pub trait ModuleLoader: Send + Sync {
    fn load_rules(&self, path: &Path) -> Result<RuleExport, LoadError>;
    fn load_config(&self, path: &Path) -> Result<ConfigExport, LoadError>;
}

/// In-memory module exports keyed by absolute file path.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    rules: HashMap<PathBuf, RuleExport>,
    configs: HashMap<PathBuf, ConfigExport>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the rules exported by a route module.
    pub fn register_rules(&mut self, path: impl Into<PathBuf>, export: impl Into<RuleExport>) -> &mut Self {
        self.rules.insert(path.into(), export.into());
        self
    }

    /// Register the config exported by an `index.config.*` module.
    pub fn register_config(&mut self, path: impl Into<PathBuf>, export: impl Into<ConfigExport>) -> &mut Self {
        self.configs.insert(path.into(), export.into());
        self
    }

    /// Register a config factory, evaluated on every load.
    pub fn register_config_fn<F>(&mut self, path: impl Into<PathBuf>, factory: F) -> &mut Self
    where
        F: Fn() -> DirectoryConfig + Send + Sync + 'static,
    {
        self.configs
            .insert(path.into(), ConfigExport::Factory(Arc::new(factory)));
        self
    }

    pub fn into_shared(self) -> Arc<dyn ModuleLoader> {
        Arc::new(self)
    }
}

impl ModuleLoader for ModuleRegistry {
    fn load_rules(&self, path: &Path) -> Result<RuleExport, LoadError> {
        self.rules
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotRegistered(path.to_path_buf()))
    }

    fn load_config(&self, path: &Path) -> Result<ConfigExport, LoadError> {
        self.configs
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotRegistered(path.to_path_buf()))
    }
}

/// Load the rules of a route file.
pub fn load_rule_file(path: &Path, modules: &dyn ModuleLoader) -> Result<Vec<MockRule>, LoadError> {
    match kind::classify(path) {
        FileKind::Data => {
            let value = read_json(path)?;
            Ok(vec![MockRule::from_value(value)])
        }
        FileKind::Module => Ok(modules.load_rules(path)?.into_rules()),
        _ => Err(LoadError::Unsupported(path.to_path_buf())),
    }
}

/// Load a directory-config file.
pub fn load_config_file(path: &Path, modules: &dyn ModuleLoader) -> Result<DirectoryConfig, LoadError> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    match kind::extension(name).as_deref() {
        Some("toml") => {
            let content = read(path)?;
            toml::from_str(&content).map_err(|source| LoadError::Toml {
                path: path.to_path_buf(),
                source,
            })
        }
        Some("json") => config_from_value(path, read_json(path)?),
        Some(_) => match modules.load_config(path)? {
            ConfigExport::Object(config) => Ok(config),
            ConfigExport::Factory(factory) => Ok(factory()),
            ConfigExport::Value(value) => config_from_value(path, value),
        },
        None => Err(LoadError::Unsupported(path.to_path_buf())),
    }
}

fn config_from_value(path: &Path, value: Value) -> Result<DirectoryConfig, LoadError> {
    if !value.is_object() {
        return Err(LoadError::NotAnObject(path.to_path_buf()));
    }
    serde_json::from_value(value).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json(path: &Path) -> Result<Value, LoadError> {
    let content = read(path)?;
    let is_jsonc = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("jsonc"))
        .unwrap_or(false);
    let content = if is_jsonc { strip_jsonc(&content) } else { content };

    serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove comments and trailing commas so `serde_json` accepts JSONC.
pub fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;
    let mut pending_comma: Option<usize> = None;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            '}' | ']' => {
                if let Some(pos) = pending_comma.take() {
                    out.remove(pos);
                }
                out.push(c);
            }
            ',' => {
                pending_comma = Some(out.len());
                out.push(c);
            }
            c if c.is_whitespace() => out.push(c),
            '"' => {
                pending_comma = None;
                in_string = true;
                out.push(c);
            }
            other => {
                pending_comma = None;
                out.push(other);
            }
        }
    }

    out
}
