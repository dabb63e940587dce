//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scan::scanner::ScanOptions;
use crate::scan::walker::DEFAULT_EXCLUDED_DIRS;

/// Root configuration for the mock server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Mock directory discovery.
    pub mock: MockConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ServerConfig {
    /// Scan inputs derived from the `[mock]` section.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            roots: self.mock.dirs.clone(),
            prefix: self.mock.prefix.clone(),
            include: self.mock.include.clone(),
            exclude: self.mock.exclude.clone(),
            ignore_prefix: self.mock.ignore_prefix.clone(),
            excluded_dirs: self.mock.exclude_dirs.clone(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Where mock files live and which of them become routes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MockConfig {
    /// Root directories, scanned in order.
    pub dirs: Vec<PathBuf>,

    /// URL prefix for every route (e.g., "/api").
    pub prefix: String,

    /// Glob patterns a file must match to be scanned.
    pub include: Option<Vec<String>>,

    /// Glob patterns that exclude a file.
    pub exclude: Option<Vec<String>>,

    /// Path-segment prefixes that hide a file (default ".").
    pub ignore_prefix: Option<Vec<String>>,

    /// Directory names never descended into.
    pub exclude_dirs: Vec<String>,

    /// Rebuild the table when files under `dirs` change.
    pub watch: bool,

    /// Quiet period before a burst of changes triggers a rebuild.
    pub debounce_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dirs: vec![PathBuf::from("mock")],
            prefix: String::new(),
            include: None,
            exclude: None,
            ignore_prefix: None,
            exclude_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
            watch: true,
            debounce_ms: 150,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a filter directive.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
