//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + CLI overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → ScanOptions for the route store
//!
//! While running:
//!     watcher.rs detects mock file changes
//!     → debounced RouteStore refresh
//! ```
//!
//! # Design Decisions
//! - Server config is read once; only mock files hot-reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, MockConfig, ObservabilityConfig, ServerConfig, TimeoutConfig};
pub use validation::ValidationError;
pub use watcher::MockWatcher;
