//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Refresh (refresh.rs):
//!     startup / watcher event → scan → build → publish (generation-guarded)
//!
//! Shutdown (shutdown.rs):
//!     Signal received → server stops accepting → watcher loop exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - First table is built before the listener binds
//! - Requests in flight keep the table they started with

pub mod refresh;
pub mod shutdown;
pub mod signals;

pub use refresh::{Refresh, RefreshError, RouteStore};
pub use shutdown::Shutdown;
