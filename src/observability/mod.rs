//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Scanner, refresh loop, HTTP front end produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields instead of formatted messages
//! - Request ID flows from the request-id layer into request spans
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
