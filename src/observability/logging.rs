//! Structured logging.
//!
//! # Responsibilities
//! - Install the global tracing subscriber
//! - Resolve the log filter from environment or config
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Installing twice is not an error (tests may race to init)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "mock_router=info,tower_http=info";

/// Build the filter for a configured level such as `debug` or a full directive.
pub fn filter_for(level: Option<&str>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    match level {
        Some(level) if !level.contains('=') => {
            EnvFilter::new(format!("mock_router={level},tower_http={level}"))
        }
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::new(DEFAULT_FILTER),
    }
}

/// Initialize the global subscriber.
pub fn init(level: Option<&str>) {
    let result = tracing_subscriber::registry()
        .with(filter_for(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
