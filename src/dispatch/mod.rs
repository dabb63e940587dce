//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! MockRequest (method, path, headers, body)
//!     → dispatcher.rs (first matching compiled route, table order)
//!     → finalize wrapper
//!         → pre middlewares → normal middlewares → post middlewares
//!         → handler.rs (invoke + normalize result)
//!       ← delay, then status/header overrides
//!     → Dispatch::Handled(MockResponse) or Dispatch::NoMatch
//! ```
//!
//! # Design Decisions
//! - Middlewares return an explicit `Flow` (continue with the mutated
//!   response, or replace it)
//! - Handler and middleware failures, panics included, surface as a 500
//! - No fabricated 404: a miss is `Dispatch::NoMatch`

pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod middleware;

use thiserror::Error;

pub use context::{MockContext, MockRequest, MockResponse};
pub use dispatcher::{Dispatch, Dispatcher};
pub use handler::{Handler, HandlerOutput};
pub use middleware::{middleware_fn, Flow, Middleware, MiddlewarePosition, Next, ResolvedMiddleware};

/// Failures raised while serving a matched route.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("handler failed: {0}")]
    Handler(String),

    #[error("middleware failed: {0}")]
    Middleware(String),

    #[error("response serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("panic during dispatch: {0}")]
    Panic(String),
}
