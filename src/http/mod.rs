//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID, buffer body, build MockRequest)
//!     → RouteStore::current() → Dispatcher::dispatch
//!     → MockResponse → HTTP response (404 on no match)
//! ```

pub mod request;
pub mod server;

pub use request::{UuidRequestId, MAX_BODY_BYTES, X_REQUEST_ID};
pub use server::{build_router, HttpServer};
