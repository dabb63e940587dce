//! File-convention mock API router.
//!
//! Files under one or more mock directories become HTTP routes: the path
//! gives the URL template, a `.get`/`.post`/... suffix gives the method, and
//! `index.config.*` files configure every route beneath them.
//!
//! ```text
//! mock dirs ──▶ scan ──▶ RouteTable ──▶ Dispatcher ──▶ RouteStore (ArcSwap)
//!                 ▲                                          │
//!                 └──── watcher (debounced refresh) ◀────────┤
//!                                                            ▼
//!                                  HTTP request ──▶ http::server ──▶ response
//! ```

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod scan;

pub use config::ServerConfig;
pub use dispatch::{Dispatch, Dispatcher, MockRequest, MockResponse};
pub use http::HttpServer;
pub use lifecycle::{RouteStore, Shutdown};
pub use scan::{ModuleRegistry, ScanOptions};
