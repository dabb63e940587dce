//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single fallback handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Dispatch requests against the live route table
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::dispatch::{Dispatch, MockResponse};
use crate::http::request::{into_mock_request, request_id, UuidRequestId, MAX_BODY_BYTES};
use crate::lifecycle::{RouteStore, Shutdown};
use crate::observability::metrics;

/// HTTP server for the mock router.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(config: ServerConfig, store: Arc<RouteStore>) -> Self {
        let router = build_router(&config, store);
        Self { router, config }
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers, outermost first.
#[allow(deprecated)]
pub fn build_router(config: &ServerConfig, store: Arc<RouteStore>) -> Router {
    Router::new()
        .fallback(mock_handler)
        .with_state(store)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                // Innermost, so the timed-out response body is axum's own `Body`
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
}

/// Serves every request from the current route table.
async fn mock_handler(State(store): State<Arc<RouteStore>>, request: Request) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request).to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    // 1. Buffer the request
    let mock_request = match into_mock_request(request).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Failed to read request body");
            metrics::record_request(&method, 413, start_time);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    // 2. Dispatch against the table live at arrival
    let dispatcher = store.current();
    let response = match dispatcher.dispatch(mock_request).await {
        Dispatch::Handled(response) => response,
        Dispatch::NoMatch => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, "No mock route matched");
            MockResponse::text(StatusCode::NOT_FOUND, "Not Found")
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status.as_u16(),
        "Mock response"
    );
    metrics::record_request(&method, response.status.as_u16(), start_time);

    into_http_response(response)
}

fn into_http_response(response: MockResponse) -> Response {
    let mut http = Response::new(Body::from(response.body));
    *http.status_mut() = response.status;
    *http.headers_mut() = response.headers;
    http
}
