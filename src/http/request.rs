//! Request identification and conversion.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID when the client sent none
//! - Convert an axum request into a `MockRequest`
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body buffered up to a fixed limit; dispatch needs the whole body

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::dispatch::MockRequest;

/// Header carrying the request ID in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Largest request body the server buffers.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Issues UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Buffer the body and build the dispatcher's view of the request.
pub async fn into_mock_request(request: Request<Body>) -> Result<MockRequest, axum::Error> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, MAX_BODY_BYTES).await?;

    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut mock = MockRequest::new(parts.method, target);
    mock.headers = parts.headers;
    mock.body = body;
    Ok(mock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[tokio::test]
    async fn test_into_mock_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/users/7?expand=true")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"a"}"#))
            .unwrap();

        let mock = into_mock_request(request).await.unwrap();
        assert_eq!(mock.method, Method::POST);
        assert_eq!(mock.path, "/users/7");
        assert_eq!(mock.query.as_deref(), Some("expand=true"));
        assert_eq!(mock.headers.get("content-type").unwrap(), "application/json");
        assert_eq!(&mock.body[..], br#"{"name":"a"}"#);
    }

    #[test]
    fn test_uuid_request_ids_are_unique() {
        let request = Request::new(());
        let mut maker = UuidRequestId;
        let a = maker.make_request_id(&request).unwrap();
        let b = maker.make_request_id(&request).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
