//! Rule handlers and result normalization.
//!
//! # Normalization
//! - `Undefined` → empty body, 204 unless a non-200 status is already set
//! - `Text` → text body
//! - `Binary` → octet-stream body (content type defaulted only if unset)
//! - `Response` → passed through untouched
//! - `Json` → serialized JSON body

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::dispatch::context::{MockContext, MockResponse};
use crate::dispatch::DispatchError;

/// What a handler produced.
#[derive(Debug, Clone)]
pub enum HandlerOutput {
    Undefined,
    Text(String),
    Binary(Bytes),
    Json(Value),
    Response(MockResponse),
}

impl From<Value> for HandlerOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => HandlerOutput::Text(text),
            other => HandlerOutput::Json(other),
        }
    }
}

impl From<MockResponse> for HandlerOutput {
    fn from(response: MockResponse) -> Self {
        HandlerOutput::Response(response)
    }
}

pub type HandlerFuture<'a> = BoxFuture<'a, Result<HandlerOutput, DispatchError>>;

/// A callable handler.
pub trait HandlerFn: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut MockContext) -> HandlerFuture<'a>;
}

struct SyncFn<F>(F);

impl<F> HandlerFn for SyncFn<F>
where
    F: Fn(&mut MockContext) -> Result<HandlerOutput, DispatchError> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut MockContext) -> HandlerFuture<'a> {
        let result = (self.0)(ctx);
        Box::pin(async move { result })
    }
}

struct AsyncFn<F>(F);

impl<F> HandlerFn for AsyncFn<F>
where
    F: for<'a> Fn(&'a mut MockContext) -> HandlerFuture<'a> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut MockContext) -> HandlerFuture<'a> {
        (self.0)(ctx)
    }
}

/// A rule's handler: a static value or a callable.
#[derive(Clone)]
pub enum Handler {
    Static(HandlerOutput),
    Dynamic(Arc<dyn HandlerFn>),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Static(output) => f.debug_tuple("Static").field(output).finish(),
            Handler::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl Handler {
    /// Static handler from a data value.
    pub fn from_value(value: Value) -> Self {
        Handler::Static(value.into())
    }

    /// Synchronous callable handler.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut MockContext) -> Result<HandlerOutput, DispatchError> + Send + Sync + 'static,
    {
        Handler::Dynamic(Arc::new(SyncFn(f)))
    }

    /// Asynchronous callable handler.
    pub fn from_async<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut MockContext) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        Handler::Dynamic(Arc::new(AsyncFn(f)))
    }

    /// Invoke the handler and write the normalized result into `ctx.response`.
    pub(crate) async fn respond(&self, ctx: &mut MockContext) -> Result<(), DispatchError> {
        let output = match self {
            Handler::Static(output) => output.clone(),
            Handler::Dynamic(f) => f.call(ctx).await?,
        };
        normalize(output, &mut ctx.response)
    }
}

fn normalize(output: HandlerOutput, response: &mut MockResponse) -> Result<(), DispatchError> {
    match output {
        HandlerOutput::Undefined => {
            response.body = Bytes::new();
            if response.status == StatusCode::OK {
                response.status = StatusCode::NO_CONTENT;
            }
        }
        HandlerOutput::Text(text) => {
            response.body = Bytes::from(text);
            response.set_default_content_type("text/plain; charset=utf-8");
        }
        HandlerOutput::Binary(bytes) => {
            response.body = bytes;
            response.set_default_content_type("application/octet-stream");
        }
        HandlerOutput::Response(replacement) => *response = replacement,
        HandlerOutput::Json(value) => {
            response.body = Bytes::from(serde_json::to_vec(&value)?);
            response.set_default_content_type("application/json");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::context::MockRequest;
    use axum::http::Method;
    use serde_json::json;

    fn ctx() -> MockContext {
        MockContext::new(MockRequest::new(Method::GET, "/"), "/", Default::default())
    }

    #[tokio::test]
    async fn test_undefined_becomes_no_content() {
        let mut ctx = ctx();
        Handler::Static(HandlerOutput::Undefined).respond(&mut ctx).await.unwrap();
        assert_eq!(ctx.response.status, StatusCode::NO_CONTENT);
        assert!(ctx.response.body.is_empty());
    }

    #[tokio::test]
    async fn test_undefined_keeps_explicit_status() {
        let handler = Handler::from_fn(|ctx| {
            ctx.response.status = StatusCode::ACCEPTED;
            Ok(HandlerOutput::Undefined)
        });
        let mut ctx = ctx();
        handler.respond(&mut ctx).await.unwrap();
        assert_eq!(ctx.response.status, StatusCode::ACCEPTED);
        assert!(ctx.response.body.is_empty());
    }

    #[tokio::test]
    async fn test_json_and_text() {
        let mut ctx1 = ctx();
        Handler::from_value(json!({"ok": true})).respond(&mut ctx1).await.unwrap();
        assert_eq!(ctx1.response.header("content-type"), Some("application/json"));
        assert_eq!(ctx1.response.body_text(), r#"{"ok":true}"#);

        let mut ctx2 = ctx();
        Handler::from_value(json!("hello")).respond(&mut ctx2).await.unwrap();
        assert_eq!(ctx2.response.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(ctx2.response.body_text(), "hello");
    }

    #[tokio::test]
    async fn test_binary_respects_existing_content_type() {
        let handler = Handler::from_fn(|ctx| {
            ctx.response.set_header("content-type", "image/png");
            Ok(HandlerOutput::Binary(Bytes::from_static(&[1, 2, 3])))
        });
        let mut ctx = ctx();
        handler.respond(&mut ctx).await.unwrap();
        assert_eq!(ctx.response.header("content-type"), Some("image/png"));
        assert_eq!(ctx.response.body.as_ref(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_response_passes_through() {
        let handler = Handler::from_fn(|_| {
            Ok(MockResponse::text(StatusCode::IM_A_TEAPOT, "short and stout").into())
        });
        let mut ctx = ctx();
        handler.respond(&mut ctx).await.unwrap();
        assert_eq!(ctx.response.status, StatusCode::IM_A_TEAPOT);
        assert_eq!(ctx.response.body_text(), "short and stout");
    }

    #[tokio::test]
    async fn test_async_handler_reads_params() {
        let handler = Handler::from_async(|ctx| {
            Box::pin(async move {
                let id = ctx.param("id").unwrap_or("none").to_string();
                Ok(HandlerOutput::Json(json!({ "id": id })))
            })
        });
        let mut params = std::collections::BTreeMap::new();
        params.insert("id".to_string(), "42".to_string());
        let mut ctx = MockContext::new(MockRequest::new(Method::GET, "/users/42"), "/users/[id]", params);
        handler.respond(&mut ctx).await.unwrap();
        assert_eq!(ctx.response.body_text(), r#"{"id":"42"}"#);
    }
}
