//! Positioned middleware and the chain continuation.
//!
//! # Responsibilities
//! - Define the `Middleware` contract (mutate-or-replace via `Flow`)
//! - Carry the origin of each middleware (`ResolvedMiddleware`)
//! - Drive the remaining chain through `Next`
//!
//! # Design Decisions
//! - `Flow::Continue` keeps whatever the middleware left in `ctx.response`
//! - `Flow::Replace` swaps in an explicit response
//! - A middleware that never calls `next.run` short-circuits the chain

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::dispatch::context::{MockContext, MockResponse};
use crate::dispatch::handler::Handler;
use crate::dispatch::DispatchError;

/// Where in the per-route chain a middleware runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiddlewarePosition {
    Pre,
    Normal,
    Post,
}

impl MiddlewarePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            MiddlewarePosition::Pre => "pre",
            MiddlewarePosition::Normal => "normal",
            MiddlewarePosition::Post => "post",
        }
    }
}

/// Outcome of a middleware step.
#[derive(Debug)]
pub enum Flow {
    /// Use the (possibly mutated) in-flight response.
    Continue,
    /// Use this response instead.
    Replace(MockResponse),
}

pub type MiddlewareFuture<'a> = BoxFuture<'a, Result<Flow, DispatchError>>;

/// A per-route middleware.
pub trait Middleware: Send + Sync {
    fn handle<'a>(&'a self, ctx: &'a mut MockContext, next: Next<'a>) -> MiddlewareFuture<'a>;
}

struct FnMiddleware<F>(F);

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut MockContext, Next<'a>) -> MiddlewareFuture<'a> + Send + Sync,
{
    fn handle<'a>(&'a self, ctx: &'a mut MockContext, next: Next<'a>) -> MiddlewareFuture<'a> {
        (self.0)(ctx, next)
    }
}

/// Wrap a closure as a middleware.
pub fn middleware_fn<F>(f: F) -> Arc<dyn Middleware>
where
    F: for<'a> Fn(&'a mut MockContext, Next<'a>) -> MiddlewareFuture<'a> + Send + Sync + 'static,
{
    Arc::new(FnMiddleware(f))
}

/// A middleware tagged with its origin and position.
#[derive(Clone)]
pub struct ResolvedMiddleware {
    pub handle: Arc<dyn Middleware>,
    /// Directory config file that registered it.
    pub source: PathBuf,
    /// Index within its source and position bucket.
    pub index: usize,
    pub position: MiddlewarePosition,
}

impl fmt::Debug for ResolvedMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedMiddleware")
            .field("source", &self.source)
            .field("index", &self.index)
            .field("position", &self.position)
            .finish()
    }
}

impl Serialize for ResolvedMiddleware {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResolvedMiddleware", 3)?;
        state.serialize_field("source", &self.source)?;
        state.serialize_field("index", &self.index)?;
        state.serialize_field("position", &self.position)?;
        state.end()
    }
}

/// The remainder of a route's chain.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    handler: &'a Handler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Middleware>], handler: &'a Handler) -> Self {
        Self { chain, handler }
    }

    /// Run the rest of the chain, leaving its result in `ctx.response`.
    pub fn run<'b>(self, ctx: &'b mut MockContext) -> BoxFuture<'b, Result<(), DispatchError>>
    where
        'a: 'b,
    {
        Box::pin(async move {
            match self.chain.split_first() {
                Some((head, rest)) => {
                    let next = Next::new(rest, self.handler);
                    match head.handle(ctx, next).await? {
                        Flow::Continue => {}
                        Flow::Replace(response) => ctx.response = response,
                    }
                    Ok(())
                }
                None => self.handler.respond(ctx).await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::context::MockRequest;
    use crate::dispatch::handler::HandlerOutput;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Mutex;

    struct Record {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Record {
        fn handle<'a>(&'a self, ctx: &'a mut MockContext, next: Next<'a>) -> MiddlewareFuture<'a> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{}:before", self.name));
                next.run(ctx).await?;
                self.log.lock().unwrap().push(format!("{}:after", self.name));
                Ok(Flow::Continue)
            })
        }
    }

    struct Stamp;

    impl Middleware for Stamp {
        fn handle<'a>(&'a self, ctx: &'a mut MockContext, next: Next<'a>) -> MiddlewareFuture<'a> {
            Box::pin(async move {
                next.run(ctx).await?;
                ctx.response.set_header("x-stamp", "1");
                Ok(Flow::Continue)
            })
        }
    }

    struct Gate;

    impl Middleware for Gate {
        fn handle<'a>(&'a self, _ctx: &'a mut MockContext, _next: Next<'a>) -> MiddlewareFuture<'a> {
            Box::pin(async move {
                Ok(Flow::Replace(MockResponse::text(StatusCode::UNAUTHORIZED, "denied")))
            })
        }
    }

    fn ctx() -> MockContext {
        MockContext::new(MockRequest::new(Method::GET, "/"), "/", Default::default())
    }

    #[tokio::test]
    async fn test_chain_nests_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Record { name: "a", log: log.clone() }),
            Arc::new(Record { name: "b", log: log.clone() }),
        ];
        let handler = Handler::from_value(json!({"ok": true}));
        let mut ctx = ctx();

        Next::new(&chain, &handler).run(&mut ctx).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:before", "b:before", "b:after", "a:after"]
        );
        assert_eq!(ctx.response.body_text(), r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_continue_keeps_mutation() {
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(Stamp)];
        let handler = Handler::Static(HandlerOutput::Text("hi".into()));
        let mut ctx = ctx();

        Next::new(&chain, &handler).run(&mut ctx).await.unwrap();

        assert_eq!(ctx.response.header("x-stamp"), Some("1"));
        assert_eq!(ctx.response.body_text(), "hi");
    }

    #[tokio::test]
    async fn test_replace_short_circuits() {
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(Gate), Arc::new(Stamp)];
        let handler = Handler::from_fn(|_| panic!("handler must not run"));
        let mut ctx = ctx();

        Next::new(&chain, &handler).run(&mut ctx).await.unwrap();

        assert_eq!(ctx.response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(ctx.response.header("x-stamp"), None);
    }

    #[tokio::test]
    async fn test_middleware_fn_closure() {
        let chain = vec![middleware_fn(|ctx, next| {
            Box::pin(async move {
                ctx.response.set_header("x-before", "yes");
                next.run(ctx).await?;
                Ok(Flow::Continue)
            })
        })];
        let handler = Handler::Static(HandlerOutput::Undefined);
        let mut ctx = ctx();

        Next::new(&chain, &handler).run(&mut ctx).await.unwrap();

        assert_eq!(ctx.response.header("x-before"), Some("yes"));
        assert_eq!(ctx.response.status, StatusCode::NO_CONTENT);
    }
}
