//! Route matching and per-request execution.
//!
//! # Responsibilities
//! - Compile each route's tokens into a `PathPattern`
//! - Find the first route, in table order, matching method and path
//! - Run the finalize wrapper around the positioned middleware chain
//! - Turn handler failures and panics into a 500
//!
//! # Design Decisions
//! - Immutable after construction; shared via `Arc` across requests
//! - First match wins, no fallthrough to later matches
//! - Route status applies only when within 200..=599

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use futures_util::FutureExt;

use crate::dispatch::context::{MockContext, MockRequest, MockResponse};
use crate::dispatch::middleware::{Middleware, MiddlewarePosition, Next};
use crate::dispatch::DispatchError;
use crate::routing::matcher::PathPattern;
use crate::routing::table::{ResolvedRoute, RouteTable};

/// Result of dispatching a request.
#[derive(Debug)]
pub enum Dispatch {
    Handled(MockResponse),
    /// No route matched; the caller decides what a miss looks like.
    NoMatch,
}

impl Dispatch {
    pub fn into_response(self) -> Option<MockResponse> {
        match self {
            Dispatch::Handled(response) => Some(response),
            Dispatch::NoMatch => None,
        }
    }
}

struct CompiledRoute {
    pattern: PathPattern,
    /// pre, then normal, then post.
    chain: Vec<Arc<dyn Middleware>>,
}

impl CompiledRoute {
    fn compile(route: &ResolvedRoute) -> Self {
        let chain = [
            MiddlewarePosition::Pre,
            MiddlewarePosition::Normal,
            MiddlewarePosition::Post,
        ]
        .into_iter()
        .flat_map(|position| {
            route
                .middlewares
                .iter()
                .filter(move |m| m.position == position)
                .map(|m| m.handle.clone())
        })
        .collect();

        Self {
            pattern: PathPattern::compile(&route.tokens),
            chain,
        }
    }
}

/// Matches requests against a route table and serves them.
pub struct Dispatcher {
    table: RouteTable,
    compiled: Vec<CompiledRoute>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.table.len())
            .finish()
    }
}

impl Dispatcher {
    /// Compile a route table. Table order is match priority.
    pub fn new(table: RouteTable) -> Self {
        let compiled = table.routes().iter().map(CompiledRoute::compile).collect();
        Self { table, compiled }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The highest-priority route matching `method` and `path`, with its params.
    pub fn find(&self, method: &Method, path: &str) -> Option<(&ResolvedRoute, BTreeMap<String, String>)> {
        self.lookup(method, path)
            .map(|(index, params)| (&self.table.routes()[index], params))
    }

    /// Serve a request.
    pub async fn dispatch(&self, request: MockRequest) -> Dispatch {
        let Some((index, params)) = self.lookup(&request.method, &request.path) else {
            return Dispatch::NoMatch;
        };
        let route = &self.table.routes()[index];
        let compiled = &self.compiled[index];

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            route = %route.template,
            file = %route.file.display(),
            "Dispatching mock route"
        );

        let mut ctx = MockContext::new(request, route.template.clone(), params);
        let outcome = AssertUnwindSafe(finalize(route, compiled, &mut ctx))
            .catch_unwind()
            .await;

        let error = match outcome {
            Ok(Ok(())) => return Dispatch::Handled(ctx.response),
            Ok(Err(e)) => e,
            Err(panic) => DispatchError::Panic(panic_message(panic)),
        };

        tracing::error!(
            route = %route.key(),
            file = %route.file.display(),
            error = %error,
            "Mock handler failed"
        );
        Dispatch::Handled(MockResponse::text(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
        ))
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(usize, BTreeMap<String, String>)> {
        self.table
            .routes()
            .iter()
            .zip(&self.compiled)
            .enumerate()
            .filter(|(_, (route, _))| route.method.matches(method))
            .find_map(|(index, (_, compiled))| compiled.pattern.matches(path).map(|params| (index, params)))
    }
}

/// Outermost wrapper: chain, then delay, then status/header overrides.
async fn finalize(
    route: &ResolvedRoute,
    compiled: &CompiledRoute,
    ctx: &mut MockContext,
) -> Result<(), DispatchError> {
    Next::new(&compiled.chain, &route.handler).run(ctx).await?;

    if let Some(delay) = route.delay.filter(|d| *d > 0) {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    for (name, value) in &route.headers {
        ctx.response.set_header(name, value);
    }

    let explicit = route
        .status
        .filter(|s| (200..=599).contains(s))
        .and_then(|s| StatusCode::from_u16(s).ok());
    if let Some(status) = explicit {
        ctx.response.status = status;
    }

    Ok(())
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler::{Handler, HandlerOutput};
    use crate::dispatch::middleware::{Flow, MiddlewareFuture, ResolvedMiddleware};
    use crate::routing::method::HttpMethod;
    use crate::routing::template::parse_template;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn route(method: HttpMethod, template: &str, handler: Handler) -> ResolvedRoute {
        let parsed = parse_template(template).unwrap();
        ResolvedRoute {
            file: PathBuf::from(format!("/mock{}.ts", template)),
            template: parsed.template,
            method,
            tokens: parsed.tokens,
            score: parsed.score,
            handler,
            middlewares: Vec::new(),
            status: None,
            headers: BTreeMap::new(),
            delay: None,
            rule_index: 0,
            config_chain: Vec::new(),
        }
    }

    fn dispatcher(routes: Vec<ResolvedRoute>) -> Dispatcher {
        Dispatcher::new(RouteTable::from_routes(routes))
    }

    struct Tag {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for Tag {
        fn handle<'a>(&'a self, ctx: &'a mut MockContext, next: Next<'a>) -> MiddlewareFuture<'a> {
            Box::pin(async move {
                self.log.lock().unwrap().push(self.label);
                next.run(ctx).await?;
                Ok(Flow::Continue)
            })
        }
    }

    fn tagged(label: &'static str, position: MiddlewarePosition, log: &Arc<Mutex<Vec<&'static str>>>) -> ResolvedMiddleware {
        ResolvedMiddleware {
            handle: Arc::new(Tag { label, log: log.clone() }),
            source: PathBuf::from("/mock/index.config.ts"),
            index: 0,
            position,
        }
    }

    #[tokio::test]
    async fn test_no_match_sentinel() {
        let d = dispatcher(vec![route(HttpMethod::Get, "/a", Handler::from_value(json!(1)))]);
        assert!(matches!(d.dispatch(MockRequest::new(Method::GET, "/b")).await, Dispatch::NoMatch));
        assert!(matches!(d.dispatch(MockRequest::new(Method::POST, "/a")).await, Dispatch::NoMatch));
    }

    #[tokio::test]
    async fn test_most_specific_route_wins() {
        let d = dispatcher(vec![
            route(HttpMethod::Get, "/users/[id]", Handler::from_value(json!("param"))),
            route(HttpMethod::Get, "/users/me", Handler::from_value(json!("static"))),
        ]);
        let res = d.dispatch(MockRequest::new(Method::GET, "/users/me")).await.into_response().unwrap();
        assert_eq!(res.body_text(), "static");
        let res = d.dispatch(MockRequest::new(Method::GET, "/users/7")).await.into_response().unwrap();
        assert_eq!(res.body_text(), "param");

        let (found, params) = d.find(&Method::GET, "/users/7").unwrap();
        assert_eq!(found.template, "/users/[id]");
        assert_eq!(params.get("id").map(String::as_str), Some("7"));
        assert!(d.find(&Method::DELETE, "/users/7").is_none());
    }

    #[tokio::test]
    async fn test_positions_run_pre_normal_post() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut r = route(HttpMethod::Get, "/a", Handler::from_value(json!({})));
        r.middlewares = vec![
            tagged("post", MiddlewarePosition::Post, &log),
            tagged("normal", MiddlewarePosition::Normal, &log),
            tagged("pre", MiddlewarePosition::Pre, &log),
        ];
        let d = dispatcher(vec![r]);
        d.dispatch(MockRequest::new(Method::GET, "/a")).await;
        assert_eq!(*log.lock().unwrap(), vec!["pre", "normal", "post"]);
    }

    #[tokio::test]
    async fn test_overrides_applied_after_chain() {
        let mut r = route(
            HttpMethod::Get,
            "/a",
            Handler::from_fn(|ctx| {
                ctx.response.set_header("x-shared", "handler");
                ctx.response.set_header("x-handler", "1");
                Ok(HandlerOutput::Json(json!({"ok": true})))
            }),
        );
        r.status = Some(201);
        r.headers.insert("x-shared".into(), "route".into());
        let d = dispatcher(vec![r]);

        let res = d.dispatch(MockRequest::new(Method::GET, "/a")).await.into_response().unwrap();
        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(res.header("x-shared"), Some("route"));
        assert_eq!(res.header("x-handler"), Some("1"));
    }

    #[tokio::test]
    async fn test_out_of_range_status_ignored() {
        let mut r = route(HttpMethod::Get, "/a", Handler::from_fn(|ctx| {
            ctx.response.status = StatusCode::ACCEPTED;
            Ok(HandlerOutput::Text("x".into()))
        }));
        r.status = Some(150);
        let d = dispatcher(vec![r]);
        let res = d.dispatch(MockRequest::new(Method::GET, "/a")).await.into_response().unwrap();
        assert_eq!(res.status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_undefined_with_explicit_status() {
        let mut r = route(HttpMethod::Post, "/a", Handler::Static(HandlerOutput::Undefined));
        let d = dispatcher(vec![r.clone()]);
        let res = d.dispatch(MockRequest::new(Method::POST, "/a")).await.into_response().unwrap();
        assert_eq!(res.status, StatusCode::NO_CONTENT);

        r.status = Some(202);
        let d = dispatcher(vec![r]);
        let res = d.dispatch(MockRequest::new(Method::POST, "/a")).await.into_response().unwrap();
        assert_eq!(res.status, StatusCode::ACCEPTED);
        assert!(res.body.is_empty());
    }

    #[tokio::test]
    async fn test_handler_error_and_panic_become_500() {
        let d = dispatcher(vec![
            route(HttpMethod::Get, "/err", Handler::from_fn(|_| Err(DispatchError::Handler("boom".into())))),
            route(HttpMethod::Get, "/panic", Handler::from_fn(|_| panic!("kaboom"))),
        ]);
        for path in ["/err", "/panic"] {
            let res = d.dispatch(MockRequest::new(Method::GET, path)).await.into_response().unwrap();
            assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_applied() {
        let mut r = route(HttpMethod::Get, "/slow", Handler::from_value(json!({})));
        r.delay = Some(500);
        let d = dispatcher(vec![r]);

        let start = tokio::time::Instant::now();
        d.dispatch(MockRequest::new(Method::GET, "/slow")).await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_duplicate_routes_first_wins() {
        let mut first = route(HttpMethod::Get, "/users", Handler::from_value(json!("first")));
        first.file = PathBuf::from("/mock/a/users.get.ts");
        let mut second = route(HttpMethod::Get, "/users", Handler::from_value(json!("second")));
        second.file = PathBuf::from("/mock/b/users.get.ts");

        let d = dispatcher(vec![first, second]);
        assert_eq!(d.table().len(), 2);
        let res = d.dispatch(MockRequest::new(Method::GET, "/users")).await.into_response().unwrap();
        assert_eq!(res.body_text(), "first");
    }
}
