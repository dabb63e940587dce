//! Route table construction.
//!
//! # Responsibilities
//! - Expand accepted rules into fully resolved routes
//! - Apply the URL prefix and re-validate the final template
//! - Layer rule overrides over directory config
//! - Detect duplicate `METHOD template` keys and order the table
//!
//! # Design Decisions
//! - Duplicates are logged and both kept; dispatch takes the first in
//!   table order, which for equal keys is discovery order
//! - Ordering: method, then specificity score, then template; stable

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::dispatch::handler::Handler;
use crate::dispatch::middleware::ResolvedMiddleware;
use crate::routing::derive::{apply_prefix, DerivedRoute};
use crate::routing::method::HttpMethod;
use crate::routing::template::{compare_scores, parse_template, Score, TemplateError, Token};
use crate::scan::directory::ResolvedConfig;
use crate::scan::exports::MockRule;

/// A route ready for dispatch.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub file: PathBuf,
    /// Always starts with `/`.
    pub template: String,
    pub method: HttpMethod,
    pub tokens: Vec<Token>,
    pub score: Score,
    pub handler: Handler,
    pub middlewares: Vec<ResolvedMiddleware>,
    pub status: Option<u16>,
    pub headers: BTreeMap<String, String>,
    pub delay: Option<u64>,
    /// Position within the originating file's rule list.
    pub rule_index: usize,
    pub config_chain: Vec<PathBuf>,
}

impl ResolvedRoute {
    /// `METHOD template`.
    pub fn key(&self) -> String {
        route_key(self.method, &self.template)
    }
}

fn route_key(method: HttpMethod, template: &str) -> String {
    format!("{} {}", method, template)
}

/// A rule that passed every gate.
#[derive(Debug, Clone)]
pub struct AcceptedRule {
    pub file: PathBuf,
    pub rule_index: usize,
    pub rule: MockRule,
    pub handler: Handler,
    pub derived: DerivedRoute,
    /// Shared by every rule of the same file.
    pub config: Arc<ResolvedConfig>,
}

/// Ordered, immutable route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<ResolvedRoute>,
    duplicates: Vec<String>,
}

impl RouteTable {
    /// Build a table directly from resolved routes, sorting them.
    pub fn from_routes(mut routes: Vec<ResolvedRoute>) -> Self {
        sort_routes(&mut routes);
        let mut seen = HashSet::new();
        let duplicates = routes
            .iter()
            .map(ResolvedRoute::key)
            .filter(|key| !seen.insert(key.clone()))
            .collect();
        Self { routes, duplicates }
    }

    pub fn routes(&self) -> &[ResolvedRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Keys that were registered more than once.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn find(&self, method: HttpMethod, template: &str) -> Option<&ResolvedRoute> {
        self.routes
            .iter()
            .find(|r| r.method == method && r.template == template)
    }
}

/// Accumulates routes for one build.
#[derive(Debug)]
pub struct RouteTableBuilder {
    prefix: String,
    routes: Vec<ResolvedRoute>,
    seen: HashMap<String, PathBuf>,
    duplicates: Vec<String>,
}

impl RouteTableBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            routes: Vec::new(),
            seen: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// The final URL for a derived template.
    pub fn url_for(&self, template: &str) -> String {
        apply_prefix(&self.prefix, template)
    }

    /// Resolve and append one accepted rule.
    pub fn push(&mut self, accepted: AcceptedRule) -> Result<(), TemplateError> {
        let AcceptedRule {
            file,
            rule_index,
            rule,
            handler,
            derived,
            config,
        } = accepted;

        // 1. Prefix, then re-validate the final template
        let parsed = parse_template(&self.url_for(&derived.template))?;

        // 2. Rule overrides on top of directory config
        let effective = &config.effective;
        let mut headers = effective.headers.clone();
        if let Some(rule_headers) = rule.headers {
            headers.extend(rule_headers);
        }

        let route = ResolvedRoute {
            file,
            template: parsed.template,
            method: derived.method,
            tokens: parsed.tokens,
            score: parsed.score,
            handler,
            middlewares: effective.middlewares.clone(),
            status: rule.status.or(effective.status),
            headers,
            delay: rule.delay.or(effective.delay),
            rule_index,
            config_chain: config.chain.clone(),
        };

        // 3. Duplicate detection; both entries are kept
        let key = route.key();
        if let Some(first) = self.seen.get(&key) {
            tracing::warn!(
                route = %key,
                first = %first.display(),
                duplicate = %route.file.display(),
                "Duplicate mock route, first match wins"
            );
            self.duplicates.push(key);
        } else {
            self.seen.insert(key, route.file.clone());
        }

        self.routes.push(route);
        Ok(())
    }

    /// Sort and freeze the table.
    pub fn finish(mut self) -> RouteTable {
        sort_routes(&mut self.routes);
        RouteTable {
            routes: self.routes,
            duplicates: self.duplicates,
        }
    }
}

/// Stable sort by method, specificity, then template.
pub fn sort_routes(routes: &mut [ResolvedRoute]) {
    routes.sort_by(|a, b| {
        a.method
            .as_str()
            .cmp(b.method.as_str())
            .then_with(|| compare_scores(&a.score, &b.score))
            .then_with(|| a.template.cmp(&b.template))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::derive::derive_route;
    use crate::scan::directory::EffectiveConfig;
    use serde_json::json;
    use std::path::Path;

    fn accepted(rel: &str, rule: MockRule, config: Arc<ResolvedConfig>) -> AcceptedRule {
        let root = Path::new("/srv/mock");
        let file = root.join(rel);
        AcceptedRule {
            derived: derive_route(&file, root).unwrap(),
            handler: rule.handler.clone().unwrap(),
            file,
            rule_index: 0,
            rule,
            config,
        }
    }

    fn rule() -> MockRule {
        MockRule::from_value(json!({"ok": true}))
    }

    #[test]
    fn test_specificity_ordering() {
        let config = Arc::new(ResolvedConfig::default());
        let mut builder = RouteTableBuilder::new("");
        builder.push(accepted("users/[...slug].get.ts", rule(), config.clone())).unwrap();
        builder.push(accepted("users/[id].get.ts", rule(), config.clone())).unwrap();
        builder.push(accepted("users/me.get.ts", rule(), config)).unwrap();

        let table = builder.finish();
        let templates: Vec<_> = table.routes().iter().map(|r| r.template.as_str()).collect();
        assert_eq!(templates, vec!["/users/me", "/users/[id]", "/users/[...slug]"]);
    }

    #[test]
    fn test_method_then_template_ordering() {
        let config = Arc::new(ResolvedConfig::default());
        let mut builder = RouteTableBuilder::new("/api");
        builder.push(accepted("b.post.ts", rule(), config.clone())).unwrap();
        builder.push(accepted("b.get.ts", rule(), config.clone())).unwrap();
        builder.push(accepted("a.get.ts", rule(), config)).unwrap();

        let keys: Vec<_> = builder.finish().routes().iter().map(ResolvedRoute::key).collect();
        assert_eq!(keys, vec!["GET /api/a", "GET /api/b", "POST /api/b"]);
    }

    #[test]
    fn test_rule_overrides_directory_config() {
        let mut effective = EffectiveConfig::default();
        effective.headers.insert("x-dir".into(), "dir".into());
        effective.headers.insert("x-both".into(), "dir".into());
        effective.status = Some(201);
        effective.delay = Some(50);
        let config = Arc::new(ResolvedConfig {
            effective,
            chain: vec![PathBuf::from("/srv/mock/index.config.json")],
        });

        let rule = rule().with_header("x-both", "rule").with_status(202);
        let mut builder = RouteTableBuilder::new("");
        builder.push(accepted("a.get.ts", rule, config)).unwrap();
        let table = builder.finish();
        let route = &table.routes()[0];

        assert_eq!(route.status, Some(202));
        assert_eq!(route.delay, Some(50));
        assert_eq!(route.headers.get("x-dir").map(String::as_str), Some("dir"));
        assert_eq!(route.headers.get("x-both").map(String::as_str), Some("rule"));
        assert_eq!(route.config_chain.len(), 1);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let config = Arc::new(ResolvedConfig::default());
        let mut builder = RouteTableBuilder::new("/api");
        builder.push(accepted("users.get.json", rule(), config.clone())).unwrap();
        builder.push(accepted("api/users.get.json", rule(), config)).unwrap();

        let table = builder.finish();
        assert_eq!(table.len(), 2);
        assert_eq!(table.duplicates(), &["GET /api/users".to_string()]);
        assert!(table.routes()[0].file.ends_with("users.get.json"));
        assert!(!table.routes()[0].file.starts_with("/srv/mock/api"));
    }
}
