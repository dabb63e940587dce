//! Shapes exported by route files and directory-config files.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::dispatch::handler::Handler;
use crate::dispatch::middleware::{Middleware, MiddlewarePosition};

/// A single value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

/// Middleware registrations of one directory config, by position.
#[derive(Clone, Default)]
pub struct MiddlewareSet {
    pub pre: Vec<Arc<dyn Middleware>>,
    pub normal: Vec<Arc<dyn Middleware>>,
    pub post: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareSet {
    pub fn bucket(&self, position: MiddlewarePosition) -> &[Arc<dyn Middleware>] {
        match position {
            MiddlewarePosition::Pre => &self.pre,
            MiddlewarePosition::Normal => &self.normal,
            MiddlewarePosition::Post => &self.post,
        }
    }
}

impl fmt::Debug for MiddlewareSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareSet")
            .field("pre", &self.pre.len())
            .field("normal", &self.normal.len())
            .field("post", &self.post.len())
            .finish()
    }
}

/// Per-directory configuration. Every field is optional.
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DirectoryConfig {
    pub headers: Option<BTreeMap<String, String>>,
    pub status: Option<u16>,
    /// Artificial response delay in milliseconds.
    pub delay: Option<u64>,
    pub enabled: Option<bool>,
    #[serde(alias = "ignore_prefix")]
    pub ignore_prefix: Option<OneOrMany<String>>,
    pub include: Option<OneOrMany<String>>,
    pub exclude: Option<OneOrMany<String>>,

    #[serde(skip)]
    pub middleware: MiddlewareSet,

    /// Single legacy middleware, runs after `middleware.normal`.
    #[serde(skip)]
    pub legacy_middleware: Option<Arc<dyn Middleware>>,
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("headers", &self.headers)
            .field("status", &self.status)
            .field("delay", &self.delay)
            .field("enabled", &self.enabled)
            .field("ignore_prefix", &self.ignore_prefix)
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("middleware", &self.middleware)
            .field("legacy_middleware", &self.legacy_middleware.is_some())
            .finish()
    }
}

impl DirectoryConfig {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Some(delay_ms);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_middleware(mut self, position: MiddlewarePosition, mw: Arc<dyn Middleware>) -> Self {
        match position {
            MiddlewarePosition::Pre => self.middleware.pre.push(mw),
            MiddlewarePosition::Normal => self.middleware.normal.push(mw),
            MiddlewarePosition::Post => self.middleware.post.push(mw),
        }
        self
    }
}

/// What a directory-config module exports.
#[derive(Clone)]
pub enum ConfigExport {
    Object(DirectoryConfig),
    Factory(Arc<dyn Fn() -> DirectoryConfig + Send + Sync>),
    /// An untyped value; must deserialize into an object.
    Value(Value),
}

impl From<DirectoryConfig> for ConfigExport {
    fn from(config: DirectoryConfig) -> Self {
        ConfigExport::Object(config)
    }
}

/// One mock rule exported by a route file.
#[derive(Debug, Clone, Default)]
pub struct MockRule {
    pub handler: Option<Handler>,
    pub enabled: Option<bool>,
    pub status: Option<u16>,
    pub headers: Option<BTreeMap<String, String>>,
    pub delay: Option<u64>,

    // Legacy shapes carried these; a rule setting any of them is dropped.
    pub url: Option<String>,
    pub method: Option<String>,
    pub response: Option<Value>,
}

impl MockRule {
    pub fn new(handler: Handler) -> Self {
        Self {
            handler: Some(handler),
            ..Self::default()
        }
    }

    /// A rule whose handler is a static data value.
    pub fn from_value(value: Value) -> Self {
        Self::new(Handler::from_value(value))
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Some(delay_ms);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Name of the first disallowed field present, if any.
    pub fn disallowed_field(&self) -> Option<&'static str> {
        if self.response.is_some() {
            Some("response")
        } else if self.url.is_some() {
            Some("url")
        } else if self.method.is_some() {
            Some("method")
        } else {
            None
        }
    }
}

/// What a route file exports.
#[derive(Debug, Clone)]
pub enum RuleExport {
    Rule(MockRule),
    Rules(Vec<MockRule>),
    Handler(Handler),
    /// A data value used as one static rule.
    Value(Value),
}

impl RuleExport {
    pub fn into_rules(self) -> Vec<MockRule> {
        match self {
            RuleExport::Rule(rule) => vec![rule],
            RuleExport::Rules(rules) => rules,
            RuleExport::Handler(handler) => vec![MockRule::new(handler)],
            RuleExport::Value(value) => vec![MockRule::from_value(value)],
        }
    }
}

impl From<MockRule> for RuleExport {
    fn from(rule: MockRule) -> Self {
        RuleExport::Rule(rule)
    }
}

impl From<Vec<MockRule>> for RuleExport {
    fn from(rules: Vec<MockRule>) -> Self {
        RuleExport::Rules(rules)
    }
}

impl From<Handler> for RuleExport {
    fn from(handler: Handler) -> Self {
        RuleExport::Handler(handler)
    }
}
