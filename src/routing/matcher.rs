//! Compiled route patterns.
//!
//! # Responsibilities
//! - Turn template tokens into a segment pattern
//! - Match request paths and capture parameters
//!
//! # Design Decisions
//! - Segment walk, no regex in the hot path
//! - Static segments are case-sensitive
//! - Each segment is percent-decoded once, before literals and captures see it
//! - Catch-alls are joined with `/`
//! - A trailing slash on the request path is ignored

use std::collections::BTreeMap;

use crate::routing::template::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
    /// Multi-segment capture; `optional` permits zero segments.
    Rest { name: String, optional: bool },
}

/// A matchable path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile parsed template tokens.
    pub fn compile(tokens: &[Token]) -> Self {
        let segments = tokens
            .iter()
            .map(|token| match token {
                Token::Static(s) => Segment::Literal(s.clone()),
                Token::Param(name) => Segment::Capture(name.clone()),
                Token::Catchall(name) => Segment::Rest {
                    name: name.clone(),
                    optional: false,
                },
                Token::OptionalCatchall(name) => Segment::Rest {
                    name: name.clone(),
                    optional: true,
                },
            })
            .collect();
        Self { segments }
    }

    /// Match a request path, returning captured parameters.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let trimmed = path.trim_matches('/');
        let parts: Vec<String> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').map(decode).collect()
        };

        let mut params = BTreeMap::new();
        let mut index = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(expected) => {
                    if parts.get(index).map(String::as_str) != Some(expected.as_str()) {
                        return None;
                    }
                    index += 1;
                }
                Segment::Capture(name) => {
                    let part = parts.get(index).filter(|p| !p.is_empty())?;
                    params.insert(name.clone(), part.clone());
                    index += 1;
                }
                Segment::Rest { name, optional } => {
                    let rest = &parts[index.min(parts.len())..];
                    if rest.is_empty() && !optional {
                        return None;
                    }
                    if !rest.is_empty() {
                        let joined = rest.join("/");
                        params.insert(name.clone(), joined);
                    }
                    index = parts.len();
                }
            }
        }

        (index == parts.len()).then_some(params)
    }
}

fn decode(part: &str) -> String {
    urlencoding::decode(part)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| part.to_string())
}
