//! Route template tokenizer and specificity scoring.
//!
//! # Grammar
//! ```text
//! /users/me            static segments
//! /users/[id]          single-segment parameter
//! /files/[...path]     catch-all (one or more segments)
//! /docs/[[...path]]    optional catch-all (zero or more segments)
//! ```
//!
//! # Design Decisions
//! - Catch-alls must be the final segment
//! - Parenthesized route groups are rejected, never flattened
//! - Score is a per-segment rank vector compared lexicographically,
//!   lower ranks sort first (static < param < catch-all < optional)

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

/// One parsed segment of a route template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Token {
    Static(String),
    Param(String),
    OptionalCatchall(String),
    Catchall(String),
}

impl Token {
    fn rank(&self) -> u8 {
        match self {
            Token::Static(_) => 0,
            Token::Param(_) => 1,
            Token::Catchall(_) => 2,
            Token::OptionalCatchall(_) => 3,
        }
    }

    fn is_catchall(&self) -> bool {
        matches!(self, Token::Catchall(_) | Token::OptionalCatchall(_))
    }
}

/// Comparable specificity of a template. Opaque outside this module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Score(Vec<u8>);

/// A validated template with its tokens and score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    /// Canonical form: leading `/`, no trailing `/` (except the root).
    pub template: String,
    pub tokens: Vec<Token>,
    pub score: Score,
}

/// Reasons a template cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template must start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("empty segment in template {0}")]
    EmptySegment(String),

    #[error("route group segment '{0}' is not supported")]
    RouteGroup(String),

    #[error("invalid parameter segment '{0}'")]
    InvalidParam(String),

    #[error("duplicate parameter name '{0}'")]
    DuplicateParam(String),

    #[error("catch-all segment '{0}' must be the last segment")]
    CatchallNotLast(String),
}

/// Parse a template string into tokens and a specificity score.
pub fn parse_template(template: &str) -> Result<ParsedTemplate, TemplateError> {
    let Some(rest) = template.strip_prefix('/') else {
        return Err(TemplateError::MissingLeadingSlash(template.to_string()));
    };
    let rest = rest.strip_suffix('/').unwrap_or(rest);

    let mut tokens = Vec::new();
    let mut names = HashSet::new();

    if !rest.is_empty() {
        let segments: Vec<&str> = rest.split('/').collect();
        let last = segments.len() - 1;

        for (i, segment) in segments.iter().enumerate() {
            let token = parse_segment(segment, template)?;

            if token.is_catchall() && i != last {
                return Err(TemplateError::CatchallNotLast(segment.to_string()));
            }
            if let Token::Param(name) | Token::Catchall(name) | Token::OptionalCatchall(name) = &token {
                if !names.insert(name.clone()) {
                    return Err(TemplateError::DuplicateParam(name.clone()));
                }
            }
            tokens.push(token);
        }
    }

    let score = Score(tokens.iter().map(Token::rank).collect());
    Ok(ParsedTemplate {
        template: format!("/{}", rest),
        tokens,
        score,
    })
}

/// Total order over scores; `Less` means `a` is more specific.
pub fn compare_scores(a: &Score, b: &Score) -> Ordering {
    a.cmp(b)
}

fn parse_segment(segment: &str, template: &str) -> Result<Token, TemplateError> {
    if segment.is_empty() {
        return Err(TemplateError::EmptySegment(template.to_string()));
    }
    if segment.starts_with('(') && segment.ends_with(')') {
        return Err(TemplateError::RouteGroup(segment.to_string()));
    }

    if let Some(inner) = segment
        .strip_prefix("[[...")
        .and_then(|s| s.strip_suffix("]]"))
    {
        return param_name(inner, segment).map(Token::OptionalCatchall);
    }
    if let Some(inner) = segment
        .strip_prefix("[...")
        .and_then(|s| s.strip_suffix(']'))
    {
        return param_name(inner, segment).map(Token::Catchall);
    }
    if let Some(inner) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return param_name(inner, segment).map(Token::Param);
    }
    if segment.contains(['[', ']']) {
        return Err(TemplateError::InvalidParam(segment.to_string()));
    }

    Ok(Token::Static(segment.to_string()))
}

fn param_name(name: &str, segment: &str) -> Result<String, TemplateError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(name.to_string())
    } else {
        Err(TemplateError::InvalidParam(segment.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        let parsed = parse_template("/users/[id]/files/[...path]").unwrap();
        assert_eq!(parsed.template, "/users/[id]/files/[...path]");
        assert_eq!(
            parsed.tokens,
            vec![
                Token::Static("users".into()),
                Token::Param("id".into()),
                Token::Static("files".into()),
                Token::Catchall("path".into()),
            ]
        );
    }

    #[test]
    fn test_root_and_trailing_slash() {
        let root = parse_template("/").unwrap();
        assert!(root.tokens.is_empty());
        assert_eq!(root.template, "/");

        let trailing = parse_template("/users/").unwrap();
        assert_eq!(trailing.template, "/users");
    }

    #[test]
    fn test_optional_catchall() {
        let parsed = parse_template("/docs/[[...slug]]").unwrap();
        assert_eq!(parsed.tokens[1], Token::OptionalCatchall("slug".into()));
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            parse_template("users"),
            Err(TemplateError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            parse_template("/(admin)/users"),
            Err(TemplateError::RouteGroup(_))
        ));
        assert!(matches!(
            parse_template("/[...rest]/tail"),
            Err(TemplateError::CatchallNotLast(_))
        ));
        assert!(matches!(
            parse_template("/[id]/[id]"),
            Err(TemplateError::DuplicateParam(_))
        ));
        assert!(matches!(
            parse_template("/a[b"),
            Err(TemplateError::InvalidParam(_))
        ));
        assert!(matches!(
            parse_template("/a//b"),
            Err(TemplateError::EmptySegment(_))
        ));
    }

    #[test]
    fn test_specificity_order() {
        let me = parse_template("/users/me").unwrap().score;
        let id = parse_template("/users/[id]").unwrap().score;
        let slug = parse_template("/users/[...slug]").unwrap().score;
        let opt = parse_template("/users/[[...slug]]").unwrap().score;

        assert_eq!(compare_scores(&me, &id), Ordering::Less);
        assert_eq!(compare_scores(&id, &slug), Ordering::Less);
        assert_eq!(compare_scores(&slug, &opt), Ordering::Less);
    }
}
