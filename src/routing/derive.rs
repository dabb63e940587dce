//! Route derivation from convention file names.
//!
//! # Data Flow
//! ```text
//! <root>/users/[id].get.ts
//!     → strip root and extension      users/[id].get
//!     → pull method suffix            users/[id]   GET
//!     → fold trailing `index`
//!     → parse_template                /users/[id]  tokens + score
//! ```

use std::path::{Component, Path};

use thiserror::Error;

use crate::routing::method::HttpMethod;
use crate::routing::template::{parse_template, ParsedTemplate, Score, TemplateError, Token};
use crate::scan::kind::{self, DATA_EXTENSIONS};

/// Method and template derived from a file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedRoute {
    pub template: String,
    pub method: HttpMethod,
    pub tokens: Vec<Token>,
    pub score: Score,
}

/// Why a file name does not map to a route.
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("file is not under its root directory")]
    OutsideRoot,

    #[error("path is not valid UTF-8")]
    NonUtf8,

    #[error("file has no extension")]
    MissingExtension,

    #[error("no HTTP method suffix in '{0}'")]
    MissingMethod(String),

    #[error("empty route segment in '{0}'")]
    EmptySegment(String),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Derive `{template, method, tokens, score}` for a file under `root`.
pub fn derive_route(file: &Path, root: &Path) -> Result<DerivedRoute, DeriveError> {
    let relative = file.strip_prefix(root).map_err(|_| DeriveError::OutsideRoot)?;

    let mut segments = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_str().map(str::to_string)),
            _ => None,
        })
        .collect::<Option<Vec<String>>>()
        .ok_or(DeriveError::NonUtf8)?;

    let file_name = segments.pop().ok_or(DeriveError::OutsideRoot)?;
    let ext = kind::extension(&file_name).ok_or(DeriveError::MissingExtension)?;
    let stem = &file_name[..file_name.len() - ext.len() - 1];

    // 1. Method suffix, with a GET default for data files
    let suffix = stem
        .rsplit_once('.')
        .and_then(|(name, suffix)| HttpMethod::parse(suffix).map(|m| (name, m)));
    let (name, method) = match suffix {
        Some(found) => found,
        None if DATA_EXTENSIONS.contains(&ext.as_str()) => (stem, HttpMethod::Get),
        None => return Err(DeriveError::MissingMethod(file_name.clone())),
    };
    if name.is_empty() {
        return Err(DeriveError::EmptySegment(file_name.clone()));
    }

    // 2. `index` folds into its parent path
    if name != "index" {
        segments.push(name.to_string());
    }

    let ParsedTemplate {
        template,
        tokens,
        score,
    } = parse_template(&format!("/{}", segments.join("/")))?;

    Ok(DerivedRoute {
        template,
        method,
        tokens,
        score,
    })
}

/// Normalize a URL prefix to `/seg/seg` form; `""` means no prefix.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Apply a URL prefix to a derived template. No-op when the template already
/// starts with the prefix at a segment boundary.
pub fn apply_prefix(prefix: &str, template: &str) -> String {
    let prefix = normalize_prefix(prefix);
    if prefix.is_empty() {
        return template.to_string();
    }
    if template == prefix || template.starts_with(&format!("{}/", prefix)) {
        return template.to_string();
    }
    if template == "/" {
        return prefix;
    }
    format!("{}{}", prefix, template)
}
