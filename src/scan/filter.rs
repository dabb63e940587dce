//! Include/exclude patterns and ignore-prefix checks.
//!
//! # Design Decisions
//! - Patterns are globs matched against the root-relative path
//!   (forward slashes) and, failing that, the absolute path
//! - Invalid patterns are logged and dropped at compile time

use std::path::{Component, Path};

use glob::Pattern;

/// The ignore prefix applied when neither config nor scan sets one.
pub const DEFAULT_IGNORE_PREFIX: &str = ".";

/// A compiled list of glob patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Compile patterns strictly.
    pub fn new<I, S>(patterns: I) -> Result<Self, glob::PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Compile patterns, dropping invalid ones with a warning.
    pub fn compile_lossy(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(pattern = %p, error = %e, "Ignoring invalid file pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The first pattern matching the file, if any.
    pub fn find_match(&self, relative: &str, absolute: &Path) -> Option<&str> {
        let absolute = absolute.to_string_lossy();
        self.patterns
            .iter()
            .find(|p| p.matches(relative) || p.matches(&absolute))
            .map(Pattern::as_str)
    }
}

/// Root-relative path with `/` separators.
pub fn relative_path(file: &Path, root: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// First `(segment, prefix)` pair where a path segment starts with a prefix.
pub fn ignored_segment<'a>(relative: &'a str, prefixes: &'a [String]) -> Option<(&'a str, &'a str)> {
    relative.split('/').find_map(|segment| {
        prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .find(|p| segment.starts_with(p.as_str()))
            .map(|p| (segment, p.as_str()))
    })
}
