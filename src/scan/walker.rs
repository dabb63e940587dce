//! Recursive file listing under root directories.
//!
//! # Responsibilities
//! - List every regular file under each root, in a stable order
//! - Prune directories whose name is in the exclusion set
//!
//! # Design Decisions
//! - No gitignore/hidden-file filtering here; hidden files are a
//!   decision for the scanner's ignore-prefix gate
//! - A missing root yields zero files, not an error

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

/// Directory names pruned by default.
pub const DEFAULT_EXCLUDED_DIRS: [&str; 2] = ["node_modules", ".git"];

/// A file discovered under a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub root: PathBuf,
}

/// Lists files under roots, skipping excluded directory names.
#[derive(Debug, Clone)]
pub struct Walker {
    excluded_dirs: HashSet<String>,
}

impl Default for Walker {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_DIRS)
    }
}

impl Walker {
    pub fn new<I, S>(excluded_dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_dirs: excluded_dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Walk all roots in order.
    pub fn walk(&self, roots: &[PathBuf]) -> Vec<CandidateFile> {
        roots
            .iter()
            .flat_map(|root| {
                self.list(root).into_iter().map(move |path| CandidateFile {
                    path,
                    root: root.clone(),
                })
            })
            .collect()
    }

    /// List files under a single root.
    pub fn list(&self, root: &Path) -> Vec<PathBuf> {
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "Mock root missing, no files listed");
            return Vec::new();
        }

        let excluded = self.excluded_dirs.clone();
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                !(is_dir
                    && entry.depth() > 0
                    && excluded.contains(&*entry.file_name().to_string_lossy()))
            })
            .build();

        let mut files = Vec::new();
        for result in walker {
            match result {
                Ok(entry) => {
                    if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => tracing::warn!(root = %root.display(), error = %e, "Walk error"),
            }
        }
        files
    }
}
