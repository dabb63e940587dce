//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mock_router::dispatch::Dispatcher;
use mock_router::routing::RouteTable;
use mock_router::scan::{scan_with_report, ModuleRegistry, ScanOptions, ScanReport};
use tempfile::TempDir;

/// A throwaway mock directory plus the module registry backing its module files.
pub struct MockDir {
    dir: TempDir,
    pub modules: ModuleRegistry,
}

impl MockDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            modules: ModuleRegistry::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file, creating parent directories.
    pub fn file(&mut self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Create an empty module file on disk; its export is registered separately.
    pub fn module(&mut self, rel: &str) -> PathBuf {
        self.file(rel, "")
    }

    pub fn options(&self) -> ScanOptions {
        ScanOptions::new([self.root()])
    }

    pub fn scan(&self, options: &ScanOptions) -> (RouteTable, ScanReport) {
        scan_with_report(options, &self.modules)
    }

    pub fn dispatcher(&self, options: &ScanOptions) -> Arc<Dispatcher> {
        let (table, _) = self.scan(options);
        Arc::new(Dispatcher::new(table))
    }
}
