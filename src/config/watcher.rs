//! Mock directory watcher for hot reload.
//!
//! # Data Flow
//! ```text
//! notify event (any file under a mock dir)
//!     → unbounded channel
//!     → debounce loop (quiet period)
//!     → RouteStore::refresh
//! ```
//!
//! # Design Decisions
//! - Watches recursively; the scanner decides what matters
//! - Access-only events are dropped before they reach the loop
//! - A missing root is skipped with a warning, not an error

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::lifecycle::{RouteStore, Shutdown};

/// Watches mock directories and rebuilds the route table on change.
pub struct MockWatcher {
    roots: Vec<PathBuf>,
    debounce: Duration,
}

impl MockWatcher {
    pub fn new(roots: Vec<PathBuf>, debounce: Duration) -> Self {
        Self { roots, debounce }
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn spawn(
        self,
        store: Arc<RouteStore>,
        shutdown: &Shutdown,
    ) -> Result<RecommendedWatcher, notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !event.kind.is_access() {
                        let _ = tx.send(event.paths);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default(),
        )?;

        for root in &self.roots {
            if root.is_dir() {
                watcher.watch(root, RecursiveMode::Recursive)?;
                tracing::info!(path = %root.display(), "Watching mock directory");
            } else {
                tracing::warn!(path = %root.display(), "Mock directory missing, not watched");
            }
        }

        tokio::spawn(refresh_loop(rx, store, self.debounce, shutdown.subscribe()));
        Ok(watcher)
    }
}

/// Coalesce change bursts into single refreshes until shutdown.
pub(crate) async fn refresh_loop(
    mut rx: mpsc::UnboundedReceiver<Vec<PathBuf>>,
    store: Arc<RouteStore>,
    debounce: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    loop {
        // 1. Wait for the first change of a burst
        let first = tokio::select! {
            _ = shutdown.recv() => break,
            paths = rx.recv() => match paths {
                Some(paths) => paths,
                None => break,
            },
        };

        // 2. Drain until quiet
        let mut changed = first.len();
        loop {
            match tokio::time::timeout(debounce, rx.recv()).await {
                Ok(Some(paths)) => changed += paths.len(),
                Ok(None) | Err(_) => break,
            }
        }

        tracing::debug!(changed, "Mock files changed, rebuilding routes");

        // 3. Rebuild
        if let Err(e) = store.refresh().await {
            tracing::error!(error = %e, "Route refresh failed, keeping current table");
        }
    }

    tracing::debug!("Mock watcher stopped");
}
