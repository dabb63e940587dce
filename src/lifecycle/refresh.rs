//! Published route table and its refresh cycle.
//!
//! # Data Flow
//! ```text
//! refresh()
//!     → take generation N
//!     → spawn_blocking: walk → scan → build (fresh caches)
//!     → publish if no generation > N was published
//!     → ArcSwap::store(Arc<Dispatcher>)
//! ```
//!
//! # Design Decisions
//! - Readers never block: `current()` is a lock-free load
//! - A slow refresh never overwrites a newer table
//! - Skips and ignores feed metrics only; the table is the product

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use thiserror::Error;

use crate::dispatch::Dispatcher;
use crate::observability::metrics;
use crate::routing::table::RouteTable;
use crate::scan::decision::{IgnoreRecord, ScanObserver, SkipRecord};
use crate::scan::loader::ModuleLoader;
use crate::scan::scanner::{scan, ScanOptions};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("scan task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// What a refresh did with its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Published { generation: u64, routes: usize },
    /// A newer generation was already live; this table was dropped.
    Superseded { generation: u64 },
}

/// Holds the live dispatcher and rebuilds it on demand.
pub struct RouteStore {
    current: ArcSwap<Dispatcher>,
    options: ScanOptions,
    modules: Arc<dyn ModuleLoader>,
    next_generation: AtomicU64,
    published: Mutex<u64>,
}

impl std::fmt::Debug for RouteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteStore")
            .field("options", &self.options)
            .field("routes", &self.current.load().table().len())
            .finish()
    }
}

impl RouteStore {
    /// An empty store; nothing is served until the first refresh.
    pub fn new(options: ScanOptions, modules: Arc<dyn ModuleLoader>) -> Self {
        Self {
            current: ArcSwap::from_pointee(Dispatcher::new(RouteTable::default())),
            options,
            modules,
            next_generation: AtomicU64::new(0),
            published: Mutex::new(0),
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// The dispatcher serving requests right now.
    pub fn current(&self) -> Arc<Dispatcher> {
        self.current.load_full()
    }

    /// Rebuild synchronously on the calling thread.
    pub fn refresh_blocking(&self) -> Refresh {
        let generation = self.next_generation();
        let table = build_table(&self.options, self.modules.as_ref());
        self.publish(generation, table)
    }

    /// Rebuild on the blocking pool.
    pub async fn refresh(self: &Arc<Self>) -> Result<Refresh, RefreshError> {
        let generation = self.next_generation();
        let store = Arc::clone(self);
        let table =
            tokio::task::spawn_blocking(move || build_table(&store.options, store.modules.as_ref())).await?;
        Ok(self.publish(generation, table))
    }

    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish(&self, generation: u64, table: RouteTable) -> Refresh {
        let mut published = match self.published.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if generation < *published {
            tracing::debug!(
                generation,
                published = *published,
                "Discarding stale route table"
            );
            return Refresh::Superseded { generation };
        }

        let routes = table.len();
        self.current.store(Arc::new(Dispatcher::new(table)));
        *published = generation;
        metrics::record_scan(routes);

        tracing::info!(generation, routes, "Route table published");
        Refresh::Published { generation, routes }
    }
}

/// Feeds skip and ignore counts into metrics.
struct MetricsObserver;

impl ScanObserver for MetricsObserver {
    fn on_skip(&mut self, record: SkipRecord) {
        metrics::record_skip(record.reason.as_str());
    }

    fn on_ignore(&mut self, record: IgnoreRecord) {
        metrics::record_ignore(record.reason.as_str());
    }
}

fn build_table(options: &ScanOptions, modules: &dyn ModuleLoader) -> RouteTable {
    scan(options, modules, &mut MetricsObserver)
}
