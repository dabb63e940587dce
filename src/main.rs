//! Mock API server.
//!
//! Serves every route found under the configured mock directories and
//! rebuilds the table when files change.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use mock_router::config::{load_config, validation::validate_config, ConfigError, MockWatcher, ServerConfig};
use mock_router::http::HttpServer;
use mock_router::lifecycle::{signals, RouteStore, Shutdown};
use mock_router::observability::{logging, metrics};
use mock_router::scan::ModuleRegistry;

#[derive(Parser, Debug)]
#[command(name = "mock-router")]
#[command(about = "Serve mock API routes from a directory of files", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mock directory (repeatable); replaces `mock.dirs`.
    #[arg(short, long = "dir")]
    dirs: Vec<PathBuf>,

    /// URL prefix for every route.
    #[arg(short, long)]
    prefix: Option<String>,

    /// Bind address, e.g. 127.0.0.1:8080.
    #[arg(short, long)]
    bind: Option<String>,

    /// Do not rebuild routes on file changes.
    #[arg(long)]
    no_watch: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };

        if !self.dirs.is_empty() {
            config.mock.dirs = self.dirs.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.mock.prefix = prefix.clone();
        }
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if self.no_watch {
            config.mock.watch = false;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    logging::init(Some(&config.observability.log_level));
    tracing::info!("mock-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        dirs = ?config.mock.dirs,
        prefix = %config.mock.prefix,
        watch = config.mock.watch,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // 1. First table before accepting traffic
    let store = Arc::new(RouteStore::new(config.scan_options(), ModuleRegistry::new().into_shared()));
    store.refresh().await?;

    // 2. Shutdown wiring
    let shutdown = Shutdown::new();
    tokio::spawn(signals::trigger_on_signal(shutdown.clone()));

    // 3. Watcher, kept alive for the server's lifetime
    let _watcher = if config.mock.watch {
        let watcher = MockWatcher::new(
            config.mock.dirs.clone(),
            Duration::from_millis(config.mock.debounce_ms),
        );
        match watcher.spawn(store.clone(), &shutdown) {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::error!(error = %e, "Failed to start mock watcher, hot reload disabled");
                None
            }
        }
    } else {
        None
    };

    // 4. Serve
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(config, store).run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
