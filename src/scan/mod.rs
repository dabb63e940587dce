//! Mock directory scanning subsystem.
//!
//! # Data Flow
//! ```text
//! mock roots
//!     → walker.rs (recursive listing, excluded dirs pruned)
//!     → kind.rs (config / data / module / unsupported)
//!     → directory.rs (root-to-leaf config merge, cached per scan)
//!     → scanner.rs (gates: enabled, ignore-prefix, supported,
//!                   exclude, include, derived)
//!     → loader.rs (rule exports from data files or registered modules)
//!     → RouteTableBuilder
//!
//! Every rejection is reported to a ScanObserver with its decision chain.
//! ```
//!
//! # Design Decisions
//! - Nothing here fails a scan; bad files are logged and skipped
//! - Caches live for one scan only
//! - Module-format files resolve through a `ModuleLoader`

pub mod decision;
pub mod directory;
pub mod exports;
pub mod filter;
pub mod kind;
pub mod loader;
pub mod scanner;
pub mod walker;

pub use decision::{
    ConfigRecord, DecisionChain, DecisionStep, Gate, IgnoreReason, IgnoreRecord,
    ScanObserver, ScanReport, SkipReason, SkipRecord,
};
pub use directory::{ConfigResolver, EffectiveConfig, ResolvedConfig, ScanCache};
pub use exports::{ConfigExport, DirectoryConfig, MockRule, RuleExport};
pub use loader::{LoadError, ModuleLoader, ModuleRegistry};
pub use scanner::{scan, scan_with_report, ScanOptions, Scanner};
