//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (per scan):
//!     accepted file path
//!     → derive.rs (method suffix, index folding, template)
//!     → template.rs (tokens + specificity score)
//!     → table.rs (prefix, overrides, duplicate detection, sort)
//!
//! Request Matching:
//!     method + path
//!     → matcher.rs (compiled token pattern, param capture)
//! ```
//!
//! # Design Decisions
//! - Tables are rebuilt whole, immutable once built
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same files always produce the same order
//! - First match wins (ordered by method, then specificity)

pub mod derive;
pub mod matcher;
pub mod method;
pub mod table;
pub mod template;

pub use derive::{derive_route, DeriveError, DerivedRoute};
pub use matcher::PathPattern;
pub use method::HttpMethod;
pub use table::{ResolvedRoute, RouteTable, RouteTableBuilder};
pub use template::{parse_template, ParsedTemplate, TemplateError, Token};
