//! File scanning and the per-file decision engine.
//!
//! # Data Flow
//! ```text
//! Walker → CandidateFile
//!     → directory config?          → ConfigRecord, next file
//!     → ConfigResolver (once per file)
//!     → config.enabled             → skip  disabled-dir
//!     → ignore-prefix              → skip  ignore-prefix
//!     → file.supported             → ignore unsupported
//!     → filter.exclude / include   → skip  exclude / include
//!     → route.derived              → ignore invalid-route
//!     → load rules, per rule:
//!         rule.enabled             → skip  disabled
//!         handler / field checks   → dropped with a warning
//!     → RouteTableBuilder
//! ```
//!
//! # Design Decisions
//! - Each gate appends a `DecisionStep` and short-circuits on failure
//! - Directory include/exclude replace scan-level patterns wholesale
//! - Caches are created per `scan` call and dropped with it

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::routing::derive::{derive_route, DerivedRoute};
use crate::routing::table::{AcceptedRule, RouteTable, RouteTableBuilder};
use crate::scan::decision::{
    ConfigRecord, DecisionChain, Gate, IgnoreReason, IgnoreRecord, ScanObserver, ScanReport,
    SkipReason, SkipRecord,
};
use crate::scan::directory::{ConfigField, ConfigResolver, ResolvedConfig, ScanCache};
use crate::scan::filter::{ignored_segment, relative_path, PatternSet, DEFAULT_IGNORE_PREFIX};
use crate::scan::kind::{classify, FileKind};
use crate::scan::loader::{load_rule_file, ModuleLoader};
use crate::scan::walker::{CandidateFile, Walker, DEFAULT_EXCLUDED_DIRS};

/// Inputs of a scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub roots: Vec<PathBuf>,
    /// URL prefix applied to every derived template.
    pub prefix: String,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub ignore_prefix: Option<Vec<String>>,
    /// Directory names the walker prunes.
    pub excluded_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            prefix: String::new(),
            include: None,
            exclude: None,
            ignore_prefix: None,
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl ScanOptions {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// Scan roots and build a route table, reporting to `observer`.
pub fn scan(options: &ScanOptions, modules: &dyn ModuleLoader, observer: &mut dyn ScanObserver) -> RouteTable {
    Scanner::new(options, modules).run(observer)
}

/// Scan roots and collect the full audit trail.
pub fn scan_with_report(options: &ScanOptions, modules: &dyn ModuleLoader) -> (RouteTable, ScanReport) {
    let mut report = ScanReport::default();
    let table = scan(options, modules, &mut report);
    (table, report)
}

/// One scan cycle.
pub struct Scanner<'a> {
    options: &'a ScanOptions,
    modules: &'a dyn ModuleLoader,
    include: PatternSet,
    exclude: PatternSet,
}

/// Per-file state shared by the gates.
struct FileScan<'f> {
    file: &'f Path,
    resolved: Arc<ResolvedConfig>,
    derived: Option<DerivedRoute>,
    chain: DecisionChain,
}

impl<'a> Scanner<'a> {
    pub fn new(options: &'a ScanOptions, modules: &'a dyn ModuleLoader) -> Self {
        let compile = |patterns: &Option<Vec<String>>| {
            patterns
                .as_deref()
                .map(PatternSet::compile_lossy)
                .unwrap_or_default()
        };
        Self {
            options,
            modules,
            include: compile(&options.include),
            exclude: compile(&options.exclude),
        }
    }

    /// Walk, gate and build.
    pub fn run(&self, observer: &mut dyn ScanObserver) -> RouteTable {
        let mut cache = ScanCache::new();
        let mut resolver = ConfigResolver::new(self.modules, &mut cache);
        let mut builder = RouteTableBuilder::new(self.options.prefix.clone());

        let files = Walker::new(self.options.excluded_dirs.iter().cloned()).walk(&self.options.roots);
        let file_count = files.len();

        for candidate in &files {
            self.scan_file(candidate, &mut resolver, &mut builder, observer);
        }

        let table = builder.finish();
        tracing::info!(
            roots = self.options.roots.len(),
            files = file_count,
            routes = table.len(),
            duplicates = table.duplicates().len(),
            "Mock scan complete"
        );
        table
    }

    fn scan_file(
        &self,
        candidate: &CandidateFile,
        resolver: &mut ConfigResolver<'_>,
        builder: &mut RouteTableBuilder,
        observer: &mut dyn ScanObserver,
    ) {
        let CandidateFile { path: file, root } = candidate;
        let kind = classify(file);

        // 1. Directory configs are never routes
        if kind == FileKind::DirectoryConfig {
            let resolved = resolver.resolve(file, root);
            observer.on_config(ConfigRecord {
                file: file.clone(),
                enabled: resolved.effective.enabled != Some(false),
                config_chain: resolved.chain,
                effective_config: resolved.effective,
            });
            return;
        }

        let derivation = derive_route(file, root);
        let mut scan = FileScan {
            file,
            resolved: Arc::new(resolver.resolve(file, root)),
            derived: derivation.as_ref().ok().cloned(),
            chain: DecisionChain::new(),
        };
        let effective = scan.resolved.effective.clone();
        let relative = relative_path(file, root);

        // 2. config.enabled
        let source = effective.source(ConfigField::Enabled);
        if effective.enabled == Some(false) {
            scan.chain.fail(Gate::ConfigEnabled, "directory config sets enabled = false", source);
            return self.skip(observer, builder, scan, SkipReason::DisabledDir);
        }
        scan.chain.pass(Gate::ConfigEnabled, "enabled", source);

        // 3. ignore-prefix
        let prefixes = effective
            .ignore_prefix
            .clone()
            .or_else(|| self.options.ignore_prefix.clone())
            .unwrap_or_else(|| vec![DEFAULT_IGNORE_PREFIX.to_string()]);
        let source = effective.source(ConfigField::IgnorePrefix);
        if let Some((segment, prefix)) = ignored_segment(&relative, &prefixes) {
            let detail = format!("segment '{}' starts with '{}'", segment, prefix);
            scan.chain.fail(Gate::IgnorePrefix, detail, source);
            return self.skip(observer, builder, scan, SkipReason::IgnorePrefix);
        }
        scan.chain.pass(Gate::IgnorePrefix, "no ignored segment", source);

        // 4. file.supported
        if !kind.is_route_source() {
            scan.chain.fail(Gate::FileSupported, "unsupported file type", None);
            return self.ignore(observer, builder, scan, IgnoreReason::Unsupported);
        }
        scan.chain.pass(Gate::FileSupported, "supported file type", None);

        // 5. filter.exclude / filter.include
        let local_exclude;
        let (exclude, source) = match &effective.exclude {
            Some(patterns) => {
                local_exclude = PatternSet::compile_lossy(patterns);
                (&local_exclude, effective.source(ConfigField::Exclude))
            }
            None => (&self.exclude, None),
        };
        if let Some(pattern) = exclude.find_match(&relative, file) {
            let detail = format!("matches exclude pattern '{}'", pattern);
            scan.chain.fail(Gate::FilterExclude, detail, source);
            return self.skip(observer, builder, scan, SkipReason::Exclude);
        }
        scan.chain.pass(Gate::FilterExclude, "no exclude pattern matched", source);

        let local_include;
        let (include, source) = match &effective.include {
            Some(patterns) => {
                local_include = PatternSet::compile_lossy(patterns);
                (&local_include, effective.source(ConfigField::Include))
            }
            None => (&self.include, None),
        };
        if !include.is_empty() {
            match include.find_match(&relative, file) {
                Some(pattern) => {
                    let detail = format!("matches include pattern '{}'", pattern);
                    scan.chain.pass(Gate::FilterInclude, detail, source);
                }
                None => {
                    scan.chain.fail(Gate::FilterInclude, "no include pattern matched", source);
                    return self.skip(observer, builder, scan, SkipReason::Include);
                }
            }
        } else {
            scan.chain.pass(Gate::FilterInclude, "no include filter", source);
        }

        // 6. route.derived
        let derived = match derivation {
            Ok(derived) => derived,
            Err(e) => {
                scan.chain.fail(Gate::RouteDerived, e.to_string(), None);
                return self.ignore(observer, builder, scan, IgnoreReason::InvalidRoute);
            }
        };
        let detail = format!("{} {}", derived.method, builder.url_for(&derived.template));
        scan.chain.pass(Gate::RouteDerived, detail, None);

        let rules = match load_rule_file(file, self.modules) {
            Ok(rules) => rules,
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "Failed to load mock file, skipping");
                return;
            }
        };

        // 7. rule.enabled, per rule
        for (rule_index, rule) in rules.into_iter().enumerate() {
            if rule.enabled == Some(false) {
                let chain = scan
                    .chain
                    .extended(Gate::RuleEnabled, false, format!("rule {} sets enabled = false", rule_index));
                self.observe_skip(observer, builder, &scan, chain, SkipReason::Disabled);
                continue;
            }

            let Some(handler) = rule.handler.clone() else {
                tracing::warn!(file = %file.display(), rule = rule_index, "Mock rule has no handler, dropping");
                continue;
            };
            if let Some(field) = rule.disallowed_field() {
                tracing::warn!(
                    file = %file.display(),
                    rule = rule_index,
                    field = field,
                    "Mock rule sets a field derived from its file name, dropping"
                );
                continue;
            }

            let accepted = AcceptedRule {
                file: file.clone(),
                rule_index,
                rule,
                handler,
                derived: derived.clone(),
                config: scan.resolved.clone(),
            };
            if let Err(e) = builder.push(accepted) {
                let chain = scan.chain.extended(Gate::RouteDerived, false, e.to_string());
                self.observe_ignore(observer, builder, &scan, chain, IgnoreReason::InvalidRoute);
            }
        }
    }

    fn skip(
        &self,
        observer: &mut dyn ScanObserver,
        builder: &RouteTableBuilder,
        scan: FileScan<'_>,
        reason: SkipReason,
    ) {
        let chain = scan.chain.clone();
        self.observe_skip(observer, builder, &scan, chain, reason);
    }

    fn ignore(
        &self,
        observer: &mut dyn ScanObserver,
        builder: &RouteTableBuilder,
        scan: FileScan<'_>,
        reason: IgnoreReason,
    ) {
        let chain = scan.chain.clone();
        self.observe_ignore(observer, builder, &scan, chain, reason);
    }

    fn observe_skip(
        &self,
        observer: &mut dyn ScanObserver,
        builder: &RouteTableBuilder,
        scan: &FileScan<'_>,
        decision_chain: DecisionChain,
        reason: SkipReason,
    ) {
        tracing::debug!(file = %scan.file.display(), reason = ?reason, "Mock file skipped");
        observer.on_skip(SkipRecord {
            file: scan.file.to_path_buf(),
            reason,
            method: scan.derived.as_ref().map(|d| d.method),
            url: scan.derived.as_ref().map(|d| builder.url_for(&d.template)),
            config_chain: scan.resolved.chain.clone(),
            decision_chain,
            effective_config: scan.resolved.effective.clone(),
        });
    }

    fn observe_ignore(
        &self,
        observer: &mut dyn ScanObserver,
        builder: &RouteTableBuilder,
        scan: &FileScan<'_>,
        decision_chain: DecisionChain,
        reason: IgnoreReason,
    ) {
        tracing::debug!(file = %scan.file.display(), reason = ?reason, "Mock file ignored");
        observer.on_ignore(IgnoreRecord {
            file: scan.file.to_path_buf(),
            reason,
            method: scan.derived.as_ref().map(|d| d.method),
            url: scan.derived.as_ref().map(|d| builder.url_for(&d.template)),
            config_chain: scan.resolved.chain.clone(),
            decision_chain,
            effective_config: scan.resolved.effective.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::loader::ModuleRegistry;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_gate_order_for_accepted_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "users.get.json", "[]");
        write(dir.path(), "ghost.get.ts", "");

        let options = ScanOptions::new([dir.path()]);
        let (table, report) = scan_with_report(&options, &ModuleRegistry::new());

        assert_eq!(table.len(), 1);
        assert_eq!(table.routes()[0].template, "/users");
        // Unregistered modules contribute nothing and leave no record.
        assert!(report.skips.is_empty());
        assert!(report.ignores.is_empty());
    }

    #[test]
    fn test_disabled_dir_wins_over_filters() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "off/index.config.json", r#"{"enabled": false, "exclude": "**/*"}"#);
        write(dir.path(), "off/users.get.json", "{}");

        let options = ScanOptions::new([dir.path()]);
        let (table, report) = scan_with_report(&options, &ModuleRegistry::new());

        assert!(table.is_empty());
        assert_eq!(report.skips.len(), 1);
        let skip = &report.skips[0];
        assert_eq!(skip.reason, SkipReason::DisabledDir);
        assert_eq!(skip.decision_chain.failed_gate(), Some(Gate::ConfigEnabled));
        assert_eq!(skip.decision_chain.steps().len(), 1);
        assert_eq!(
            skip.decision_chain.steps()[0].source.as_deref(),
            Some(dir.path().join("off/index.config.json").as_path())
        );
        assert_eq!(report.configs.len(), 1);
        assert!(!report.configs[0].enabled);
    }

    #[test]
    fn test_unsupported_and_invalid_route_are_ignored() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes.md", "");
        write(dir.path(), "types.d.ts", "");
        write(dir.path(), "(group)/a.get.json", "{}");

        let options = ScanOptions::new([dir.path()]);
        let (table, report) = scan_with_report(&options, &ModuleRegistry::new());

        assert!(table.is_empty());
        let mut reasons: Vec<_> = report.ignores.iter().map(|i| i.reason).collect();
        reasons.sort_by_key(|r| format!("{:?}", r));
        assert_eq!(
            reasons,
            vec![IgnoreReason::InvalidRoute, IgnoreReason::Unsupported, IgnoreReason::Unsupported]
        );
    }

    #[test]
    fn test_default_ignore_prefix_and_override() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".draft/a.get.json", "{}");
        write(dir.path(), "_wip/b.get.json", "{}");

        let options = ScanOptions::new([dir.path()]);
        let (table, report) = scan_with_report(&options, &ModuleRegistry::new());
        assert_eq!(table.len(), 1);
        assert_eq!(report.skips[0].reason, SkipReason::IgnorePrefix);

        let mut options = ScanOptions::new([dir.path()]);
        options.ignore_prefix = Some(vec!["_".into()]);
        let (table, _) = scan_with_report(&options, &ModuleRegistry::new());
        assert_eq!(table.len(), 1);
        assert_eq!(table.routes()[0].template, "/.draft/a");
    }

    #[test]
    fn test_directory_filters_replace_scan_filters() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.get.json", "{}");
        write(dir.path(), "b.get.json", "{}");
        write(dir.path(), "sub/index.config.json", r#"{"include": "**/keep.*"}"#);
        write(dir.path(), "sub/keep.get.json", "{}");
        write(dir.path(), "sub/drop.get.json", "{}");

        let mut options = ScanOptions::new([dir.path()]);
        options.exclude = Some(vec!["b.*".into()]);
        options.include = Some(vec!["*.json".into()]);
        let (table, report) = scan_with_report(&options, &ModuleRegistry::new());

        let templates: Vec<_> = table.routes().iter().map(|r| r.template.as_str()).collect();
        assert_eq!(templates, vec!["/a", "/sub/keep"]);

        let reasons: Vec<_> = report.skips.iter().map(|s| s.reason).collect();
        assert!(reasons.contains(&SkipReason::Exclude));
        assert!(reasons.contains(&SkipReason::Include));
    }
}
