//! Decision trail and terminal records for scanned files.
//!
//! # Responsibilities
//! - Record each gate evaluation as a `DecisionStep`
//! - Describe why a file or rule did not become a route
//! - Deliver skip/ignore/config records to a `ScanObserver`

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::routing::method::HttpMethod;
use crate::scan::directory::EffectiveConfig;

/// Named gates a file passes through, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Gate {
    #[serde(rename = "config.enabled")]
    ConfigEnabled,
    #[serde(rename = "ignore-prefix")]
    IgnorePrefix,
    #[serde(rename = "file.supported")]
    FileSupported,
    #[serde(rename = "filter.exclude")]
    FilterExclude,
    #[serde(rename = "filter.include")]
    FilterInclude,
    #[serde(rename = "route.derived")]
    RouteDerived,
    #[serde(rename = "rule.enabled")]
    RuleEnabled,
}

impl Gate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gate::ConfigEnabled => "config.enabled",
            Gate::IgnorePrefix => "ignore-prefix",
            Gate::FileSupported => "file.supported",
            Gate::FilterExclude => "filter.exclude",
            Gate::FilterInclude => "filter.include",
            Gate::RouteDerived => "route.derived",
            Gate::RuleEnabled => "rule.enabled",
        }
    }
}

/// One gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionStep {
    pub gate: Gate,
    pub passed: bool,
    /// Config file that contributed to the outcome, if any.
    pub source: Option<PathBuf>,
    pub detail: String,
}

/// Ordered gate evaluations for one file (or one rule of a file).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DecisionChain {
    steps: Vec<DecisionStep>,
}

impl DecisionChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[DecisionStep] {
        &self.steps
    }

    /// The first failing gate.
    pub fn failed_gate(&self) -> Option<Gate> {
        self.steps.iter().find(|s| !s.passed).map(|s| s.gate)
    }

    pub fn gates(&self) -> Vec<Gate> {
        self.steps.iter().map(|s| s.gate).collect()
    }

    pub(crate) fn pass(&mut self, gate: Gate, detail: impl Into<String>, source: Option<&Path>) {
        self.push(gate, true, detail, source);
    }

    pub(crate) fn fail(&mut self, gate: Gate, detail: impl Into<String>, source: Option<&Path>) {
        self.push(gate, false, detail, source);
    }

    /// A copy of this chain with one more step.
    pub(crate) fn extended(&self, gate: Gate, passed: bool, detail: impl Into<String>) -> Self {
        let mut chain = self.clone();
        chain.push(gate, passed, detail, None);
        chain
    }

    fn push(&mut self, gate: Gate, passed: bool, detail: impl Into<String>, source: Option<&Path>) {
        self.steps.push(DecisionStep {
            gate,
            passed,
            source: source.map(Path::to_path_buf),
            detail: detail.into(),
        });
    }
}

/// Why a file or rule was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    DisabledDir,
    IgnorePrefix,
    Exclude,
    Include,
    Disabled,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::DisabledDir => "disabled-dir",
            SkipReason::IgnorePrefix => "ignore-prefix",
            SkipReason::Exclude => "exclude",
            SkipReason::Include => "include",
            SkipReason::Disabled => "disabled",
        }
    }
}

/// Why a file was ignored outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IgnoreReason {
    Unsupported,
    InvalidRoute,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::Unsupported => "unsupported",
            IgnoreReason::InvalidRoute => "invalid-route",
        }
    }
}

/// A file or rule filtered out by configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipRecord {
    pub file: PathBuf,
    pub reason: SkipReason,
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub config_chain: Vec<PathBuf>,
    pub decision_chain: DecisionChain,
    pub effective_config: EffectiveConfig,
}

/// A file that cannot be a route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoreRecord {
    pub file: PathBuf,
    pub reason: IgnoreReason,
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub config_chain: Vec<PathBuf>,
    pub decision_chain: DecisionChain,
    pub effective_config: EffectiveConfig,
}

/// A directory-config file seen during the scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    pub file: PathBuf,
    pub enabled: bool,
    pub config_chain: Vec<PathBuf>,
    pub effective_config: EffectiveConfig,
}

/// Receives the audit trail of a scan.
pub trait ScanObserver {
    fn on_skip(&mut self, _record: SkipRecord) {}
    fn on_ignore(&mut self, _record: IgnoreRecord) {}
    fn on_config(&mut self, _record: ConfigRecord) {}
}

/// Observer that keeps every record.
#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    pub skips: Vec<SkipRecord>,
    pub ignores: Vec<IgnoreRecord>,
    pub configs: Vec<ConfigRecord>,
}

impl ScanObserver for ScanReport {
    fn on_skip(&mut self, record: SkipRecord) {
        self.skips.push(record);
    }

    fn on_ignore(&mut self, record: IgnoreRecord) {
        self.ignores.push(record);
    }

    fn on_config(&mut self, record: ConfigRecord) {
        self.configs.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_gate_is_first_failure() {
        let mut chain = DecisionChain::new();
        chain.pass(Gate::ConfigEnabled, "enabled", None);
        chain.fail(Gate::IgnorePrefix, "segment '.x' starts with '.'", None);
        assert_eq!(chain.failed_gate(), Some(Gate::IgnorePrefix));
        assert_eq!(chain.gates(), vec![Gate::ConfigEnabled, Gate::IgnorePrefix]);
    }

    #[test]
    fn test_extended_leaves_original_untouched() {
        let mut chain = DecisionChain::new();
        chain.pass(Gate::RouteDerived, "GET /a", None);
        let rule_chain = chain.extended(Gate::RuleEnabled, false, "rule 0 disabled");
        assert_eq!(chain.steps().len(), 1);
        assert_eq!(rule_chain.steps().len(), 2);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_value(SkipReason::DisabledDir).unwrap(), "disabled-dir");
        assert_eq!(serde_json::to_value(IgnoreReason::InvalidRoute).unwrap(), "invalid-route");
        assert_eq!(serde_json::to_value(Gate::FilterInclude).unwrap(), "filter.include");
    }
}
