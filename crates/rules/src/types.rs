use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use corpus::FunctionRecord;

/// Unique identifier for a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational findings that don't represent security issues
    Info,
    /// Low-impact issues with minimal security implications
    Low,
    /// Medium-impact issues that could affect contract security
    Medium,
    /// High-impact issues that pose significant security risks
    High,
    /// Critical issues that could lead to loss of funds or locked state
    Critical,
}

impl Severity {
    /// Get the numeric score for this severity level
    pub fn score(&self) -> u8 {
        match self {
            Severity::Info => 1,
            Severity::Low => 2,
            Severity::Medium => 4,
            Severity::High => 7,
            Severity::Critical => 10,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Rule metadata consumed by cataloging and reporting collaborators.
///
/// Informational only: nothing here affects evaluation semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMetadata {
    pub title: String,
    pub description: String,
    pub author: String,
    pub tags: BTreeSet<String>,
    pub severity: Severity,
    /// Writeups and advisories, in citation order.
    pub references: Vec<String>,
}

impl RuleMetadata {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        author: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            author: author.into(),
            tags: BTreeSet::new(),
            severity,
            references: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_reference(mut self, url: impl Into<String>) -> Self {
        self.references.push(url.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// A function record accepted by a rule's predicate.
///
/// Borrows the record from the index it was matched in; findings are scoped
/// to the scan and persisted, if at all, by an external reporting layer.
#[derive(Debug, Clone, Serialize)]
pub struct Finding<'idx> {
    rule: RuleId,
    severity: Severity,
    record: &'idx FunctionRecord,
}

impl<'idx> Finding<'idx> {
    pub fn new(rule: RuleId, severity: Severity, record: &'idx FunctionRecord) -> Self {
        Self {
            rule,
            severity,
            record,
        }
    }

    pub fn rule(&self) -> &RuleId {
        &self.rule
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn record(&self) -> &'idx FunctionRecord {
        self.record
    }

    pub fn contract(&self) -> &str {
        self.record.contract()
    }

    pub fn function_name(&self) -> &str {
        self.record.name()
    }

    pub fn signature(&self) -> &str {
        self.record.signature()
    }
}

impl std::fmt::Display for Finding<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} at {}", self.severity, self.rule, self.record)
    }
}

/// Result of evaluating one rule against one corpus.
///
/// Carries the rule's metadata so a report renders without reaching back
/// into the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct RuleOutcome<'idx> {
    pub rule: RuleId,
    pub metadata: RuleMetadata,
    /// Accepted records, in query execution order.
    pub findings: Vec<Finding<'idx>>,
    /// Matched records skipped because their source did not resolve.
    pub skipped_records: usize,
    /// Present when the rule itself failed; the batch keeps going.
    pub error: Option<String>,
}

impl<'idx> RuleOutcome<'idx> {
    pub fn new(rule: RuleId, metadata: RuleMetadata) -> Self {
        Self {
            rule,
            metadata,
            findings: Vec::new(),
            skipped_records: 0,
            error: None,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.error.is_none()
    }
}

/// Statistics about a batch scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    /// Number of rules evaluated
    pub rules_run: usize,
    /// Total execution time in milliseconds
    pub total_time_ms: u64,
    /// Number of findings by severity
    pub findings_by_severity: HashMap<String, usize>,
    /// Number of findings by rule
    pub findings_by_rule: HashMap<String, usize>,
}

impl ScanStats {
    /// Update statistics with a new finding
    pub fn record_finding(&mut self, finding: &Finding<'_>) {
        *self
            .findings_by_severity
            .entry(finding.severity().to_string())
            .or_insert(0) += 1;
        *self
            .findings_by_rule
            .entry(finding.rule().to_string())
            .or_insert(0) += 1;
    }
}

/// Aggregate result of running a catalog against one corpus.
///
/// Outcome order follows rule registration order, independent of which
/// worker finished first.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport<'idx> {
    pub outcomes: Vec<RuleOutcome<'idx>>,
    pub stats: ScanStats,
}

impl<'idx> ScanReport<'idx> {
    /// All findings across rules, in per-rule order.
    pub fn findings(&self) -> impl Iterator<Item = &Finding<'idx>> {
        self.outcomes.iter().flat_map(|outcome| outcome.findings.iter())
    }

    /// Findings at or above the given severity.
    pub fn findings_with_severity(&self, min_severity: Severity) -> Vec<&Finding<'idx>> {
        self.findings()
            .filter(|finding| finding.severity() >= min_severity)
            .collect()
    }

    pub fn outcome(&self, rule: &RuleId) -> Option<&RuleOutcome<'idx>> {
        self.outcomes.iter().find(|outcome| &outcome.rule == rule)
    }

    /// Diagnostic total of records skipped on resolution failure.
    pub fn total_skipped(&self) -> usize {
        self.outcomes.iter().map(|outcome| outcome.skipped_records).sum()
    }

    /// Rules that failed outright, with their error messages.
    pub fn failed_rules(&self) -> Vec<(&RuleId, &str)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| {
                outcome
                    .error
                    .as_deref()
                    .map(|error| (&outcome.rule, error))
            })
            .collect()
    }
}
