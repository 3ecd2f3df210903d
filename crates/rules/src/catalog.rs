use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use crossbeam_channel::unbounded;

use corpus::{FunctionIndex, QueryCache, SourceResolver};

use crate::delegation_lock::DelegationLockRule;
use crate::evaluator::RuleEvaluator;
use crate::rule::Rule;
use crate::types::{RuleId, RuleOutcome, ScanReport, ScanStats, Severity};

/// Configuration for a batch scan.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Worker threads for rule evaluation; 1 runs sequentially.
    pub worker_threads: usize,
    /// Abort the batch on the first rule failure instead of recording it.
    pub fail_fast: bool,
    /// Findings below this severity are dropped from the report.
    pub min_severity: Severity,
    /// Reuse executions of identical queries across rules.
    pub enable_query_cache: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get().min(8),
            fail_fast: false,
            min_severity: Severity::Info,
            enable_query_cache: true,
        }
    }
}

/// Catalog of registered rules: enumeration, tag/severity filtering, and
/// batch execution against one corpus.
///
/// Rules are independent of each other and of any corpus, so the batch runs
/// them in parallel over the shared read-only index and resolver.
pub struct RuleCatalog {
    rules: Vec<Arc<dyn Rule>>,
    config: CatalogConfig,
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            config: CatalogConfig::default(),
        }
    }

    pub fn with_config(config: CatalogConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    /// Catalog preloaded with every built-in rule.
    pub fn with_builtin_rules() -> Self {
        let mut catalog = Self::new();
        catalog.register(Arc::new(DelegationLockRule::new()));
        catalog
    }

    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn register_all(&mut self, rules: Vec<Arc<dyn Rule>>) {
        for rule in rules {
            self.register(rule);
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn rule_ids(&self) -> Vec<RuleId> {
        self.rules.iter().map(|rule| rule.id()).collect()
    }

    pub fn get(&self, id: &RuleId) -> Option<&Arc<dyn Rule>> {
        self.rules.iter().find(|rule| &rule.id() == id)
    }

    pub fn rules_by_tag(&self, tag: &str) -> Vec<&Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|rule| rule.metadata().has_tag(tag))
            .collect()
    }

    pub fn rules_by_min_severity(&self, min_severity: Severity) -> Vec<&Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|rule| rule.metadata().severity >= min_severity)
            .collect()
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CatalogConfig) {
        self.config = config;
    }

    /// Run every enabled rule against the corpus.
    ///
    /// An unavailable index is surfaced before any rule executes. Per-rule
    /// failures are recorded in that rule's outcome and never abort the
    /// batch unless `fail_fast` is set. Outcome order follows registration
    /// order regardless of which worker finished first.
    pub fn run_scan<'idx>(
        &self,
        index: &'idx FunctionIndex,
        resolver: &'idx dyn SourceResolver,
    ) -> Result<ScanReport<'idx>> {
        index.ensure_available()?;

        let started = Instant::now();
        let cache = if self.config.enable_query_cache {
            Some(QueryCache::new())
        } else {
            None
        };

        let enabled: Vec<(usize, &Arc<dyn Rule>)> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.is_enabled())
            .collect();

        let mut slotted = if self.config.worker_threads > 1 && enabled.len() > 1 {
            self.run_parallel(&enabled, index, resolver, cache.as_ref())?
        } else {
            self.run_sequential(&enabled, index, resolver, cache.as_ref())?
        };
        slotted.sort_by_key(|(slot, _)| *slot);

        let mut stats = ScanStats {
            rules_run: slotted.len(),
            ..ScanStats::default()
        };
        let mut outcomes = Vec::with_capacity(slotted.len());
        for (_, mut outcome) in slotted {
            outcome
                .findings
                .retain(|finding| finding.severity() >= self.config.min_severity);
            for finding in &outcome.findings {
                stats.record_finding(finding);
            }
            outcomes.push(outcome);
        }
        stats.total_time_ms = started.elapsed().as_millis() as u64;

        Ok(ScanReport { outcomes, stats })
    }

    fn run_sequential<'idx>(
        &self,
        rules: &[(usize, &Arc<dyn Rule>)],
        index: &'idx FunctionIndex,
        resolver: &'idx dyn SourceResolver,
        cache: Option<&QueryCache>,
    ) -> Result<Vec<(usize, RuleOutcome<'idx>)>> {
        let mut evaluator = RuleEvaluator::new(index, resolver);
        if let Some(cache) = cache {
            evaluator = evaluator.with_query_cache(cache);
        }

        let mut slotted = Vec::with_capacity(rules.len());
        for (slot, rule) in rules {
            match evaluator.evaluate(rule.as_ref()) {
                Ok(outcome) => slotted.push((*slot, outcome)),
                Err(error) => {
                    if self.config.fail_fast {
                        return Err(error);
                    }
                    log::warn!("Rule {} failed: {}", rule.id(), error);
                    let mut outcome = RuleOutcome::new(rule.id(), rule.metadata().clone());
                    outcome.error = Some(error.to_string());
                    slotted.push((*slot, outcome));
                }
            }
        }
        Ok(slotted)
    }

    /// Worker pool over the rule list: each worker pulls rule positions off
    /// a shared channel and evaluates with its own evaluator.
    fn run_parallel<'idx>(
        &self,
        rules: &[(usize, &Arc<dyn Rule>)],
        index: &'idx FunctionIndex,
        resolver: &'idx dyn SourceResolver,
        cache: Option<&QueryCache>,
    ) -> Result<Vec<(usize, RuleOutcome<'idx>)>> {
        let workers = self.config.worker_threads.min(rules.len());

        let (task_tx, task_rx) = unbounded::<usize>();
        let (result_tx, result_rx) = unbounded();
        for position in 0..rules.len() {
            // Receiver is alive for the whole scope; the send cannot fail.
            task_tx.send(position).expect("task channel open");
        }
        drop(task_tx);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    let mut evaluator = RuleEvaluator::new(index, resolver);
                    if let Some(cache) = cache {
                        evaluator = evaluator.with_query_cache(cache);
                    }
                    while let Ok(position) = task_rx.recv() {
                        let (_, rule) = rules[position];
                        let result = evaluator.evaluate(rule.as_ref());
                        if result_tx.send((position, result)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut slotted = Vec::with_capacity(rules.len());
        for (position, result) in result_rx.iter() {
            let (slot, rule) = rules[position];
            match result {
                Ok(outcome) => slotted.push((slot, outcome)),
                Err(error) => {
                    if self.config.fail_fast {
                        return Err(error);
                    }
                    log::warn!("Rule {} failed: {}", rule.id(), error);
                    let mut outcome = RuleOutcome::new(rule.id(), rule.metadata().clone());
                    outcome.error = Some(error.to_string());
                    slotted.push((slot, outcome));
                }
            }
        }
        Ok(slotted)
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}
