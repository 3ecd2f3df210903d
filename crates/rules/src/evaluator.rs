use std::collections::HashSet;

use anyhow::Result;

use corpus::{CorpusError, FunctionIndex, FunctionRecord, QueryCache, SourceResolver};

use crate::rule::Rule;
use crate::types::{Finding, RuleOutcome};

/// Runs one rule at a time: execute its query, resolve source per match,
/// apply the predicate, collect accepted records as findings.
///
/// Borrows the index and resolver; neither is mutated, so any number of
/// evaluators can share them across threads.
pub struct RuleEvaluator<'a, 'c> {
    index: &'a FunctionIndex,
    resolver: &'a dyn SourceResolver,
    cache: Option<&'c QueryCache>,
}

impl<'a, 'c> RuleEvaluator<'a, 'c> {
    pub fn new(index: &'a FunctionIndex, resolver: &'a dyn SourceResolver) -> Self {
        Self {
            index,
            resolver,
            cache: None,
        }
    }

    /// Reuse executions of identical queries across rules.
    pub fn with_query_cache(mut self, cache: &'c QueryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Evaluate a single rule.
    ///
    /// Matched records whose source does not resolve are skipped and
    /// counted, never aborting the rule. Findings come out in query
    /// execution order, and each record is classified at most once.
    pub fn evaluate(&self, rule: &dyn Rule) -> Result<RuleOutcome<'a>> {
        self.index.ensure_available()?;

        let query = rule.build_query();
        let bound = rule.result_bound();
        let matches = self.execute_query(&query, bound)?;

        let mut outcome = RuleOutcome::new(rule.id(), rule.metadata().clone());
        let mut seen = HashSet::new();
        for record in matches {
            // A record can surface through more than one branch once
            // disjunctive filters exist; classify it at most once per run.
            if !seen.insert(record.id()) {
                continue;
            }

            let source = match self.resolver.resolve(record) {
                Ok(source) => source,
                Err(CorpusError::SourceNotFound { function }) => {
                    log::debug!("Rule {} skipped {}: source unavailable", rule.id(), function);
                    outcome.skipped_records += 1;
                    continue;
                }
                Err(other) => return Err(other.into()),
            };

            if rule.is_vulnerable(&source) {
                outcome
                    .findings
                    .push(Finding::new(rule.id(), rule.metadata().severity, record));
            }
        }

        log::debug!(
            "Rule {} completed with {} findings, {} skipped",
            rule.id(),
            outcome.findings.len(),
            outcome.skipped_records
        );
        Ok(outcome)
    }

    fn execute_query(
        &self,
        query: &corpus::Query,
        bound: corpus::ExecutionBound,
    ) -> Result<Vec<&'a FunctionRecord>> {
        let Some(cache) = self.cache else {
            return Ok(self.index.execute(query, bound)?);
        };

        if let Some(ids) = cache.get(query, bound) {
            // Ids were produced from this sealed index, so every lookup hits.
            return Ok(ids.iter().filter_map(|id| self.index.get(*id)).collect());
        }

        let records = self.index.execute(query, bound)?;
        cache.store(query, bound, records.iter().map(|r| r.id()).collect());
        Ok(records)
    }
}
