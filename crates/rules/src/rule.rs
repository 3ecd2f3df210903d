use std::num::NonZeroUsize;

use corpus::{ExecutionBound, Query, SourceText};

use crate::types::{RuleId, RuleMetadata};

/// Cap applied to a rule's query execution unless the rule overrides it.
pub const DEFAULT_RESULT_CAP: ExecutionBound =
    ExecutionBound::from_nonzero(match NonZeroUsize::new(100) {
        Some(cap) => cap,
        None => unreachable!(),
    });

/// Core trait every vulnerability rule implements.
///
/// A rule packages metadata with one query and one predicate. It holds no
/// corpus state of its own: the index and resolver are injected at
/// evaluation time, so a single rule instance can run against any number of
/// corpora, concurrently with other rules.
pub trait Rule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> RuleId;

    /// Metadata for cataloging and reporting
    fn metadata(&self) -> &RuleMetadata;

    /// Construct the filter this rule runs. Pure: no side effects and no
    /// access to any index.
    fn build_query(&self) -> Query;

    /// Cap on the records the query execution may return.
    fn result_bound(&self) -> ExecutionBound {
        DEFAULT_RESULT_CAP
    }

    /// Classify one function's source text as vulnerable. Must be pure and
    /// total; a panic here is a rule bug and propagates.
    fn is_vulnerable(&self, source: &SourceText) -> bool;

    /// Check if this rule is enabled (default: true)
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Predicate signature accepted by [`HeuristicRule`].
pub type Predicate = Box<dyn Fn(&SourceText) -> bool + Send + Sync>;

/// Rule assembled from parts: metadata, a query, and a predicate closure.
///
/// Covers one-off rules that need no type of their own; anything callable
/// from source text to a verdict plugs in.
pub struct HeuristicRule {
    id: RuleId,
    metadata: RuleMetadata,
    query: Query,
    bound: ExecutionBound,
    predicate: Predicate,
}

impl HeuristicRule {
    pub fn new(
        id: RuleId,
        metadata: RuleMetadata,
        query: Query,
        predicate: impl Fn(&SourceText) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            metadata,
            query,
            bound: DEFAULT_RESULT_CAP,
            predicate: Box::new(predicate),
        }
    }

    pub fn with_bound(mut self, bound: ExecutionBound) -> Self {
        self.bound = bound;
        self
    }
}

impl Rule for HeuristicRule {
    fn id(&self) -> RuleId {
        self.id.clone()
    }

    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn build_query(&self) -> Query {
        self.query.clone()
    }

    fn result_bound(&self) -> ExecutionBound {
        self.bound
    }

    fn is_vulnerable(&self, source: &SourceText) -> bool {
        (self.predicate)(source)
    }
}
