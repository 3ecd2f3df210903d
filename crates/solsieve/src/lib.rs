//! Heuristic vulnerability rule engine over an indexed smart-contract
//! function corpus. It is a _best effort_ matcher: rules are shallow
//! textual heuristics, expected to trade false positives and negatives for
//! speed over large corpora.
//!
//! # How it works
//!
//! 1. An ingestion collaborator populates a [`FunctionIndex`] with
//!    [`FunctionRecord`]s and an [`InMemorySourceStore`] (or any other
//!    [`SourceResolver`]) with their source text, then seals the index.
//! 2. Each [`Rule`] contributes a [`Query`] — a composable, bounded filter
//!    over record attributes — and a predicate over source text.
//! 3. The [`RuleCatalog`] batch-executes rules against the shared read-only
//!    corpus, in parallel, and aggregates per-rule [`Finding`]s into a
//!    [`ScanReport`] for the reporting layer.
//!
//! # Basic usage
//!
//! ```
//! use solsieve::{scan, FunctionIndex, FunctionRecord, InMemorySourceStore};
//!
//! let mut index = FunctionIndex::new();
//! let mut store = InMemorySourceStore::new();
//!
//! let source = store.insert(
//!     "function delegate(address to) public { delegates[msg.sender] = to; }",
//! );
//! index
//!     .insert(FunctionRecord::new(
//!         "GovToken",
//!         "delegate",
//!         "delegate(address)",
//!         source,
//!     ))
//!     .unwrap();
//! index.seal();
//!
//! let report = scan(&index, &store).unwrap();
//! assert_eq!(report.findings().count(), 1);
//! ```

pub use corpus::{
    CorpusError, CorpusResult, ExecutionBound, Filter, FunctionId, FunctionIndex, FunctionRecord,
    InMemorySourceStore, Query, QueryBuilder, QueryCache, SourceId, SourceResolver, SourceText,
    StateMutability, Visibility,
};
pub use rules::{
    CatalogConfig, DelegationLockRule, Finding, HeuristicRule, Rule, RuleCatalog, RuleEvaluator,
    RuleId, RuleMetadata, RuleOutcome, ScanReport, ScanStats, Severity,
};

/// Run the built-in rule catalog against a corpus with default
/// configuration.
pub fn scan<'idx>(
    index: &'idx FunctionIndex,
    resolver: &'idx dyn SourceResolver,
) -> anyhow::Result<ScanReport<'idx>> {
    RuleCatalog::with_builtin_rules().run_scan(index, resolver)
}
