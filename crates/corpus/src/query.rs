use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CorpusError, CorpusResult};
use crate::record::{FunctionRecord, StateMutability, Visibility};

/// One conjunct of a [`Query`].
///
/// Filters compose conjunctively. Disjunction and negation would be new
/// variants here; nothing downstream assumes the list stays flat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Filter {
    /// Exact, case-sensitive match on the function name. Functions sharing a
    /// name but differing in signature all match.
    NameEquals(String),
    /// Exact match on the owning contract's address or name.
    ContractEquals(String),
    VisibilityIs(Visibility),
    MutabilityIs(StateMutability),
}

impl Filter {
    fn matches(&self, record: &FunctionRecord) -> bool {
        match self {
            Filter::NameEquals(name) => record.name() == name,
            Filter::ContractEquals(contract) => record.contract() == contract,
            Filter::VisibilityIs(visibility) => record.visibility() == *visibility,
            Filter::MutabilityIs(mutability) => record.mutability() == *mutability,
        }
    }

    /// Canonical text form, used for fingerprints and logging.
    fn canonical(&self) -> String {
        match self {
            Filter::NameEquals(name) => format!("name={}", name),
            Filter::ContractEquals(contract) => format!("contract={}", contract),
            Filter::VisibilityIs(visibility) => format!("visibility={}", visibility),
            Filter::MutabilityIs(mutability) => format!("mutability={}", mutability),
        }
    }
}

/// Immutable, composable filter expression over function records.
///
/// A query has no side effects until executed against an index, and two
/// queries built from the same sequence of builder calls compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    filters: Vec<Filter>,
}

impl Query {
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Whether the record satisfies every conjunct. An empty query matches
    /// everything.
    pub fn matches(&self, record: &FunctionRecord) -> bool {
        self.filters.iter().all(|filter| filter.matches(record))
    }

    /// The name constrained by the first `NameEquals` conjunct, if any. Used
    /// by the index to pick its posting-list fast path.
    pub(crate) fn name_constraint(&self) -> Option<&str> {
        self.filters.iter().find_map(|filter| match filter {
            Filter::NameEquals(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Stable hash of the canonical filter sequence. Equal queries share a
    /// fingerprint; the query cache keys on it.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for filter in &self.filters {
            hasher.update(filter.canonical().as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.filters.is_empty() {
            return write!(f, "(all)");
        }
        let parts: Vec<String> = self.filters.iter().map(Filter::canonical).collect();
        write!(f, "{}", parts.join(" AND "))
    }
}

/// Fluent builder for [`Query`]. Holds no reference to any index; the index
/// and resolver are supplied at execution time.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    filters: Vec<Filter>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn name_equals(mut self, name: impl Into<String>) -> Self {
        self.filters.push(Filter::NameEquals(name.into()));
        self
    }

    pub fn contract_equals(mut self, contract: impl Into<String>) -> Self {
        self.filters.push(Filter::ContractEquals(contract.into()));
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.filters.push(Filter::VisibilityIs(visibility));
        self
    }

    pub fn mutability(mut self, mutability: StateMutability) -> Self {
        self.filters.push(Filter::MutabilityIs(mutability));
        self
    }

    pub fn build(self) -> Query {
        Query {
            filters: self.filters,
        }
    }
}

/// Cap on the number of records a query execution may return.
///
/// Required on every execution; unbounded execution is not expressible, which
/// keeps a misbehaving query from exploding a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionBound(NonZeroUsize);

impl ExecutionBound {
    /// Rejects zero with `InvalidArgument`.
    pub fn new(bound: usize) -> CorpusResult<Self> {
        NonZeroUsize::new(bound).map(ExecutionBound).ok_or_else(|| {
            CorpusError::InvalidArgument("execution bound must be positive".to_string())
        })
    }

    pub const fn from_nonzero(bound: NonZeroUsize) -> Self {
        ExecutionBound(bound)
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for ExecutionBound {
    type Error = CorpusError;

    fn try_from(bound: usize) -> CorpusResult<Self> {
        ExecutionBound::new(bound)
    }
}

impl std::fmt::Display for ExecutionBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceId;

    #[test]
    fn same_builder_calls_yield_equal_queries() {
        let a = Query::builder()
            .name_equals("delegate")
            .visibility(Visibility::Public)
            .build();
        let b = Query::builder()
            .name_equals("delegate")
            .visibility(Visibility::Public)
            .build();
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn filter_order_is_part_of_query_identity() {
        let a = Query::builder()
            .name_equals("delegate")
            .contract_equals("Token")
            .build();
        let b = Query::builder()
            .contract_equals("Token")
            .name_equals("delegate")
            .build();
        assert_ne!(a, b);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn conjuncts_all_must_match() {
        let record = FunctionRecord::new("Token", "delegate", "delegate(address)", SourceId::new(0))
            .with_visibility(Visibility::External);

        let by_name = Query::builder().name_equals("delegate").build();
        assert!(by_name.matches(&record));

        let mismatched = Query::builder()
            .name_equals("delegate")
            .visibility(Visibility::Private)
            .build();
        assert!(!mismatched.matches(&record));
    }

    #[test]
    fn name_match_is_case_sensitive() {
        let record = FunctionRecord::new("Token", "delegate", "delegate(address)", SourceId::new(0));
        let query = Query::builder().name_equals("Delegate").build();
        assert!(!query.matches(&record));
    }

    #[test]
    fn empty_query_matches_everything() {
        let record = FunctionRecord::new("Token", "transfer", "transfer(address,uint256)", SourceId::new(0));
        assert!(Query::builder().build().matches(&record));
    }

    #[test]
    fn zero_bound_is_rejected() {
        let err = ExecutionBound::new(0).unwrap_err();
        assert!(matches!(err, CorpusError::InvalidArgument(_)));
        assert!(ExecutionBound::new(1).is_ok());
    }
}
