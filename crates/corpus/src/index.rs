use std::collections::HashMap;

use crate::error::{CorpusError, CorpusResult};
use crate::query::{ExecutionBound, Query};
use crate::record::{FunctionId, FunctionRecord};

/// Queryable collection of contract function records for one corpus.
///
/// The index has a two-phase lifecycle: the ingestion collaborator `insert`s
/// records, then calls [`seal`](FunctionIndex::seal). Queries are read-only
/// and only served by a sealed index, so a scan window never overlaps
/// mutation and concurrent rule evaluations need no locking.
pub struct FunctionIndex {
    records: Vec<FunctionRecord>,
    /// Posting lists per function name, in insertion order.
    by_name: HashMap<String, Vec<usize>>,
    sealed: bool,
}

impl FunctionIndex {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            by_name: HashMap::new(),
            sealed: false,
        }
    }

    /// Add a record during ingestion. Fails once the index is sealed.
    pub fn insert(&mut self, mut record: FunctionRecord) -> CorpusResult<FunctionId> {
        if self.sealed {
            return Err(CorpusError::InvalidArgument(
                "cannot insert into a sealed index".to_string(),
            ));
        }

        let id = FunctionId::new(self.records.len());
        record.assign_id(id);
        self.by_name
            .entry(record.name().to_string())
            .or_default()
            .push(self.records.len());
        self.records.push(record);
        Ok(id)
    }

    /// End the ingestion phase. Idempotent; queries are refused until called.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Fails with `IndexUnavailable` while the index is still being built.
    /// Batch runners call this once before the first rule executes.
    pub fn ensure_available(&self) -> CorpusResult<()> {
        if self.sealed {
            Ok(())
        } else {
            Err(CorpusError::IndexUnavailable(
                "index not sealed; ingestion still in progress".to_string(),
            ))
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: FunctionId) -> Option<&FunctionRecord> {
        self.records.get(id.as_usize())
    }

    /// Convenience constructor for the single most common query.
    pub fn filter_by_name(&self, name: &str) -> Query {
        Query::builder().name_equals(name).build()
    }

    /// Evaluate the filter tree against the index, in insertion order,
    /// stopping once `bound` records have matched. Exhausting the corpus
    /// first is not an error, and an empty index yields an empty result.
    pub fn execute(
        &self,
        query: &Query,
        bound: ExecutionBound,
    ) -> CorpusResult<Vec<&FunctionRecord>> {
        self.ensure_available()?;

        // A name conjunct narrows the scan to its posting list, which is in
        // insertion order already, so the fast path preserves result order.
        let mut matches = Vec::new();
        match query.name_constraint() {
            Some(name) => {
                let Some(positions) = self.by_name.get(name) else {
                    return Ok(matches);
                };
                for &position in positions {
                    let record = &self.records[position];
                    if query.matches(record) {
                        matches.push(record);
                        if matches.len() == bound.get() {
                            break;
                        }
                    }
                }
            }
            None => {
                for record in &self.records {
                    if query.matches(record) {
                        matches.push(record);
                        if matches.len() == bound.get() {
                            break;
                        }
                    }
                }
            }
        }
        Ok(matches)
    }
}

impl Default for FunctionIndex {
    fn default() -> Self {
        Self::new()
    }
}
