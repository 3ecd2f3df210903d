use std::sync::RwLock;

use dashmap::DashMap;

use crate::query::{ExecutionBound, Query};
use crate::record::FunctionId;

/// Hit/miss statistics for a [`QueryCache`].
#[derive(Debug, Clone, Default)]
pub struct QueryCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stored: u64,
}

/// Cache of prior identical query executions.
///
/// Keyed by query fingerprint plus bound, so the same filter sequence run
/// with a different cap is a distinct entry. Values are the matched record
/// ids in result order. Purely an optimization: correctness never depends on
/// a hit, and entries are only valid against the sealed index they were
/// produced from.
pub struct QueryCache {
    entries: DashMap<String, Vec<FunctionId>>,
    stats: RwLock<QueryCacheStats>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            stats: RwLock::new(QueryCacheStats::default()),
        }
    }

    fn key(query: &Query, bound: ExecutionBound) -> String {
        format!("{}:{}", query.fingerprint(), bound.get())
    }

    /// Matched ids of a prior identical execution, in result order.
    pub fn get(&self, query: &Query, bound: ExecutionBound) -> Option<Vec<FunctionId>> {
        let key = Self::key(query, bound);
        match self.entries.get(&key) {
            Some(entry) => {
                self.stats.write().unwrap().hits += 1;
                Some(entry.clone())
            }
            None => {
                self.stats.write().unwrap().misses += 1;
                None
            }
        }
    }

    pub fn store(&self, query: &Query, bound: ExecutionBound, matches: Vec<FunctionId>) {
        self.entries.insert(Self::key(query, bound), matches);
        self.stats.write().unwrap().stored += 1;
    }

    pub fn contains(&self, query: &Query, bound: ExecutionBound) -> bool {
        self.entries.contains_key(&Self::key(query, bound))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, e.g. when switching to a different index.
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> QueryCacheStats {
        self.stats.read().unwrap().clone()
    }

    pub fn hit_ratio(&self) -> f64 {
        let stats = self.stats.read().unwrap();
        let total = stats.hits + stats.misses;
        if total == 0 {
            0.0
        } else {
            stats.hits as f64 / total as f64
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(n: usize) -> ExecutionBound {
        ExecutionBound::new(n).unwrap()
    }

    #[test]
    fn miss_then_hit() {
        let cache = QueryCache::new();
        let query = Query::builder().name_equals("delegate").build();

        assert!(cache.get(&query, bound(10)).is_none());

        cache.store(&query, bound(10), vec![]);
        assert!(cache.get(&query, bound(10)).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.stored, 1);
    }

    #[test]
    fn equal_queries_share_an_entry() {
        let cache = QueryCache::new();
        let a = Query::builder().name_equals("delegate").build();
        let b = Query::builder().name_equals("delegate").build();

        cache.store(&a, bound(5), vec![]);
        assert!(cache.contains(&b, bound(5)));
    }

    #[test]
    fn bound_is_part_of_the_key() {
        let cache = QueryCache::new();
        let query = Query::builder().name_equals("delegate").build();

        cache.store(&query, bound(5), vec![]);
        assert!(!cache.contains(&query, bound(6)));
    }

    #[test]
    fn invalidate_all_empties_the_cache() {
        let cache = QueryCache::new();
        let query = Query::builder().name_equals("delegate").build();
        cache.store(&query, bound(5), vec![]);
        assert_eq!(cache.len(), 1);

        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
