// Corpus substrate: function records, the queryable index, bounded query
// execution, and source text resolution. Rule evaluation lives in the
// `rules` crate on top of this one.

pub mod cache;
pub mod error;
pub mod index;
pub mod query;
pub mod record;
pub mod source;

// Re-export core types
pub use cache::{QueryCache, QueryCacheStats};
pub use error::{CorpusError, CorpusResult};
pub use index::FunctionIndex;
pub use query::{ExecutionBound, Filter, Query, QueryBuilder};
pub use record::{FunctionId, FunctionRecord, StateMutability, Visibility};
pub use source::{InMemorySourceStore, SourceId, SourceResolver, SourceText};
