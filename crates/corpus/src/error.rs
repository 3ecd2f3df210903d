use thiserror::Error;

use crate::record::FunctionId;

/// Errors surfaced by the corpus layer.
///
/// The three kinds propagate differently: `InvalidArgument` aborts the
/// offending rule evaluation, `SourceNotFound` is skipped per record, and
/// `IndexUnavailable` is fatal for the whole scan.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// Caller contract violation: a zero execution bound or an index
    /// mutation outside the ingestion phase.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backing source for a matched record was evicted or never
    /// ingested. Evaluators skip the record and continue.
    #[error("source text not found for {function}")]
    SourceNotFound { function: FunctionId },

    /// The index cannot serve queries, e.g. it was never sealed after
    /// ingestion.
    #[error("function index unavailable: {0}")]
    IndexUnavailable(String),
}

pub type CorpusResult<T> = Result<T, CorpusError>;
