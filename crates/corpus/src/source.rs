use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CorpusError, CorpusResult};
use crate::record::FunctionRecord;

/// Identifier of a stored source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
pub struct SourceId(usize);

impl SourceId {
    pub fn new(id: usize) -> Self {
        SourceId(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source #{}", self.0)
    }
}

/// Exact source text of one function, byte-for-byte as stored at ingestion.
///
/// Cheap to clone. The SHA-256 digest is computed once at construction and
/// lets callers compare texts without touching the bytes.
#[derive(Debug, Clone)]
pub struct SourceText {
    text: Arc<str>,
    digest: String,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text: String = text.into();
        let digest = Self::compute_digest(&text);
        Self {
            text: Arc::from(text),
            digest,
        }
    }

    fn compute_digest(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// SHA-256 of the text, hex encoded.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Literal substring test; the bread and butter of textual heuristics.
    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }
}

impl PartialEq for SourceText {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for SourceText {}

impl std::fmt::Display for SourceText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Maps a function record to its source text.
///
/// Implementations may block on I/O (disk caches, remote stores); callers
/// treat `resolve` as potentially blocking. `Send + Sync` so concurrent rule
/// evaluations can share one resolver, and resolution must be deterministic:
/// the same record yields the same text for the lifetime of a scan.
pub trait SourceResolver: Send + Sync {
    /// Fails with `SourceNotFound` when the record's backing text was
    /// evicted or never ingested; evaluators skip such records.
    fn resolve(&self, record: &FunctionRecord) -> CorpusResult<SourceText>;
}

/// In-memory backing store, populated during ingestion.
#[derive(Default)]
pub struct InMemorySourceStore {
    texts: HashMap<SourceId, SourceText>,
    counter: usize,
}

impl InMemorySourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one function's source and return the id records reference it by.
    pub fn insert(&mut self, text: impl Into<String>) -> SourceId {
        let id = SourceId(self.counter);
        self.counter += 1;
        self.texts.insert(id, SourceText::new(text));
        id
    }

    /// Drop a stored text. Records still referencing the id resolve to
    /// `SourceNotFound` afterwards.
    pub fn evict(&mut self, id: SourceId) -> bool {
        self.texts.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

impl SourceResolver for InMemorySourceStore {
    fn resolve(&self, record: &FunctionRecord) -> CorpusResult<SourceText> {
        self.texts
            .get(&record.source())
            .cloned()
            .ok_or(CorpusError::SourceNotFound {
                function: record.id(),
            })
    }
}
