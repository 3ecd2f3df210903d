use serde::{Deserialize, Serialize};

use crate::source::SourceId;

/// Identifier of a function record within one index.
///
/// Assigned by [`FunctionIndex::insert`](crate::index::FunctionIndex::insert)
/// in insertion order; only meaningful for records obtained from an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
pub struct FunctionId(usize);

impl FunctionId {
    pub(crate) fn new(id: usize) -> Self {
        FunctionId(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for FunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "function #{}", self.0)
    }
}

/// Declared visibility of a contract function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    External,
    Internal,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::External => write!(f, "external"),
            Visibility::Internal => write!(f, "internal"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// State mutability of a contract function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl std::fmt::Display for StateMutability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateMutability::Pure => write!(f, "pure"),
            StateMutability::View => write!(f, "view"),
            StateMutability::NonPayable => write!(f, "nonpayable"),
            StateMutability::Payable => write!(f, "payable"),
        }
    }
}

/// A single indexed contract function.
///
/// Created by the ingestion collaborator and immutable once inserted into an
/// index. The record references its source text by [`SourceId`] rather than
/// owning it; the backing store keeps the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    id: FunctionId,
    contract: String,
    name: String,
    signature: String,
    visibility: Visibility,
    mutability: StateMutability,
    parameter_types: Vec<String>,
    source: SourceId,
}

impl FunctionRecord {
    pub fn new(
        contract: impl Into<String>,
        name: impl Into<String>,
        signature: impl Into<String>,
        source: SourceId,
    ) -> Self {
        Self {
            id: FunctionId(0),
            contract: contract.into(),
            name: name.into(),
            signature: signature.into(),
            visibility: Visibility::Public,
            mutability: StateMutability::NonPayable,
            parameter_types: Vec::new(),
            source,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_mutability(mut self, mutability: StateMutability) -> Self {
        self.mutability = mutability;
        self
    }

    pub fn with_parameter_types(mut self, parameter_types: Vec<String>) -> Self {
        self.parameter_types = parameter_types;
        self
    }

    pub(crate) fn assign_id(&mut self, id: FunctionId) {
        self.id = id;
    }

    /// Index-assigned identifier; insertion position within the owning index.
    pub fn id(&self) -> FunctionId {
        self.id
    }

    /// Contract the function belongs to (address or name, as ingested).
    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn mutability(&self) -> StateMutability {
        self.mutability
    }

    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    pub fn source(&self) -> SourceId {
        self.source
    }
}

impl std::fmt::Display for FunctionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.contract, self.signature)
    }
}
