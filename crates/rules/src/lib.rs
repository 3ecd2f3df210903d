// Core rule framework
pub mod catalog;
pub mod evaluator;
pub mod rule;
pub mod types;

// Rule implementations
pub mod delegation_lock;

// Re-export core types and traits
pub use catalog::{CatalogConfig, RuleCatalog};
pub use delegation_lock::DelegationLockRule;
pub use evaluator::RuleEvaluator;
pub use rule::{HeuristicRule, Rule, DEFAULT_RESULT_CAP};
pub use types::{
    Finding, RuleId, RuleMetadata, RuleOutcome, ScanReport, ScanStats, Severity,
};
