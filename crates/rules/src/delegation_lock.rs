use corpus::{ExecutionBound, Query, SourceText};

use crate::rule::{Rule, DEFAULT_RESULT_CAP};
use crate::types::{RuleId, RuleMetadata, Severity};

/// Rule for governance delegation-lock vulnerabilities (NounsDAO style).
///
/// Governance tokens that resolve `delegates(account)` to the account itself
/// while the delegation mapping holds address(0) let a delegation to
/// address(0) silently lock the tokens out of voting. The heuristic flags
/// `delegate` functions whose body never names the null address together
/// with a guard keyword.
pub struct DelegationLockRule {
    metadata: RuleMetadata,
}

impl Default for DelegationLockRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DelegationLockRule {
    pub fn new() -> Self {
        Self {
            metadata: RuleMetadata::new(
                "Governance Delegation Lock Vulnerability (NounsDAO Style)",
                "Detects governance contracts where delegation to address(0) locks voting. \
                 If delegates(account) returns account when _delegates[account] == 0, \
                 tokens become permanently locked from governance participation.",
                "Hackerdemy Team",
                Severity::Critical,
            )
            .with_tag("governance")
            .with_tag("delegation")
            .with_tag("voting")
            .with_tag("lock")
            .with_reference(
                "https://mirror.xyz/verbsteam.eth/TP917T6vm6gXuVAxbQ34ZCn7dNiHabu3UW-ninwalVc",
            ),
        }
    }

    /// A delegation body counts as guarded when it names the null-address
    /// sentinel and aborts on it via `require` or `revert`. Plain substring
    /// presence, order-insensitive, case-sensitive, no tokenization.
    fn has_zero_address_guard(source: &SourceText) -> bool {
        source.contains("address(0)")
            && (source.contains("require") || source.contains("revert"))
    }
}

impl Rule for DelegationLockRule {
    fn id(&self) -> RuleId {
        RuleId("governance-delegation-lock".to_string())
    }

    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn build_query(&self) -> Query {
        Query::builder().name_equals("delegate").build()
    }

    fn result_bound(&self) -> ExecutionBound {
        DEFAULT_RESULT_CAP
    }

    fn is_vulnerable(&self, source: &SourceText) -> bool {
        !Self::has_zero_address_guard(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(body: &str) -> bool {
        DelegationLockRule::new().is_vulnerable(&SourceText::new(body))
    }

    #[test]
    fn rule_properties() {
        let rule = DelegationLockRule::new();
        assert_eq!(rule.id(), RuleId::new("governance-delegation-lock"));
        assert_eq!(rule.metadata().severity, Severity::Critical);
        assert!(rule.metadata().has_tag("governance"));
        assert!(rule.is_enabled());
        assert_eq!(rule.result_bound().get(), 100);
    }

    #[test]
    fn query_targets_delegate_by_name() {
        let rule = DelegationLockRule::new();
        assert_eq!(
            rule.build_query(),
            Query::builder().name_equals("delegate").build()
        );
    }

    #[test]
    fn null_check_with_require_is_clean() {
        assert!(!classify(
            "function delegate(address to) public {\n    require(to != address(0), \"zero delegatee\");\n    delegates[msg.sender] = to;\n}"
        ));
    }

    #[test]
    fn null_check_with_revert_is_clean() {
        assert!(!classify(
            "function delegate(address to) public {\n    if (to == address(0)) revert ZeroDelegatee();\n    delegates[msg.sender] = to;\n}"
        ));
    }

    #[test]
    fn null_mention_without_guard_is_vulnerable() {
        assert!(classify(
            "function delegate(address to) public {\n    // address(0) means self-delegation here\n    delegates[msg.sender] = to;\n}"
        ));
    }

    #[test]
    fn no_null_check_at_all_is_vulnerable() {
        assert!(classify(
            "function delegate(address to) public {\n    delegates[msg.sender] = to;\n}"
        ));
    }

    #[test]
    fn guard_keyword_without_null_sentinel_is_vulnerable() {
        assert!(classify(
            "function delegate(address to) public {\n    require(to != msg.sender);\n    delegates[msg.sender] = to;\n}"
        ));
    }

    #[test]
    fn matching_is_case_sensitive() {
        // "Address(0)" is not the sentinel the heuristic looks for.
        assert!(classify(
            "function delegate(address to) public {\n    require(to != Address(0));\n    delegates[msg.sender] = to;\n}"
        ));
    }
}
