//! End-to-end scan of the delegation-lock rule against a small corpus of
//! governance-token functions, exercising the catalog the way the
//! production scanner drives it.

use std::sync::Arc;

use corpus::{FunctionIndex, FunctionRecord, InMemorySourceStore, Query, SourceId, Visibility};
use rules::{
    CatalogConfig, DelegationLockRule, HeuristicRule, RuleCatalog, RuleId, RuleMetadata, Severity,
};

const GUARDED_DELEGATE: &str = r#"function delegate(address to) public {
    require(to != address(0), "cannot delegate to the zero address");
    _delegate(msg.sender, to);
}"#;

const UNGUARDED_DELEGATE: &str = r#"function delegate(address to) public {
    delegates[msg.sender] = to;
    emit DelegateChanged(msg.sender, to);
}"#;

const REVERTING_DELEGATE: &str = r#"function delegate(address to) external {
    if (to == address(0)) {
        revert InvalidDelegatee();
    }
    delegates[msg.sender] = to;
}"#;

const UNRELATED_TRANSFER: &str = r#"function transfer(address to, uint256 amount) public {
    balances[msg.sender] -= amount;
    balances[to] += amount;
}"#;

struct TestCorpus {
    index: FunctionIndex,
    store: InMemorySourceStore,
}

fn build_corpus() -> TestCorpus {
    let mut index = FunctionIndex::new();
    let mut store = InMemorySourceStore::new();

    let mut add = |contract: &str, name: &str, signature: &str, body: &str| {
        let source = store.insert(body);
        index
            .insert(
                FunctionRecord::new(contract, name, signature, source)
                    .with_visibility(Visibility::Public),
            )
            .unwrap();
    };

    add("SafeGovToken", "delegate", "delegate(address)", GUARDED_DELEGATE);
    add("NounsStyleToken", "delegate", "delegate(address)", UNGUARDED_DELEGATE);
    add("CheckedGovToken", "delegate", "delegate(address)", REVERTING_DELEGATE);
    add("SafeGovToken", "transfer", "transfer(address,uint256)", UNRELATED_TRANSFER);

    index.seal();
    TestCorpus { index, store }
}

#[test]
fn flags_unguarded_delegation_only() {
    let corpus = build_corpus();
    let catalog = RuleCatalog::with_builtin_rules();

    let report = catalog.run_scan(&corpus.index, &corpus.store).unwrap();
    let outcome = report
        .outcome(&RuleId::new("governance-delegation-lock"))
        .unwrap();

    assert_eq!(outcome.findings.len(), 1);
    let finding = &outcome.findings[0];
    assert_eq!(finding.contract(), "NounsStyleToken");
    assert_eq!(finding.function_name(), "delegate");
    assert_eq!(finding.severity(), Severity::Critical);

    // The outcome carries everything a report renderer needs.
    assert_eq!(
        outcome.metadata.title,
        "Governance Delegation Lock Vulnerability (NounsDAO Style)"
    );
    assert!(outcome.metadata.has_tag("governance"));
    assert!(!outcome.metadata.references.is_empty());
}

#[test]
fn transfer_functions_never_reach_the_predicate() {
    let corpus = build_corpus();
    let catalog = RuleCatalog::with_builtin_rules();

    let report = catalog.run_scan(&corpus.index, &corpus.store).unwrap();
    assert!(report
        .findings()
        .all(|finding| finding.function_name() == "delegate"));
}

#[test]
fn missing_source_skips_the_record_and_keeps_the_rest() {
    let mut index = FunctionIndex::new();
    let mut store = InMemorySourceStore::new();

    let source = store.insert(UNGUARDED_DELEGATE);
    index
        .insert(FunctionRecord::new("Flagged", "delegate", "delegate(address)", source))
        .unwrap();
    index
        .insert(FunctionRecord::new(
            "Evicted",
            "delegate",
            "delegate(address)",
            SourceId::new(4242),
        ))
        .unwrap();
    index.seal();

    let catalog = RuleCatalog::with_builtin_rules();
    let report = catalog.run_scan(&index, &store).unwrap();
    let outcome = report
        .outcome(&RuleId::new("governance-delegation-lock"))
        .unwrap();

    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.findings[0].contract(), "Flagged");
    assert_eq!(outcome.skipped_records, 1);
    assert_eq!(report.total_skipped(), 1);
    assert!(outcome.error.is_none());
}

#[test]
fn repeated_scans_produce_identical_reports() {
    let corpus = build_corpus();
    let catalog = RuleCatalog::with_builtin_rules();

    let shape = |report: &rules::ScanReport<'_>| -> Vec<(String, String)> {
        report
            .findings()
            .map(|f| (f.rule().to_string(), f.contract().to_string()))
            .collect()
    };

    let first = catalog.run_scan(&corpus.index, &corpus.store).unwrap();
    let second = catalog.run_scan(&corpus.index, &corpus.store).unwrap();
    assert_eq!(shape(&first), shape(&second));
}

#[test]
fn custom_rules_batch_alongside_builtins() {
    let corpus = build_corpus();

    let mut catalog = RuleCatalog::with_config(CatalogConfig {
        worker_threads: 4,
        ..CatalogConfig::default()
    });
    catalog.register(Arc::new(DelegationLockRule::new()));
    catalog.register(Arc::new(HeuristicRule::new(
        RuleId::new("emits-delegate-changed"),
        RuleMetadata::new(
            "DelegateChanged event",
            "Flags delegation updates that emit DelegateChanged",
            "tests",
            Severity::Info,
        )
        .with_tag("governance"),
        Query::builder().name_equals("delegate").build(),
        |source| source.contains("DelegateChanged"),
    )));

    let report = catalog.run_scan(&corpus.index, &corpus.store).unwrap();
    assert_eq!(report.stats.rules_run, 2);

    let event_rule = report.outcome(&RuleId::new("emits-delegate-changed")).unwrap();
    assert_eq!(event_rule.findings.len(), 1);
    assert_eq!(event_rule.findings[0].contract(), "NounsStyleToken");

    // Outcomes stay in registration order even with four workers.
    assert_eq!(report.outcomes[0].rule, RuleId::new("governance-delegation-lock"));
    assert_eq!(report.outcomes[1].rule, RuleId::new("emits-delegate-changed"));
}

#[test]
fn report_serializes_for_external_consumers() {
    let corpus = build_corpus();
    let catalog = RuleCatalog::with_builtin_rules();

    let report = catalog.run_scan(&corpus.index, &corpus.store).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    let outcomes = json.get("outcomes").and_then(|v| v.as_array()).unwrap();
    assert_eq!(outcomes.len(), 1);
    let findings = outcomes[0].get("findings").and_then(|v| v.as_array()).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(
        findings[0]["record"]["contract"],
        serde_json::json!("NounsStyleToken")
    );
}
