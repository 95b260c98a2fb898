// Copyright (c) 2025 - Cowboy AI, Inc.
//! Evaluation entry point tests
//!
//! Bundles are evaluated against an in-memory store, inventory and
//! publisher; assertions cover the response contract, persisted rule state
//! and the published rule group text.

mod fixtures;

use fixtures::*;
use flow_rules::domain::{FlowRule, RuleStatus};
use flow_rules::evaluation::{
    EvaluationInvoker, EvaluationRequest, InMemoryRuleGroupPublisher, LocalEvaluationInvoker,
    RuleBundleEvaluator,
};
use flow_rules::inventory::InMemoryInventory;
use flow_rules::rules::RuleDefinitionResolver;
use flow_rules::store::{InMemoryRuleBundleStore, RuleBundleRepository};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct Harness {
    store: Arc<InMemoryRuleBundleStore>,
    inventory: Arc<InMemoryInventory>,
    publisher: Arc<InMemoryRuleGroupPublisher>,
    evaluator: Arc<RuleBundleEvaluator>,
}

async fn harness(rules: Vec<FlowRule>) -> Harness {
    let store = Arc::new(InMemoryRuleBundleStore::new());
    for (id, arn) in [
        ("b1", RULE_GROUP_X),
        ("b2", RULE_GROUP_X),
        ("b3", RULE_GROUP_Y),
    ] {
        store.insert_bundle(bundle(id, arn)).await;
    }
    for object in objects() {
        store.insert_object(object).await;
    }
    for rule in rules {
        store.insert_rule(rule).await;
    }

    let inventory = seeded_inventory();
    let publisher = Arc::new(InMemoryRuleGroupPublisher::new());
    let evaluator = Arc::new(RuleBundleEvaluator::new(
        store.clone(),
        RuleDefinitionResolver::new(object_resolver(inventory.clone())),
        publisher.clone(),
    ));

    Harness {
        store,
        inventory,
        publisher,
        evaluator,
    }
}

fn request(ids: &[&str]) -> EvaluationRequest {
    EvaluationRequest::new(ids.iter().map(|id| id.to_string()).collect())
}

/// User Story: Evaluate rule bundles for a rule group
///
/// As the scheduler
/// I want to hand a batch of bundle ids to the evaluation entry point
/// So that their rule group is recompiled and applied in one step
///
/// Acceptance Criteria:
/// - Bundles sharing a rule group are compiled with one continuing sid sequence
/// - Rule status and compiled text are persisted with a bumped version
/// - The response lists the evaluated ids with status 200, or 500 on failure
#[tokio::test]
async fn test_group_compiles_with_continuing_sids() {
    // Given two bundles in the same rule group
    let h = harness(vec![
        rule("b1-r1", "b1", "app", "onprem"),
        rule("b2-r1", "b2", "web", "vpc"),
    ])
    .await;

    // When both are evaluated together
    let response = h.evaluator.evaluate(request(&["b1", "b2"])).await;

    // Then the group is published once with sids continuing across bundles
    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.parse_body().unwrap().rule_bundle_ids,
        vec!["b1".to_string(), "b2".to_string()]
    );

    let published = h.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].rule_group_arn, RULE_GROUP_X);
    assert_eq!(
        published[0].rules_string,
        "pass tcp 10.0.2.10 any ->  192.168.0.0/16 123 (msg: \"b1-r1\"; sid: 1;)\n\
         pass tcp 10.0.2.11 any ->  192.168.0.0/16 123 (msg: \"b1-r1\"; sid: 2;)\n\
         pass tcp 10.0.1.10 any ->  10.0.0.0/16 123 (msg: \"b2-r1\"; sid: 3;)"
    );
}

#[tokio::test]
async fn test_rule_state_is_persisted() {
    let h = harness(vec![
        rule("b1-r1", "b1", "web", "onprem"),
        rule("b1-r2", "b1", "missing", "onprem"),
    ])
    .await;

    h.evaluator.evaluate(request(&["b1"])).await;

    let stored = h.store.rules_for_bundle("b1").await.unwrap();
    assert_eq!(stored[0].status, RuleStatus::Active);
    assert_eq!(stored[0].version, 1);
    assert_eq!(
        stored[0].suricata_string.as_deref(),
        Some("pass tcp 10.0.1.10 any ->  192.168.0.0/16 123 (msg: \"b1-r1\"; sid: 1;)")
    );
    assert_eq!(stored[1].status, RuleStatus::Failed);
    assert_eq!(stored[1].version, 1);
    assert_eq!(
        stored[1].failure_reasons,
        vec!["Can not resolve source object to address missing".to_string()]
    );
    assert_eq!(stored[1].suricata_string, None);
}

#[tokio::test]
async fn test_unresolvable_bundle_does_not_deny_its_siblings() {
    // Given one bundle with nothing resolvable next to a working one
    let h = harness(vec![
        rule("b1-r1", "b1", "missing", "onprem"),
        rule("b2-r1", "b2", "web", "onprem"),
    ])
    .await;

    // When the group is evaluated
    let response = h.evaluator.evaluate(request(&["b1", "b2"])).await;

    // Then only the working bundle's rules reach the rule group
    assert!(response.is_success());
    let update = h.publisher.latest(RULE_GROUP_X).unwrap();
    assert_eq!(
        update.rules_string,
        "pass tcp 10.0.1.10 any ->  192.168.0.0/16 123 (msg: \"b2-r1\"; sid: 2;)"
    );
}

#[tokio::test]
async fn test_group_without_rules_publishes_default_deny() {
    let h = harness(Vec::new()).await;

    let response = h.evaluator.evaluate(request(&["b3"])).await;

    assert!(response.is_success());
    assert_eq!(
        h.publisher.latest(RULE_GROUP_Y).unwrap().rules_string,
        "drop ip any any ->  any any (msg: \"default-deny-all\"; sid: 1;)"
    );
}

#[tokio::test]
async fn test_each_rule_group_is_published() {
    let h = harness(vec![
        rule("b1-r1", "b1", "web", "onprem"),
        rule("b3-r1", "b3", "subnet", "onprem"),
    ])
    .await;

    let response = h.evaluator.evaluate(request(&["b1", "b3"])).await;

    assert!(response.is_success());
    let arns: Vec<String> = h
        .publisher
        .published()
        .into_iter()
        .map(|update| update.rule_group_arn)
        .collect();
    assert_eq!(arns, vec![RULE_GROUP_X.to_string(), RULE_GROUP_Y.to_string()]);
    assert_eq!(
        h.publisher.latest(RULE_GROUP_Y).unwrap().rules_string,
        "pass tcp 10.0.1.0/24 any ->  192.168.0.0/16 123 (msg: \"b3-r1\"; sid: 1;)"
    );
}

#[tokio::test]
async fn test_missing_bundle_fails_request() {
    let h = harness(Vec::new()).await;

    let response = h.evaluator.evaluate(request(&["b1", "nope"])).await;

    assert_eq!(response.status_code, 500);
    let body = response.parse_body().unwrap();
    assert_eq!(body.rule_bundle_ids, vec!["b1".to_string(), "nope".to_string()]);
    assert!(body.message.contains("nope"));
    assert!(h.publisher.published().is_empty());
}

#[tokio::test]
async fn test_outage_leaves_stored_rules_untouched() {
    // Given the inventory is down
    let h = harness(vec![rule("b1-r1", "b1", "web", "onprem")]).await;
    h.inventory.set_outage(Some("timeout"));

    // When the bundle is evaluated
    let response = h.evaluator.evaluate(request(&["b1"])).await;

    // Then the request fails and nothing is written or published
    assert_eq!(response.status_code, 500);
    assert!(response.parse_body().unwrap().message.contains("timeout"));
    let stored = h.store.rules_for_bundle("b1").await.unwrap();
    assert_eq!(stored[0].status, RuleStatus::Pending);
    assert_eq!(stored[0].version, 0);
    assert!(h.publisher.published().is_empty());
}

#[tokio::test]
async fn test_local_invoker_returns_evaluator_response() {
    let h = harness(vec![rule("b1-r1", "b1", "web", "onprem")]).await;
    let invoker = LocalEvaluationInvoker::new(h.evaluator.clone());

    let response = invoker.invoke(request(&["b1"])).await.unwrap();

    assert!(response.is_success());
    assert_eq!(h.publisher.published().len(), 1);
}

#[test]
fn test_request_wire_format() {
    let request: EvaluationRequest =
        serde_json::from_str(r#"{"ruleBundleIds": ["g1", "g2"]}"#).unwrap();

    assert_eq!(request, EvaluationRequest::new(vec!["g1".into(), "g2".into()]));
}
