// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Rule Compilation
//!
//! Rules between literal address objects are compiled with an address-only
//! resolver chain, so every property is checked without an inventory.

use flow_rules::domain::{FlowObject, FlowRule, FlowRuleBundle, FlowRulePort, RuleStatus};
use flow_rules::resolver::{AddressResolver, ObjectDefinitionResolver};
use flow_rules::rules::{compile_rule, RuleDefinitionResolver, SidSequence};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Strategies
// ============================================================================

fn ipv4() -> impl Strategy<Value = String> {
    (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>())
        .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d))
}

fn cidr() -> impl Strategy<Value = String> {
    (ipv4(), 0u8..=32).prop_map(|(ip, prefix)| format!("{}/{}", ip, prefix))
}

fn address() -> impl Strategy<Value = String> {
    prop_oneof![ipv4(), cidr()]
}

/// Reference to one of the pool objects, or to an id with no object
fn reference(pool: usize) -> impl Strategy<Value = String> {
    prop_oneof![
        4 => (0..pool).prop_map(|i| format!("obj-{}", i)),
        1 => Just("dangling".to_string()),
    ]
}

fn port() -> impl Strategy<Value = FlowRulePort> {
    prop_oneof![
        Just(FlowRulePort::Any),
        (1u16..=65535).prop_map(|p| FlowRulePort::single(p.to_string())),
    ]
}

prop_compose! {
    fn rule_set()(pool in prop::collection::vec(address(), 1..6))
        (rules in prop::collection::vec(
            (reference(pool.len()), reference(pool.len()), port(), port()),
            0..10,
        ), pool in Just(pool))
        -> (Vec<FlowObject>, Vec<FlowRule>)
    {
        let objects = pool
            .iter()
            .enumerate()
            .map(|(i, address)| FlowObject::address(format!("obj-{}", i), address.clone()))
            .collect();
        let rules = rules
            .into_iter()
            .enumerate()
            .map(|(i, (source, destination, source_port, destination_port))| FlowRule {
                id: format!("rule-{:02}", i),
                rule_bundle_id: "bundle".to_string(),
                action: "pass".to_string(),
                protocol: "tcp".to_string(),
                source,
                source_port,
                destination,
                destination_port,
                status: RuleStatus::Pending,
                failure_reasons: Vec::new(),
                option_fields: None,
                version: 0,
                suricata_string: None,
            })
            .collect();
        (objects, rules)
    }
}

fn resolver() -> RuleDefinitionResolver {
    RuleDefinitionResolver::new(ObjectDefinitionResolver::with_resolvers(vec![Arc::new(
        AddressResolver::new(),
    )]))
}

fn bundle() -> FlowRuleBundle {
    FlowRuleBundle::new("bundle", "arn:aws:network-firewall:::stateful-rulegroup/p", "org")
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// One line per address pair, with contiguous sids after the offset
    #[test]
    fn prop_compile_rule_covers_every_pair(
        sources in prop::collection::vec(address(), 1..5),
        destinations in prop::collection::vec(address(), 1..5),
        offset in 0u64..100_000,
    ) {
        let rule = FlowRule {
            id: "r".to_string(),
            rule_bundle_id: "bundle".to_string(),
            action: "drop".to_string(),
            protocol: "udp".to_string(),
            source: "s".to_string(),
            source_port: FlowRulePort::Any,
            destination: "d".to_string(),
            destination_port: FlowRulePort::Any,
            status: RuleStatus::Pending,
            failure_reasons: Vec::new(),
            option_fields: None,
            version: 0,
            suricata_string: None,
        };
        let mut sids = SidSequence::starting_after(offset);

        let compiled = compile_rule(&rule, &sources, &destinations, &mut sids);

        prop_assert_eq!(compiled.len(), sources.len() * destinations.len());
        for (i, line) in compiled.iter().enumerate() {
            prop_assert_eq!(line.sid, offset + 1 + i as u64);
            let source = &sources[i / destinations.len()];
            let destination = &destinations[i % destinations.len()];
            let expected_prefix = format!("drop udp {} any ->  {} any (", source, destination);
            prop_assert!(line.suricata_string.starts_with(&expected_prefix));
            prop_assert!(line.suricata_string.ends_with(";)"));
        }
        prop_assert_eq!(sids.last(), offset + compiled.len() as u64);
    }

    /// sids strictly increase from offset + 1 in rule input order
    #[test]
    fn prop_sids_increase_in_rule_order(
        (objects, rules) in rule_set(),
        offset in 0u64..10_000,
    ) {
        let resolution = tokio_test::block_on(
            resolver().resolve_rules(&bundle(), rules.clone(), &objects, offset),
        ).unwrap();

        prop_assert_eq!(resolution.rules.len(), rules.len());
        let sids: Vec<u64> = resolution.compiled.iter().map(|c| c.sid).collect();
        let expected: Vec<u64> = (1..=sids.len() as u64).map(|i| offset + i).collect();
        prop_assert_eq!(sids, expected);

        let mut last_rule_index = 0;
        for compiled in &resolution.compiled {
            if let Some(index) = rules.iter().position(|r| r.id == compiled.rule_id) {
                prop_assert!(index >= last_rule_index);
                last_rule_index = index;
            }
        }
    }

    /// A rule is active exactly when both references exist
    #[test]
    fn prop_dangling_references_fail(
        (objects, rules) in rule_set(),
    ) {
        let resolution = tokio_test::block_on(
            resolver().resolve_rules(&bundle(), rules.clone(), &objects, 0),
        ).unwrap();

        for rule in &resolution.rules {
            let dangling = rule.source == "dangling" || rule.destination == "dangling";
            prop_assert_eq!(rule.status == RuleStatus::Failed, dangling);
            prop_assert_eq!(rule.suricata_string.is_some(), !dangling);
        }
    }

    /// Nothing resolvable compiles to exactly one default deny rule
    #[test]
    fn prop_default_deny_when_nothing_resolves(
        (objects, rules) in rule_set(),
        offset in 0u64..10_000,
    ) {
        let resolution = tokio_test::block_on(
            resolver().resolve_rules(&bundle(), rules, &objects, offset),
        ).unwrap();

        if resolution.rules.iter().all(|r| r.status == RuleStatus::Failed) {
            prop_assert_eq!(resolution.compiled.len(), 1);
            prop_assert_eq!(resolution.compiled[0].rule_id.as_str(), "default-deny-all");
            prop_assert_eq!(resolution.compiled[0].sid, offset + 1);
        } else {
            prop_assert!(resolution
                .compiled
                .iter()
                .all(|c| c.rule_id != "default-deny-all"));
        }
    }

    /// Identical inputs compile to identical text
    #[test]
    fn prop_compilation_is_idempotent(
        (objects, rules) in rule_set(),
        offset in 0u64..10_000,
    ) {
        let first = tokio_test::block_on(
            resolver().resolve_rules(&bundle(), rules.clone(), &objects, offset),
        ).unwrap();
        let second = tokio_test::block_on(
            resolver().resolve_rules(&bundle(), rules, &objects, offset),
        ).unwrap();

        prop_assert_eq!(first.rules_string(), second.rules_string());
        prop_assert_eq!(first, second);
    }
}
