// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for flow-rules
//!
//! Provides a deterministic inventory, rule bundles and rules shared by the
//! integration tests. All ids and timestamps are fixed constants.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

use flow_rules::domain::{
    FlowObject, FlowRule, FlowRuleBundle, FlowRuleOption, FlowRulePort, FlowTag, RuleStatus,
};
use flow_rules::inventory::{resource_types, InMemoryInventory, InventoryRecord, InventorySource};
use flow_rules::resolver::ObjectDefinitionResolver;

pub const AGGREGATOR: &str = "org-aggregator";

pub const RULE_GROUP_X: &str =
    "arn:aws:network-firewall:ap-southeast-2:123456789012:stateful-rulegroup/group-x";
pub const RULE_GROUP_Y: &str =
    "arn:aws:network-firewall:ap-southeast-2:123456789012:stateful-rulegroup/group-y";

pub const INSTANCE_ARN: &str = "arn:aws:ec2:ap-southeast-2:123456789012:instance/i-web";
pub const SECURITY_GROUP_ARN: &str =
    "arn:aws:ec2:ap-southeast-2:123456789012:security-group/sg-app";
pub const VPC_ARN: &str = "arn:aws:ec2:ap-southeast-2:123456789012:vpc/vpc-main";
pub const SUBNET_ARN: &str = "arn:aws:ec2:ap-southeast-2:123456789012:subnet/subnet-a";
pub const ASG_ARN: &str = "arn:aws:autoscaling:ap-southeast-2:123456789012:autoScalingGroup:6d3c:autoScalingGroupName/web-asg";
pub const MISSING_INSTANCE_ARN: &str =
    "arn:aws:ec2:ap-southeast-2:123456789012:instance/i-missing";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

fn eni(id: &str, ip: &str, owner: &str) -> InventoryRecord {
    InventoryRecord::new(
        resource_types::NETWORK_INTERFACE,
        id,
        json!({ "privateIpAddress": ip }),
    )
    .related_to(owner)
}

/// Inventory with one resource of every kind the resolver chain understands
///
/// | Object              | Addresses                   |
/// |---------------------|-----------------------------|
/// | instance i-web      | 10.0.1.10                   |
/// | security group      | 10.0.2.10, 10.0.2.11        |
/// | vpc-main            | 10.0.0.0/16                 |
/// | subnet-a            | 10.0.1.0/24                 |
/// | web-asg             | 10.0.5.1 (i-a only)         |
/// | tag env=prod        | 10.0.4.4, 10.0.6.0/24       |
/// | lambda app=billing  | 10.0.3.5                    |
pub fn seeded_inventory() -> Arc<InMemoryInventory> {
    let inventory = InMemoryInventory::new();

    inventory.insert(AGGREGATOR, eni("eni-web", "10.0.1.10", "i-web"));
    inventory.insert(AGGREGATOR, eni("eni-app-1", "10.0.2.10", "sg-app"));
    inventory.insert(AGGREGATOR, eni("eni-app-2", "10.0.2.11", "sg-app"));

    inventory.insert(
        AGGREGATOR,
        InventoryRecord::new(
            resource_types::VPC,
            "vpc-main",
            json!({ "cidrBlock": "10.0.0.0/16" }),
        ),
    );
    inventory.insert(
        AGGREGATOR,
        InventoryRecord::new(
            resource_types::SUBNET,
            "subnet-a",
            json!({ "cidrBlock": "10.0.1.0/24" }),
        ),
    );

    inventory.insert(
        AGGREGATOR,
        InventoryRecord::new(
            resource_types::AUTO_SCALING_GROUP,
            "6d3c",
            json!({ "instances": [
                { "instanceId": "i-a", "lifecycleState": "InService" },
                { "instanceId": "i-b", "lifecycleState": "Terminating" }
            ]}),
        )
        .named("web-asg"),
    );
    inventory.insert(AGGREGATOR, eni("eni-a", "10.0.5.1", "i-a"));
    inventory.insert(AGGREGATOR, eni("eni-b", "10.0.5.2", "i-b"));

    inventory.insert(
        AGGREGATOR,
        InventoryRecord::new(
            resource_types::INSTANCE,
            "i-tagged",
            json!({ "privateIpAddress": "10.0.4.4" }),
        )
        .tagged("env", "prod"),
    );
    inventory.insert(
        AGGREGATOR,
        InventoryRecord::new(
            resource_types::SUBNET,
            "subnet-prod",
            json!({ "cidrBlock": "10.0.6.0/24" }),
        )
        .tagged("env", "prod"),
    );

    inventory.insert(
        AGGREGATOR,
        InventoryRecord::new(
            resource_types::LAMBDA_FUNCTION,
            "billing-fn",
            json!({ "vpcConfig": {
                "securityGroupIds": ["sg-lambda"],
                "subnetIds": ["subnet-a"]
            }}),
        )
        .tagged("app", "billing"),
    );
    inventory.insert(
        AGGREGATOR,
        InventoryRecord::new(
            resource_types::NETWORK_INTERFACE,
            "eni-lambda",
            json!({
                "privateIpAddress": "10.0.3.5",
                "subnetId": "subnet-a",
                "interfaceType": "lambda"
            }),
        )
        .related_to("sg-lambda"),
    );

    Arc::new(inventory)
}

pub fn inventory_source(inventory: Arc<InMemoryInventory>) -> InventorySource {
    InventorySource::new(inventory, AGGREGATOR)
}

pub fn object_resolver(inventory: Arc<InMemoryInventory>) -> ObjectDefinitionResolver {
    ObjectDefinitionResolver::new(inventory_source(inventory))
}

pub fn bundle(id: &str, rule_group_arn: &str) -> FlowRuleBundle {
    FlowRuleBundle::new(id, rule_group_arn, AGGREGATOR)
}

/// `pass tcp` rule from `source` any port to `destination` port 123
pub fn rule(id: &str, rule_bundle_id: &str, source: &str, destination: &str) -> FlowRule {
    FlowRule {
        id: id.to_string(),
        rule_bundle_id: rule_bundle_id.to_string(),
        action: "pass".to_string(),
        protocol: "tcp".to_string(),
        source: source.to_string(),
        source_port: FlowRulePort::Any,
        destination: destination.to_string(),
        destination_port: FlowRulePort::single("123"),
        status: RuleStatus::Pending,
        failure_reasons: Vec::new(),
        option_fields: None,
        version: 0,
        suricata_string: None,
    }
}

pub fn rule_with_options(
    id: &str,
    rule_bundle_id: &str,
    source: &str,
    destination: &str,
    options: &[(&str, &str)],
) -> FlowRule {
    FlowRule {
        option_fields: Some(
            options
                .iter()
                .map(|(key, value)| FlowRuleOption::new(*key, *value))
                .collect(),
        ),
        ..rule(id, rule_bundle_id, source, destination)
    }
}

/// One object per resolver kind plus an unresolvable instance
pub fn objects() -> Vec<FlowObject> {
    vec![
        FlowObject::address("any-host", "0.0.0.0"),
        FlowObject::address("onprem", "192.168.0.0/16"),
        FlowObject::arn("web", INSTANCE_ARN),
        FlowObject::arn("app", SECURITY_GROUP_ARN),
        FlowObject::arn("vpc", VPC_ARN),
        FlowObject::arn("subnet", SUBNET_ARN),
        FlowObject::arn("asg", ASG_ARN),
        FlowObject::arn("missing", MISSING_INSTANCE_ARN),
        FlowObject::tagged("prod", vec![FlowTag::new("env", "prod")]),
        FlowObject::lambda("billing", json!({ "key": "app", "value": "billing" })),
    ]
}
