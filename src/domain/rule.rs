// Copyright (c) 2025 - Cowboy AI, Inc.
//! Flow Rules
//!
//! A flow rule is a pass/drop directive between a source and a destination
//! flow object, scoped to exactly one rule bundle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule evaluation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    #[default]
    Pending,
    Active,
    Failed,
}

/// Port selector of a flow rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FlowRulePort {
    Any,
    SinglePort { value: String },
}

impl FlowRulePort {
    pub fn single(value: impl Into<String>) -> Self {
        FlowRulePort::SinglePort {
            value: value.into(),
        }
    }
}

impl fmt::Display for FlowRulePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowRulePort::Any => f.write_str("any"),
            FlowRulePort::SinglePort { value } => f.write_str(value),
        }
    }
}

/// Rule option appended verbatim to the compiled rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowRuleOption {
    pub key: String,
    pub value: String,
}

impl FlowRuleOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Flow rule snapshot as stored by the CRUD layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRule {
    pub id: String,
    pub rule_bundle_id: String,
    pub action: String,
    pub protocol: String,
    /// Flow object id
    pub source: String,
    pub source_port: FlowRulePort,
    /// Flow object id
    pub destination: String,
    pub destination_port: FlowRulePort,
    #[serde(default)]
    pub status: RuleStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_fields: Option<Vec<FlowRuleOption>>,
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suricata_string: Option<String>,
}

impl FlowRule {
    /// Mark the rule failed, dropping any previously compiled text
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = RuleStatus::Failed;
        self.failure_reasons = vec![reason.into()];
        self.suricata_string = None;
    }

    /// Mark the rule active with its compiled text
    pub fn activate(&mut self, suricata_string: String) {
        self.status = RuleStatus::Active;
        self.failure_reasons.clear();
        self.suricata_string = Some(suricata_string);
    }

    pub fn option_fields(&self) -> &[FlowRuleOption] {
        self.option_fields.as_deref().unwrap_or_default()
    }
}
