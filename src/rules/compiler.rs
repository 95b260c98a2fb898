// Copyright (c) 2025 - Cowboy AI, Inc.
//! Suricata rule text rendering
//!
//! Wire format consumed by the firewall engine:
//!
//! ```text
//! {action} {protocol} {src} {srcPort} ->  {dst} {dstPort} (msg: "{ruleId}"; sid: {n};[ {key}: {value};]*)
//! ```
//!
//! Two spaces follow the arrow; existing rule groups depend on that exact
//! spacing.

use serde::{Deserialize, Serialize};

use crate::domain::{FlowRule, FlowRuleOption, FlowRulePort};

/// Identifier of the synthetic rule emitted when a bundle has no resolvable rule
pub const DEFAULT_DENY_RULE_ID: &str = "default-deny-all";

/// One compiled rule line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRule {
    pub rule_id: String,
    pub sid: u64,
    pub suricata_string: String,
}

/// Monotonic sid allocator; the first sid handed out is `offset + 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidSequence {
    last: u64,
}

impl SidSequence {
    pub fn starting_after(offset: u64) -> Self {
        Self { last: offset }
    }

    pub fn next_sid(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    pub fn last(&self) -> u64 {
        self.last
    }
}

/// Fields of one rendered line
pub struct RuleLine<'a> {
    pub action: &'a str,
    pub protocol: &'a str,
    pub source: &'a str,
    pub source_port: &'a FlowRulePort,
    pub destination: &'a str,
    pub destination_port: &'a FlowRulePort,
    pub message: &'a str,
    pub sid: u64,
    pub options: &'a [FlowRuleOption],
}

impl RuleLine<'_> {
    pub fn render(&self) -> String {
        let options: String = self
            .options
            .iter()
            .map(|option| format!(" {}: {};", option.key, option.value))
            .collect();

        format!(
            "{} {} {} {} ->  {} {} (msg: \"{}\"; sid: {};{})",
            self.action,
            self.protocol,
            self.source,
            self.source_port,
            self.destination,
            self.destination_port,
            self.message,
            self.sid,
            options
        )
    }
}

/// Compile a rule into one line per (source, destination) address pair
///
/// Lines follow source order then destination order; each takes the next sid.
pub fn compile_rule(
    rule: &FlowRule,
    sources: &[String],
    destinations: &[String],
    sids: &mut SidSequence,
) -> Vec<CompiledRule> {
    let mut compiled = Vec::with_capacity(sources.len() * destinations.len());
    for source in sources {
        for destination in destinations {
            let sid = sids.next_sid();
            let line = RuleLine {
                action: &rule.action,
                protocol: &rule.protocol,
                source,
                source_port: &rule.source_port,
                destination,
                destination_port: &rule.destination_port,
                message: &rule.id,
                sid,
                options: rule.option_fields(),
            };
            compiled.push(CompiledRule {
                rule_id: rule.id.clone(),
                sid,
                suricata_string: line.render(),
            });
        }
    }
    compiled
}

/// Synthetic rule dropping all traffic
pub fn default_deny_rule(rule_id: &str, sid: u64) -> CompiledRule {
    let line = RuleLine {
        action: "drop",
        protocol: "ip",
        source: "any",
        source_port: &FlowRulePort::Any,
        destination: "any",
        destination_port: &FlowRulePort::Any,
        message: rule_id,
        sid,
        options: &[],
    };
    CompiledRule {
        rule_id: rule_id.to_string(),
        sid,
        suricata_string: line.render(),
    }
}
