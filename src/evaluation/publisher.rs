// Copyright (c) 2025 - Cowboy AI, Inc.
//! Rule group publication
//!
//! Hands compiled rule text to whatever applies it to the external firewall
//! rule group.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::info;

use crate::errors::{FlowError, FlowResult};
use crate::nats::NatsClient;

/// Compiled rules for one firewall rule group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleGroupUpdate {
    pub rule_group_arn: String,
    pub rules_string: String,
    pub rule_bundle_ids: Vec<String>,
}

/// Destination of compiled rule groups
#[async_trait]
pub trait RuleGroupPublisher: Send + Sync {
    async fn publish(&self, update: RuleGroupUpdate) -> FlowResult<()>;
}

/// Publisher keeping every update in memory
#[derive(Debug, Default)]
pub struct InMemoryRuleGroupPublisher {
    published: Mutex<Vec<RuleGroupUpdate>>,
}

impl InMemoryRuleGroupPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<RuleGroupUpdate> {
        self.published
            .lock()
            .map(|published| published.clone())
            .unwrap_or_default()
    }

    /// Most recent update for a rule group
    pub fn latest(&self, rule_group_arn: &str) -> Option<RuleGroupUpdate> {
        self.published()
            .into_iter()
            .rev()
            .find(|update| update.rule_group_arn == rule_group_arn)
    }
}

#[async_trait]
impl RuleGroupPublisher for InMemoryRuleGroupPublisher {
    async fn publish(&self, update: RuleGroupUpdate) -> FlowResult<()> {
        self.published
            .lock()
            .map_err(|e| FlowError::Publish(e.to_string()))?
            .push(update);
        Ok(())
    }
}

/// Publisher emitting updates on `{prefix}.{rule group token}`
#[derive(Clone)]
pub struct NatsRuleGroupPublisher {
    client: NatsClient,
    subject_prefix: String,
}

impl NatsRuleGroupPublisher {
    pub fn new(client: NatsClient, subject_prefix: impl Into<String>) -> Self {
        Self {
            client,
            subject_prefix: subject_prefix.into(),
        }
    }

    pub fn subject_for(&self, rule_group_arn: &str) -> String {
        format!("{}.{}", self.subject_prefix, subject_token(rule_group_arn))
    }
}

/// Single NATS subject token derived from an ARN
pub fn subject_token(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl RuleGroupPublisher for NatsRuleGroupPublisher {
    async fn publish(&self, update: RuleGroupUpdate) -> FlowResult<()> {
        let subject = self.subject_for(&update.rule_group_arn);
        self.client
            .publish(&subject, &update)
            .await
            .map_err(|e| FlowError::Publish(e.to_string()))?;

        info!(rule_group_arn = %update.rule_group_arn, %subject, "published rule group");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_token_replaces_separators() {
        assert_eq!(
            subject_token("arn:aws:network-firewall:ap-southeast-2:1:stateful-rulegroup/rg.1"),
            "arn_aws_network-firewall_ap-southeast-2_1_stateful-rulegroup_rg_1"
        );
    }
}
