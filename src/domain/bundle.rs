// Copyright (c) 2025 - Cowboy AI, Inc.
//! Flow Rule Bundles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named collection of rules bound 1:1 to an external firewall rule group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRuleBundle {
    pub id: String,
    pub description: Option<String>,
    pub rule_group_arn: String,
    /// Resource-inventory aggregator queried when resolving this bundle's objects
    pub aggregator_name: String,
    #[serde(default)]
    pub owner_group: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success_sync_timestamp: Option<DateTime<Utc>>,
}

impl FlowRuleBundle {
    pub fn new(
        id: impl Into<String>,
        rule_group_arn: impl Into<String>,
        aggregator_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: None,
            rule_group_arn: rule_group_arn.into(),
            aggregator_name: aggregator_name.into(),
            owner_group: Vec::new(),
            last_success_sync_timestamp: None,
        }
    }
}
