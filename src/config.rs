// Copyright (c) 2025 - Cowboy AI, Inc.
//! Engine configuration
//!
//! Every field has a default, so a partial JSON document or an empty
//! environment yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{FlowError, FlowResult};
#[cfg(feature = "http-inventory")]
use crate::inventory::InventoryConfig;
use crate::nats::NatsConfig;
use crate::rules::DEFAULT_DENY_RULE_ID;

pub const DEFAULT_EVALUATION_SUBJECT: &str = "flow.rules.evaluate";
pub const DEFAULT_RULE_GROUP_SUBJECT_PREFIX: &str = "flow.rules.rulegroup";

/// Configuration for the scheduler and evaluator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub nats: NatsConfig,
    /// Subject evaluation requests are sent to
    pub evaluation_subject: String,
    /// Prefix of the subjects compiled rule groups are published on
    pub rule_group_subject_prefix: String,
    pub schedule_interval_secs: u64,
    pub max_concurrent_dispatches: usize,
    pub max_concurrent_resolutions: usize,
    /// Id carried by the synthetic deny-all rule
    pub default_deny_rule_id: String,
    /// JSON snapshot backing the rule bundle store
    pub store_path: PathBuf,
    #[cfg(feature = "http-inventory")]
    pub inventory: Option<InventoryConfig>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig::default(),
            evaluation_subject: DEFAULT_EVALUATION_SUBJECT.to_string(),
            rule_group_subject_prefix: DEFAULT_RULE_GROUP_SUBJECT_PREFIX.to_string(),
            schedule_interval_secs: 300,
            max_concurrent_dispatches: 8,
            max_concurrent_resolutions: 16,
            default_deny_rule_id: DEFAULT_DENY_RULE_ID.to_string(),
            store_path: PathBuf::from("flow-rules.json"),
            #[cfg(feature = "http-inventory")]
            inventory: None,
        }
    }
}

impl FlowConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> FlowResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> FlowResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("NATS_URL") {
            config.nats.servers = url.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(subject) = lookup("FLOW_EVALUATION_SUBJECT") {
            config.evaluation_subject = subject;
        }
        if let Some(secs) = lookup("FLOW_SCHEDULE_INTERVAL_SECS") {
            config.schedule_interval_secs = parse_number("FLOW_SCHEDULE_INTERVAL_SECS", &secs)?;
        }
        if let Some(limit) = lookup("FLOW_MAX_DISPATCHES") {
            config.max_concurrent_dispatches = parse_number("FLOW_MAX_DISPATCHES", &limit)?;
        }
        if let Some(limit) = lookup("FLOW_MAX_RESOLUTIONS") {
            config.max_concurrent_resolutions = parse_number("FLOW_MAX_RESOLUTIONS", &limit)?;
        }
        if let Some(path) = lookup("FLOW_STORE_PATH") {
            config.store_path = PathBuf::from(path);
        }

        #[cfg(feature = "http-inventory")]
        if let Some(base_url) = lookup("INVENTORY_URL") {
            config.inventory = Some(InventoryConfig {
                base_url,
                api_token: lookup("INVENTORY_API_TOKEN").ok_or_else(|| {
                    FlowError::Configuration("INVENTORY_API_TOKEN not set".to_string())
                })?,
                default_aggregator: lookup("INVENTORY_AGGREGATOR").unwrap_or_default(),
                timeout_secs: 30,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> FlowResult<()> {
        if self.schedule_interval_secs == 0 {
            return Err(FlowError::Configuration(
                "schedule interval must be positive".to_string(),
            ));
        }
        if self.max_concurrent_dispatches == 0 || self.max_concurrent_resolutions == 0 {
            return Err(FlowError::Configuration(
                "concurrency limits must be positive".to_string(),
            ));
        }
        if self.evaluation_subject.trim().is_empty()
            || self.rule_group_subject_prefix.trim().is_empty()
        {
            return Err(FlowError::Configuration(
                "NATS subjects must not be empty".to_string(),
            ));
        }
        if self.default_deny_rule_id.trim().is_empty() {
            return Err(FlowError::Configuration(
                "default deny rule id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_secs)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> FlowResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FlowError::Configuration(format!("{} is not a number: {}", key, value)))
}
