// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory rule bundle store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{Page, RuleBundleRepository};
use crate::domain::{FlowObject, FlowRule, FlowRuleBundle};
use crate::errors::{FlowError, FlowResult};

/// Serializable contents of a store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub rule_bundles: Vec<FlowRuleBundle>,
    #[serde(default)]
    pub rules: Vec<FlowRule>,
    #[serde(default)]
    pub objects: Vec<FlowObject>,
}

impl StoreSnapshot {
    fn upsert_rule(&mut self, rule: FlowRule) {
        match self.rules.iter_mut().find(|existing| existing.id == rule.id) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }
}

/// Store holding a [`StoreSnapshot`] in memory
///
/// Bundles are scanned in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryRuleBundleStore {
    state: RwLock<StoreSnapshot>,
}

impl InMemoryRuleBundleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.read().await.clone()
    }

    pub async fn insert_bundle(&self, bundle: FlowRuleBundle) {
        let mut state = self.state.write().await;
        match state.rule_bundles.iter_mut().find(|b| b.id == bundle.id) {
            Some(existing) => *existing = bundle,
            None => state.rule_bundles.push(bundle),
        }
    }

    pub async fn insert_rule(&self, rule: FlowRule) {
        self.state.write().await.upsert_rule(rule);
    }

    pub async fn insert_object(&self, object: FlowObject) {
        let mut state = self.state.write().await;
        match state.objects.iter_mut().find(|o| o.id == object.id) {
            Some(existing) => *existing = object,
            None => state.objects.push(object),
        }
    }
}

#[async_trait]
impl RuleBundleRepository for InMemoryRuleBundleStore {
    async fn scan_bundles(
        &self,
        page_token: Option<String>,
        limit: usize,
    ) -> FlowResult<Page<FlowRuleBundle>> {
        let start = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| FlowError::Storage(format!("Invalid page token: {}", token)))?,
            None => 0,
        };

        let state = self.state.read().await;
        let end = (start + limit.max(1)).min(state.rule_bundles.len());
        let items = state
            .rule_bundles
            .get(start..end)
            .map(<[FlowRuleBundle]>::to_vec)
            .unwrap_or_default();
        let next_token = (end < state.rule_bundles.len()).then(|| end.to_string());

        Ok(Page { items, next_token })
    }

    async fn get_bundle(&self, id: &str) -> FlowResult<Option<FlowRuleBundle>> {
        let state = self.state.read().await;
        Ok(state.rule_bundles.iter().find(|b| b.id == id).cloned())
    }

    async fn rules_for_bundle(&self, rule_bundle_id: &str) -> FlowResult<Vec<FlowRule>> {
        let state = self.state.read().await;
        let mut rules: Vec<FlowRule> = state
            .rules
            .iter()
            .filter(|rule| rule.rule_bundle_id == rule_bundle_id)
            .cloned()
            .collect();
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rules)
    }

    async fn get_objects(&self, ids: &[String]) -> FlowResult<Vec<FlowObject>> {
        let state = self.state.read().await;
        Ok(state
            .objects
            .iter()
            .filter(|object| ids.contains(&object.id))
            .cloned()
            .collect())
    }

    async fn put_rules(&self, rules: Vec<FlowRule>) -> FlowResult<()> {
        let mut state = self.state.write().await;
        for rule in rules {
            state.upsert_rule(rule);
        }
        Ok(())
    }

    async fn update_last_success_sync(
        &self,
        rule_bundle_id: &str,
        timestamp: DateTime<Utc>,
    ) -> FlowResult<()> {
        let mut state = self.state.write().await;
        let bundle = state
            .rule_bundles
            .iter_mut()
            .find(|b| b.id == rule_bundle_id)
            .ok_or_else(|| FlowError::NotFound(format!("rule bundle {}", rule_bundle_id)))?;
        bundle.last_success_sync_timestamp = Some(timestamp);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_bundles_follows_pages() {
        let store = InMemoryRuleBundleStore::new();
        for i in 0..(super::super::SCAN_PAGE_SIZE + 5) {
            store
                .insert_bundle(FlowRuleBundle::new(format!("b{}", i), "arn:rg", "org"))
                .await;
        }

        let first = store.scan_bundles(None, 3).await.unwrap();
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.next_token.as_deref(), Some("3"));

        let all = store.list_bundles().await.unwrap();
        assert_eq!(all.len(), super::super::SCAN_PAGE_SIZE + 5);
        assert_eq!(all[0].id, "b0");
    }

    #[tokio::test]
    async fn test_update_missing_bundle_is_not_found() {
        let store = InMemoryRuleBundleStore::new();
        let err = store
            .update_last_success_sync("missing", Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::NotFound(_)));
    }
}
