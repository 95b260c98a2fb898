// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory resource inventory
//!
//! Evaluates [`InventoryQuery`] predicates against records held in memory.
//! Used by tests and single-process deployments that seed the inventory from
//! a snapshot. Supports injecting `null` entries and simulated outages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{InventoryClient, InventoryQuery, QueryPredicate};
use crate::domain::FlowTag;
use crate::errors::{FlowError, FlowResult};

/// A configuration item as held by the inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub resource_type: String,
    pub resource_id: String,
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<FlowTag>,
    /// Ids of related resources (`relationships.resourceId`)
    #[serde(default)]
    pub related: Vec<String>,
    #[serde(default)]
    pub configuration: serde_json::Value,
}

impl InventoryRecord {
    pub fn new(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        configuration: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            resource_name: None,
            tags: Vec::new(),
            related: Vec::new(),
            configuration,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }

    pub fn tagged(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(FlowTag::new(key, value));
        self
    }

    pub fn related_to(mut self, resource_id: impl Into<String>) -> Self {
        self.related.push(resource_id.into());
        self
    }

    fn matches(&self, query: &InventoryQuery) -> bool {
        if !query.resource_types.is_empty() && !query.resource_types.contains(&self.resource_type)
        {
            return false;
        }

        query.predicates.iter().all(|predicate| match predicate {
            QueryPredicate::ResourceId(id) => &self.resource_id == id,
            QueryPredicate::ResourceName(name) => self.resource_name.as_ref() == Some(name),
            QueryPredicate::Related(ids) => self.related.iter().any(|r| ids.contains(r)),
            QueryPredicate::Tag { key, value } => self
                .tags
                .iter()
                .any(|tag| &tag.key == key && &tag.value == value),
            QueryPredicate::SubnetIn(ids) => self
                .configuration
                .get("subnetId")
                .and_then(|v| v.as_str())
                .is_some_and(|subnet| ids.iter().any(|id| id == subnet)),
            QueryPredicate::InterfaceType(kind) => {
                self.configuration.get("interfaceType").and_then(|v| v.as_str())
                    == Some(kind.as_str())
            }
        })
    }

    fn to_result(&self) -> serde_json::Value {
        json!({
            "resourceType": self.resource_type,
            "resourceId": self.resource_id,
            "resourceName": self.resource_name,
            "configuration": self.configuration,
        })
    }
}

#[derive(Debug, Default)]
struct Aggregator {
    /// `None` entries model null rows returned by the remote store
    entries: Vec<Option<InventoryRecord>>,
}

/// In-memory inventory keyed by aggregator name
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    aggregators: RwLock<HashMap<String, Aggregator>>,
    outage: RwLock<Option<String>>,
    queries: RwLock<Vec<String>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, aggregator: &str, record: InventoryRecord) {
        self.write_aggregators()
            .entry(aggregator.to_string())
            .or_default()
            .entries
            .push(Some(record));
    }

    /// Add a `null` row returned with every result set of the aggregator
    pub fn insert_null(&self, aggregator: &str) {
        self.write_aggregators()
            .entry(aggregator.to_string())
            .or_default()
            .entries
            .push(None);
    }

    /// Fail every query with a transport error until cleared
    pub fn set_outage(&self, message: Option<&str>) {
        if let Ok(mut outage) = self.outage.write() {
            *outage = message.map(str::to_string);
        }
    }

    /// Expressions of every query received, in arrival order
    pub fn queries(&self) -> Vec<String> {
        self.queries.read().map(|q| q.clone()).unwrap_or_default()
    }

    fn write_aggregators(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Aggregator>> {
        self.aggregators
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl InventoryClient for InMemoryInventory {
    async fn select(
        &self,
        aggregator: &str,
        query: &InventoryQuery,
    ) -> FlowResult<Vec<serde_json::Value>> {
        if let Ok(mut queries) = self.queries.write() {
            queries.push(query.to_expression());
        }

        if let Some(message) = self.outage.read().ok().and_then(|o| o.clone()) {
            return Err(FlowError::Inventory(message));
        }

        let aggregators = self
            .aggregators
            .read()
            .map_err(|e| FlowError::Inventory(e.to_string()))?;
        let Some(store) = aggregators.get(aggregator) else {
            return Ok(Vec::new());
        };

        Ok(store
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Some(record) if record.matches(query) => Some(record.to_result()),
                Some(_) => None,
                None => Some(serde_json::Value::Null),
            })
            .collect())
    }
}
