// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Inventory Interface
//!
//! The resolver chain discovers addresses by querying a resource-inventory
//! aggregator (an AWS Config style store of resource configuration items).
//!
//! # Query Model
//!
//! ```text
//! InventoryQuery ──to_expression()──> SELECT configuration.privateIpAddress
//!                                     WHERE resourceType = 'AWS::EC2::NetworkInterface'
//!                                     AND relationships.resourceId = 'i-0a1b2c'
//! ```
//!
//! Results are JSON records exposing `configuration.privateIpAddress`,
//! `configuration.cidrBlock` or `configuration.vpcConfig`. Result sets may
//! contain `null` entries; consumers skip them.
//!
//! # Implementations
//!
//! - [`InMemoryInventory`] - evaluates queries against records held in memory
//! - `HttpInventoryClient` - remote aggregator over HTTP (feature `http-inventory`)

pub mod memory;

#[cfg(feature = "http-inventory")]
pub mod http;

pub use memory::{InMemoryInventory, InventoryRecord};

#[cfg(feature = "http-inventory")]
pub use http::{HttpInventoryClient, InventoryConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::FlowRuleBundle;
use crate::errors::FlowResult;

/// Inventory resource type names
pub mod resource_types {
    pub const INSTANCE: &str = "AWS::EC2::Instance";
    pub const NETWORK_INTERFACE: &str = "AWS::EC2::NetworkInterface";
    pub const SECURITY_GROUP: &str = "AWS::EC2::SecurityGroup";
    pub const VPC: &str = "AWS::EC2::VPC";
    pub const SUBNET: &str = "AWS::EC2::Subnet";
    pub const AUTO_SCALING_GROUP: &str = "AWS::AutoScaling::AutoScalingGroup";
    pub const LAMBDA_FUNCTION: &str = "AWS::Lambda::Function";
}

/// Selection predicate of an inventory query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryPredicate {
    ResourceId(String),
    ResourceName(String),
    /// Resource has a relationship to any of the given resource ids
    Related(Vec<String>),
    Tag { key: String, value: String },
    /// `configuration.subnetId` is one of the given subnets
    SubnetIn(Vec<String>),
    InterfaceType(String),
}

impl QueryPredicate {
    fn to_expression(&self) -> String {
        match self {
            QueryPredicate::ResourceId(id) => format!("resourceId = {}", quote(id)),
            QueryPredicate::ResourceName(name) => format!("resourceName = {}", quote(name)),
            QueryPredicate::Related(ids) => membership("relationships.resourceId", ids),
            QueryPredicate::Tag { key, value } => {
                format!("tags.tag = {}", quote(&format!("{}={}", key, value)))
            }
            QueryPredicate::SubnetIn(ids) => membership("configuration.subnetId", ids),
            QueryPredicate::InterfaceType(kind) => {
                format!("configuration.interfaceType = {}", quote(kind))
            }
        }
    }
}

/// Structured inventory query; all predicates are combined with AND
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventoryQuery {
    pub fields: Vec<String>,
    pub resource_types: Vec<String>,
    pub predicates: Vec<QueryPredicate>,
}

impl InventoryQuery {
    pub fn select<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_types.push(resource_type.into());
        self
    }

    pub fn with(mut self, predicate: QueryPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Render the query as an inventory select expression
    pub fn to_expression(&self) -> String {
        let mut clauses = Vec::with_capacity(self.predicates.len() + 1);
        if !self.resource_types.is_empty() {
            clauses.push(membership("resourceType", &self.resource_types));
        }
        clauses.extend(self.predicates.iter().map(QueryPredicate::to_expression));

        let mut expression = format!("SELECT {}", self.fields.join(", "));
        if !clauses.is_empty() {
            expression.push_str(" WHERE ");
            expression.push_str(&clauses.join(" AND "));
        }
        expression
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn membership(field: &str, values: &[String]) -> String {
    match values {
        [single] => format!("{} = {}", field, quote(single)),
        _ => format!(
            "{} IN ({})",
            field,
            values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Resource inventory client
///
/// Transport failures are returned as errors; an empty result is not an error.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Run a query against the named aggregator
    ///
    /// # Returns
    ///
    /// Matching records in discovery order. Entries may be `null`.
    async fn select(
        &self,
        aggregator: &str,
        query: &InventoryQuery,
    ) -> FlowResult<Vec<serde_json::Value>>;
}

/// Inventory client bound to a fallback aggregator
///
/// Resolvers query the aggregator named by the rule bundle they resolve for,
/// falling back to `default_aggregator` when resolving outside a bundle.
#[derive(Clone)]
pub struct InventorySource {
    client: Arc<dyn InventoryClient>,
    default_aggregator: String,
}

impl InventorySource {
    pub fn new(client: Arc<dyn InventoryClient>, default_aggregator: impl Into<String>) -> Self {
        Self {
            client,
            default_aggregator: default_aggregator.into(),
        }
    }

    pub fn aggregator_for<'a>(&'a self, rule_bundle: Option<&'a FlowRuleBundle>) -> &'a str {
        rule_bundle
            .map(|bundle| bundle.aggregator_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.default_aggregator)
    }

    pub async fn select(
        &self,
        rule_bundle: Option<&FlowRuleBundle>,
        query: &InventoryQuery,
    ) -> FlowResult<Vec<serde_json::Value>> {
        let aggregator = self.aggregator_for(rule_bundle);
        tracing::debug!(aggregator, expression = %query.to_expression(), "querying inventory");
        self.client.select(aggregator, query).await
    }
}

/// String at `configuration.<field>` of an inventory record
pub fn configuration_str<'a>(record: &'a serde_json::Value, field: &str) -> Option<&'a str> {
    record.get("configuration")?.get(field)?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_interface_expression() {
        let query = InventoryQuery::select(["configuration.privateIpAddress"])
            .resource_type(resource_types::NETWORK_INTERFACE)
            .with(QueryPredicate::Related(vec!["i-123".to_string()]));

        assert_eq!(
            query.to_expression(),
            "SELECT configuration.privateIpAddress WHERE resourceType = 'AWS::EC2::NetworkInterface' \
             AND relationships.resourceId = 'i-123'"
        );
    }

    #[test]
    fn test_tag_expression_combines_with_and() {
        let query = InventoryQuery::select(["configuration.privateIpAddress", "configuration.cidrBlock"])
            .resource_type(resource_types::INSTANCE)
            .resource_type(resource_types::SUBNET)
            .with(QueryPredicate::Tag {
                key: "tier".to_string(),
                value: "web".to_string(),
            })
            .with(QueryPredicate::Tag {
                key: "owner".to_string(),
                value: "o'brien".to_string(),
            });

        assert_eq!(
            query.to_expression(),
            "SELECT configuration.privateIpAddress, configuration.cidrBlock \
             WHERE resourceType IN ('AWS::EC2::Instance', 'AWS::EC2::Subnet') \
             AND tags.tag = 'tier=web' AND tags.tag = 'owner=o''brien'"
        );
    }

    #[test]
    fn test_configuration_str_tolerates_missing_fields() {
        let record = serde_json::json!({"configuration": {"cidrBlock": "10.0.0.0/16"}});

        assert_eq!(configuration_str(&record, "cidrBlock"), Some("10.0.0.0/16"));
        assert_eq!(configuration_str(&record, "privateIpAddress"), None);
        assert_eq!(configuration_str(&serde_json::Value::Null, "cidrBlock"), None);
    }
}
