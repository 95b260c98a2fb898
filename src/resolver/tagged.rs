// Copyright (c) 2025 - Cowboy AI, Inc.
//! Tag query resolver
//!
//! One inventory query combines every declared tag pair with AND, scoped to
//! instances, subnets and VPCs. Each match resolves to whichever of
//! `privateIpAddress` or `cidrBlock` it exposes.

use async_trait::async_trait;

use super::{unsupported, ObjectResolver, ResolverKind};
use crate::domain::{FlowObject, FlowObjectValue, FlowRuleBundle, FlowTag, ResolvedFlowObject};
use crate::errors::FlowResult;
use crate::inventory::{
    configuration_str, resource_types, InventoryQuery, InventorySource, QueryPredicate,
};

/// Build the tag query for the given tag pairs
pub fn tag_query(tags: &[FlowTag]) -> InventoryQuery {
    let query = InventoryQuery::select([
        "resourceId",
        "configuration.privateIpAddress",
        "configuration.cidrBlock",
    ])
    .resource_type(resource_types::INSTANCE)
    .resource_type(resource_types::SUBNET)
    .resource_type(resource_types::VPC);

    tags.iter().fold(query, |query, tag| {
        query.with(QueryPredicate::Tag {
            key: tag.key.clone(),
            value: tag.value.clone(),
        })
    })
}

/// Resolves `Tagged` objects
#[derive(Clone)]
pub struct TaggedResolver {
    inventory: InventorySource,
}

impl TaggedResolver {
    pub fn new(inventory: InventorySource) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl ObjectResolver for TaggedResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Tagged
    }

    fn can_resolve(&self, object: &FlowObject) -> bool {
        matches!(object.value, FlowObjectValue::Tagged(_))
    }

    async fn resolve(
        &self,
        object: FlowObject,
        rule_bundle: Option<&FlowRuleBundle>,
    ) -> FlowResult<ResolvedFlowObject> {
        let FlowObjectValue::Tagged(tags) = &object.value else {
            return Err(unsupported(&object));
        };
        // An empty conjunction would select every resource in the aggregator.
        if tags.is_empty() {
            return Ok(ResolvedFlowObject::unresolved(object, "No tags declared"));
        }

        let records = self.inventory.select(rule_bundle, &tag_query(tags)).await?;
        let addresses: Vec<String> = records
            .iter()
            .filter_map(|record| {
                configuration_str(record, "privateIpAddress")
                    .or_else(|| configuration_str(record, "cidrBlock"))
            })
            .map(str::to_string)
            .collect();

        if addresses.is_empty() {
            let reason = format!("No resources found for tags of {}", object.id);
            return Ok(ResolvedFlowObject::unresolved(object, reason));
        }
        Ok(ResolvedFlowObject::resolved(object, addresses))
    }
}
