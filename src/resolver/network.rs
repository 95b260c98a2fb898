// Copyright (c) 2025 - Cowboy AI, Inc.
//! VPC and subnet resolver

use async_trait::async_trait;

use super::{unsupported, ObjectResolver, ResolverKind};
use crate::domain::{Arn, FlowObject, FlowObjectValue, FlowRuleBundle, ResolvedFlowObject};
use crate::errors::FlowResult;
use crate::inventory::{
    configuration_str, resource_types, InventoryQuery, InventorySource, QueryPredicate,
};

fn network_target(object: &FlowObject) -> Option<(Arn, &'static str)> {
    let FlowObjectValue::Arn(value) = &object.value else {
        return None;
    };
    let arn = Arn::parse(value)?;
    if arn.is("ec2", "vpc") {
        Some((arn, resource_types::VPC))
    } else if arn.is("ec2", "subnet") {
        Some((arn, resource_types::SUBNET))
    } else {
        None
    }
}

/// Resolves VPC and subnet ARNs to their CIDR blocks
#[derive(Clone)]
pub struct NetworkResolver {
    inventory: InventorySource,
}

impl NetworkResolver {
    pub fn new(inventory: InventorySource) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl ObjectResolver for NetworkResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Network
    }

    fn can_resolve(&self, object: &FlowObject) -> bool {
        network_target(object).is_some()
    }

    async fn resolve(
        &self,
        object: FlowObject,
        rule_bundle: Option<&FlowRuleBundle>,
    ) -> FlowResult<ResolvedFlowObject> {
        let Some((arn, resource_type)) = network_target(&object) else {
            return Err(unsupported(&object));
        };

        let query = InventoryQuery::select(["resourceId", "configuration.cidrBlock"])
            .resource_type(resource_type)
            .with(QueryPredicate::ResourceId(arn.resource_id().to_string()));
        let records = self.inventory.select(rule_bundle, &query).await?;

        let addresses: Vec<String> = records
            .iter()
            .filter_map(|record| configuration_str(record, "cidrBlock"))
            .map(str::to_string)
            .collect();

        if addresses.is_empty() {
            let reason = format!("No CIDR block found for {}", arn);
            return Ok(ResolvedFlowObject::unresolved(object, reason));
        }
        Ok(ResolvedFlowObject::resolved(object, addresses))
    }
}
