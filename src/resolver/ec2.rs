// Copyright (c) 2025 - Cowboy AI, Inc.
//! EC2 instance and security group resolver
//!
//! Both resource kinds resolve through the network interfaces attached to
//! them: the primary private IP of every matching interface, in discovery
//! order.

use async_trait::async_trait;
use tracing::debug;

use super::{unsupported, ObjectResolver, ResolverKind};
use crate::domain::{Arn, FlowObject, FlowObjectValue, FlowRuleBundle, ResolvedFlowObject};
use crate::errors::FlowResult;
use crate::inventory::{
    configuration_str, resource_types, InventoryQuery, InventorySource, QueryPredicate,
};

const PRIVATE_IP_FIELD: &str = "privateIpAddress";

/// Private IPs of network interfaces related to the given resource ids
///
/// Additional predicates narrow the interface set (e.g. subnet or interface
/// type). Null and address-less records are skipped.
pub(crate) async fn network_interface_addresses(
    inventory: &InventorySource,
    rule_bundle: Option<&FlowRuleBundle>,
    related_ids: Vec<String>,
    extra: Vec<QueryPredicate>,
) -> FlowResult<Vec<String>> {
    let mut query = InventoryQuery::select(["resourceId", "configuration.privateIpAddress"])
        .resource_type(resource_types::NETWORK_INTERFACE)
        .with(QueryPredicate::Related(related_ids));
    for predicate in extra {
        query = query.with(predicate);
    }

    let records = inventory.select(rule_bundle, &query).await?;
    Ok(records
        .iter()
        .filter_map(|record| configuration_str(record, PRIVATE_IP_FIELD))
        .map(str::to_string)
        .collect())
}

fn ec2_target(object: &FlowObject) -> Option<Arn> {
    match &object.value {
        FlowObjectValue::Arn(value) => Arn::parse(value)
            .filter(|arn| arn.is("ec2", "instance") || arn.is("ec2", "security-group")),
        _ => None,
    }
}

/// Resolves EC2 instance and security group ARNs
#[derive(Clone)]
pub struct Ec2Resolver {
    inventory: InventorySource,
}

impl Ec2Resolver {
    pub fn new(inventory: InventorySource) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl ObjectResolver for Ec2Resolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Ec2
    }

    fn can_resolve(&self, object: &FlowObject) -> bool {
        ec2_target(object).is_some()
    }

    async fn resolve(
        &self,
        object: FlowObject,
        rule_bundle: Option<&FlowRuleBundle>,
    ) -> FlowResult<ResolvedFlowObject> {
        let Some(arn) = ec2_target(&object) else {
            return Err(unsupported(&object));
        };

        let addresses = network_interface_addresses(
            &self.inventory,
            rule_bundle,
            vec![arn.resource_id().to_string()],
            Vec::new(),
        )
        .await?;

        debug!(object_id = %object.id, count = addresses.len(), "resolved ec2 object");
        if addresses.is_empty() {
            let reason = format!("No network interfaces found for {}", arn);
            return Ok(ResolvedFlowObject::unresolved(object, reason));
        }
        Ok(ResolvedFlowObject::resolved(object, addresses))
    }
}
