// Copyright (c) 2025 - Cowboy AI, Inc.
//! Autoscaling group resolver
//!
//! Two-step resolution: list the group's in-service instances, then resolve
//! each instance through its network interfaces the same way the EC2
//! resolver does. Addresses keep instance discovery order.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use super::ec2::network_interface_addresses;
use super::{unsupported, ObjectResolver, ResolverKind};
use crate::domain::{Arn, FlowObject, FlowObjectValue, FlowRuleBundle, ResolvedFlowObject};
use crate::errors::FlowResult;
use crate::inventory::{resource_types, InventoryQuery, InventorySource, QueryPredicate};

const IN_SERVICE: &str = "InService";
const DEFAULT_MAX_CONCURRENT_LOOKUPS: usize = 8;

fn asg_target(object: &FlowObject) -> Option<Arn> {
    match &object.value {
        FlowObjectValue::Arn(value) => {
            Arn::parse(value).filter(|arn| arn.is("autoscaling", "autoScalingGroup"))
        }
        _ => None,
    }
}

/// In-service instance ids listed by autoscaling group records
fn in_service_instances(records: &[serde_json::Value]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.get("configuration")?.get("instances")?.as_array())
        .flatten()
        .filter(|instance| {
            instance.get("lifecycleState").and_then(|s| s.as_str()) == Some(IN_SERVICE)
        })
        .filter_map(|instance| instance.get("instanceId")?.as_str())
        .map(str::to_string)
        .collect()
}

/// Resolves autoscaling group ARNs to the private IPs of in-service instances
#[derive(Clone)]
pub struct AsgResolver {
    inventory: InventorySource,
    max_concurrent_lookups: usize,
}

impl AsgResolver {
    pub fn new(inventory: InventorySource) -> Self {
        Self {
            inventory,
            max_concurrent_lookups: DEFAULT_MAX_CONCURRENT_LOOKUPS,
        }
    }

    /// Bound the per-instance interface lookups in flight at once
    pub fn with_max_concurrent_lookups(mut self, limit: usize) -> Self {
        self.max_concurrent_lookups = limit.max(1);
        self
    }
}

#[async_trait]
impl ObjectResolver for AsgResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Asg
    }

    fn can_resolve(&self, object: &FlowObject) -> bool {
        asg_target(object).is_some()
    }

    async fn resolve(
        &self,
        object: FlowObject,
        rule_bundle: Option<&FlowRuleBundle>,
    ) -> FlowResult<ResolvedFlowObject> {
        let Some(arn) = asg_target(&object) else {
            return Err(unsupported(&object));
        };

        let query = InventoryQuery::select(["resourceName", "configuration.instances"])
            .resource_type(resource_types::AUTO_SCALING_GROUP)
            .with(QueryPredicate::ResourceName(arn.resource_id().to_string()));
        let records = self.inventory.select(rule_bundle, &query).await?;

        let instance_ids = in_service_instances(&records);
        debug!(object_id = %object.id, instances = instance_ids.len(), "listed asg instances");
        if instance_ids.is_empty() {
            let reason = format!("No in-service instances found for {}", arn);
            return Ok(ResolvedFlowObject::unresolved(object, reason));
        }

        let lookups: Vec<_> = instance_ids
            .into_iter()
            .map(|instance_id| {
                network_interface_addresses(
                    &self.inventory,
                    rule_bundle,
                    vec![instance_id],
                    Vec::new(),
                )
            })
            .collect();
        let per_instance: Vec<Vec<String>> = stream::iter(lookups)
            .buffered(self.max_concurrent_lookups)
            .try_collect()
            .await?;

        let addresses: Vec<String> = per_instance.into_iter().flatten().collect();
        if addresses.is_empty() {
            let reason = format!("No network interfaces found for instances of {}", arn);
            return Ok(ResolvedFlowObject::unresolved(object, reason));
        }
        Ok(ResolvedFlowObject::resolved(object, addresses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_in_service_instances_listed() {
        let records = vec![
            serde_json::Value::Null,
            json!({"configuration": {"instances": [
                {"instanceId": "i-1", "lifecycleState": "InService"},
                {"instanceId": "i-2", "lifecycleState": "Terminating"},
                {"instanceId": "i-3", "lifecycleState": "InService"}
            ]}}),
        ];

        assert_eq!(in_service_instances(&records), vec!["i-1", "i-3"]);
    }
}
