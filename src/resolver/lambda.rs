// Copyright (c) 2025 - Cowboy AI, Inc.
//! Serverless function resolver
//!
//! A `Lambda` object selects functions by a single `{key, value}` tag. The
//! functions' VPC configuration (security groups and subnets) identifies the
//! function network interfaces, whose private IPs are the resolved addresses.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ec2::network_interface_addresses;
use super::{unsupported, ObjectResolver, ResolverKind};
use crate::domain::{FlowObject, FlowObjectValue, FlowRuleBundle, FlowTag, ResolvedFlowObject};
use crate::errors::FlowResult;
use crate::inventory::{resource_types, InventoryQuery, InventorySource, QueryPredicate};

pub const INVALID_TAG_VALUE: &str = "Invalid tag value";

const LAMBDA_INTERFACE_TYPE: &str = "lambda";

/// Security groups and subnets collected from function configurations
#[derive(Debug, Default, PartialEq, Eq)]
struct VpcAttachment {
    security_group_ids: Vec<String>,
    subnet_ids: Vec<String>,
}

impl VpcAttachment {
    fn is_empty(&self) -> bool {
        self.security_group_ids.is_empty() || self.subnet_ids.is_empty()
    }

    fn absorb(&mut self, record: &serde_json::Value) {
        let Some(vpc_config) = record
            .get("configuration")
            .and_then(|c| c.get("vpcConfig"))
        else {
            if !record.is_null() {
                warn!("Skipping function record without vpcConfig");
            }
            return;
        };

        for (field, target) in [
            ("securityGroupIds", &mut self.security_group_ids),
            ("subnetIds", &mut self.subnet_ids),
        ] {
            let ids = vpc_config
                .get(field)
                .and_then(|v| v.as_array())
                .into_iter()
                .flatten()
                .filter_map(|id| id.as_str());
            for id in ids {
                if !target.iter().any(|existing| existing == id) {
                    target.push(id.to_string());
                }
            }
        }
    }
}

/// Resolves `Lambda` objects
#[derive(Clone)]
pub struct LambdaResolver {
    inventory: InventorySource,
}

impl LambdaResolver {
    pub fn new(inventory: InventorySource) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl ObjectResolver for LambdaResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Lambda
    }

    fn can_resolve(&self, object: &FlowObject) -> bool {
        matches!(object.value, FlowObjectValue::Lambda(_))
    }

    async fn resolve(
        &self,
        object: FlowObject,
        rule_bundle: Option<&FlowRuleBundle>,
    ) -> FlowResult<ResolvedFlowObject> {
        let FlowObjectValue::Lambda(raw) = &object.value else {
            return Err(unsupported(&object));
        };
        let tag = match serde_json::from_value::<FlowTag>(raw.clone()) {
            Ok(tag) => tag,
            Err(e) => {
                debug!(object_id = %object.id, error = %e, "malformed function tag");
                return Ok(ResolvedFlowObject::unresolved(object, INVALID_TAG_VALUE));
            }
        };

        let query = InventoryQuery::select(["resourceId", "configuration.vpcConfig"])
            .resource_type(resource_types::LAMBDA_FUNCTION)
            .with(QueryPredicate::Tag {
                key: tag.key.clone(),
                value: tag.value.clone(),
            });
        let records = self.inventory.select(rule_bundle, &query).await?;

        let mut attachment = VpcAttachment::default();
        for record in &records {
            attachment.absorb(record);
        }
        if attachment.is_empty() {
            let reason = format!(
                "No VPC attached function found for tag {}={}",
                tag.key, tag.value
            );
            return Ok(ResolvedFlowObject::unresolved(object, reason));
        }

        let addresses = network_interface_addresses(
            &self.inventory,
            rule_bundle,
            attachment.security_group_ids,
            vec![
                QueryPredicate::SubnetIn(attachment.subnet_ids),
                QueryPredicate::InterfaceType(LAMBDA_INTERFACE_TYPE.to_string()),
            ],
        )
        .await?;

        if addresses.is_empty() {
            let reason = format!(
                "No network interfaces found for functions tagged {}={}",
                tag.key, tag.value
            );
            return Ok(ResolvedFlowObject::unresolved(object, reason));
        }
        Ok(ResolvedFlowObject::resolved(object, addresses))
    }
}
