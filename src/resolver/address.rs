// Copyright (c) 2025 - Cowboy AI, Inc.
//! Literal address resolver

use async_trait::async_trait;
use ipnetwork::Ipv4Network;

use super::{unsupported, ObjectResolver, ResolverKind};
use crate::domain::{FlowObject, FlowObjectValue, FlowRuleBundle, ResolvedFlowObject};
use crate::errors::FlowResult;

/// Resolves `Address` objects holding an IPv4 address or CIDR block to themselves
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressResolver;

impl AddressResolver {
    pub fn new() -> Self {
        Self
    }
}

/// Whether the value is a dotted-quad IPv4 address or IPv4 CIDR block
pub fn is_ipv4_or_cidr(value: &str) -> bool {
    let address = value.split_once('/').map_or(value, |(address, _)| address);
    address.split('.').count() == 4 && value.parse::<Ipv4Network>().is_ok()
}

#[async_trait]
impl ObjectResolver for AddressResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Address
    }

    fn can_resolve(&self, object: &FlowObject) -> bool {
        matches!(&object.value, FlowObjectValue::Address(value) if is_ipv4_or_cidr(value))
    }

    async fn resolve(
        &self,
        object: FlowObject,
        _rule_bundle: Option<&FlowRuleBundle>,
    ) -> FlowResult<ResolvedFlowObject> {
        match &object.value {
            FlowObjectValue::Address(value) if is_ipv4_or_cidr(value) => {
                let addresses = vec![value.clone()];
                Ok(ResolvedFlowObject::resolved(object, addresses))
            }
            _ => Err(unsupported(&object)),
        }
    }
}
