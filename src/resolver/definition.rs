// Copyright (c) 2025 - Cowboy AI, Inc.
//! Object definition resolver
//!
//! Dispatches an object to the first resolver in a fixed priority order whose
//! `can_resolve` accepts it.

use std::sync::Arc;
use tracing::{debug, error};

use super::{
    AddressResolver, AsgResolver, Ec2Resolver, LambdaResolver, NetworkResolver, ObjectResolver,
    TaggedResolver,
};
use crate::domain::{FlowObject, FlowRuleBundle, ResolvedFlowObject};
use crate::errors::{FlowError, FlowResult};
use crate::inventory::InventorySource;

/// Ordered resolver chain
#[derive(Clone)]
pub struct ObjectDefinitionResolver {
    resolvers: Vec<Arc<dyn ObjectResolver>>,
}

impl ObjectDefinitionResolver {
    /// Standard chain: Address, Ec2, Network, Asg, Tagged, Lambda
    pub fn new(inventory: InventorySource) -> Self {
        Self::with_resolvers(vec![
            Arc::new(AddressResolver::new()),
            Arc::new(Ec2Resolver::new(inventory.clone())),
            Arc::new(NetworkResolver::new(inventory.clone())),
            Arc::new(AsgResolver::new(inventory.clone())),
            Arc::new(TaggedResolver::new(inventory.clone())),
            Arc::new(LambdaResolver::new(inventory)),
        ])
    }

    /// Chain with an explicit resolver order
    pub fn with_resolvers(resolvers: Vec<Arc<dyn ObjectResolver>>) -> Self {
        Self { resolvers }
    }

    /// First resolver accepting the object
    pub fn resolver_for(&self, object: &FlowObject) -> Option<&dyn ObjectResolver> {
        self.resolvers
            .iter()
            .find(|resolver| resolver.can_resolve(object))
            .map(|resolver| resolver.as_ref())
    }

    /// Resolve an object through the chain
    ///
    /// # Errors
    ///
    /// - [`FlowError::NoResolverFound`] when no resolver accepts the object
    /// - transport errors from the selected resolver, unchanged
    pub async fn resolve_target(
        &self,
        object: FlowObject,
        rule_bundle: Option<&FlowRuleBundle>,
    ) -> FlowResult<ResolvedFlowObject> {
        let Some(resolver) = self.resolver_for(&object) else {
            let object_type = object.object_type().to_string();
            error!(object_id = %object.id, %object_type, "no resolver found");
            return Err(FlowError::NoResolverFound {
                object_id: object.id,
                object_type,
            });
        };

        debug!(object_id = %object.id, resolver = %resolver.kind(), "resolving object");
        resolver.resolve(object, rule_bundle).await
    }
}
