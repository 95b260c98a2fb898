// Copyright (c) 2025 - Cowboy AI, Inc.
//! Object Resolver Chain
//!
//! Translates abstract flow object references into concrete IPv4 addresses
//! and CIDR blocks.
//!
//! # Architecture
//!
//! ```text
//! FlowObject
//!     ↓
//! ObjectDefinitionResolver (first resolver whose can_resolve() holds)
//!     ↓
//! Address │ Ec2 │ Network │ Asg │ Tagged │ Lambda
//!     ↓
//! InventoryClient (aggregator queries)
//!     ↓
//! ResolvedFlowObject { addresses, failure_reasons }
//! ```
//!
//! # Failure Semantics
//!
//! - A *logical miss* (resource exists but has no network identity, or the
//!   stored value is malformed) yields empty `addresses` plus a reason.
//! - A *transport error* from the inventory propagates as `Err` so the caller
//!   can abort the batch.
//! - An object no resolver accepts is [`FlowError::NoResolverFound`].
//!
//! [`FlowError::NoResolverFound`]: crate::errors::FlowError::NoResolverFound

pub mod address;
pub mod asg;
pub mod definition;
pub mod ec2;
pub mod lambda;
pub mod network;
pub mod tagged;

pub use address::AddressResolver;
pub use asg::AsgResolver;
pub use definition::ObjectDefinitionResolver;
pub use ec2::Ec2Resolver;
pub use lambda::LambdaResolver;
pub use network::NetworkResolver;
pub use tagged::TaggedResolver;

use async_trait::async_trait;
use std::fmt;

use crate::domain::{FlowObject, FlowRuleBundle, ResolvedFlowObject};
use crate::errors::{FlowError, FlowResult};

/// Closed set of resolver variants, in dispatch priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverKind {
    Address,
    Ec2,
    Network,
    Asg,
    Tagged,
    Lambda,
}

impl ResolverKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ResolverKind::Address => "address",
            ResolverKind::Ec2 => "ec2",
            ResolverKind::Network => "network",
            ResolverKind::Asg => "asg",
            ResolverKind::Tagged => "tagged",
            ResolverKind::Lambda => "lambda",
        }
    }
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability-specific object resolver
#[async_trait]
pub trait ObjectResolver: Send + Sync {
    fn kind(&self) -> ResolverKind;

    /// Whether this resolver handles the object
    ///
    /// Inspects the object's type and value shape only; never performs I/O.
    fn can_resolve(&self, object: &FlowObject) -> bool;

    /// Resolve the object to zero or more addresses
    ///
    /// # Arguments
    ///
    /// * `object` - Object accepted by [`ObjectResolver::can_resolve`]
    /// * `rule_bundle` - Bundle being evaluated; selects the inventory aggregator
    ///
    /// # Errors
    ///
    /// Inventory transport failures. Logical misses are `Ok` with no addresses.
    async fn resolve(
        &self,
        object: FlowObject,
        rule_bundle: Option<&FlowRuleBundle>,
    ) -> FlowResult<ResolvedFlowObject>;
}

/// Error for an object handed to a resolver that does not accept it
pub(crate) fn unsupported(object: &FlowObject) -> FlowError {
    FlowError::NoResolverFound {
        object_id: object.id.clone(),
        object_type: object.object_type().to_string(),
    }
}
