// Copyright (c) 2025 - Cowboy AI, Inc.
//! Flow Rule Domain Models
//!
//! Snapshots of the entities owned by the CRUD layer. The resolution engine
//! consumes them read-only and returns derived results for the caller to
//! persist or discard.
//!
//! - [`FlowObject`] - addressable endpoint reference (address, ARN, tags, function tag)
//! - [`FlowRule`] - pass/drop directive between two objects
//! - [`FlowRuleBundle`] - rules mapped to one external firewall rule group
//! - [`Arn`] - parsed Amazon Resource Name

pub mod arn;
pub mod bundle;
pub mod object;
pub mod rule;

pub use arn::Arn;
pub use bundle::FlowRuleBundle;
pub use object::{FlowObject, FlowObjectValue, FlowTag, ObjectType, ResolvedFlowObject};
pub use rule::{FlowRule, FlowRuleOption, FlowRulePort, RuleStatus};
