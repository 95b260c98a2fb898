// Copyright (c) 2025 - Cowboy AI, Inc.
//! # Flow Rules
//!
//! Compiles network flow rules into Suricata rule text for firewall rule
//! groups and keeps those groups in sync on a schedule.
//!
//! ## Architecture
//!
//! ```text
//! FlowObject ──> ObjectDefinitionResolver ──> addresses
//!                        │ (Address, Ec2, Network, Asg, Tagged, Lambda)
//!                        ↓
//! FlowRule[] ──> RuleDefinitionResolver ──> CompiledRule[] (sid ordered)
//!                        ↓
//! RuleBundleEvaluator ──> RuleGroupPublisher
//!        ↑
//! Scheduler (group by ruleGroupArn, dispatch, reconcile)
//! ```
//!
//! ## Modules
//!
//! - [`domain`] - objects, rules, rule bundles and ARNs
//! - [`resolver`] - object to address resolution
//! - [`rules`] - rule resolution and Suricata compilation
//! - [`inventory`] - resource inventory queries
//! - [`store`] - rule bundle persistence
//! - [`evaluation`] - evaluation entry point, invokers and publishers
//! - [`scheduler`] - periodic batch evaluation
//! - [`nats`] - NATS messaging
//! - [`config`] - engine configuration

pub mod config;
pub mod domain;
pub mod errors;
pub mod evaluation;
pub mod inventory;
pub mod nats;
pub mod resolver;
pub mod rules;
pub mod scheduler;
pub mod store;

pub use config::FlowConfig;
pub use domain::{
    Arn, FlowObject, FlowObjectValue, FlowRule, FlowRuleBundle, FlowRuleOption, FlowRulePort,
    FlowTag, ObjectType, ResolvedFlowObject, RuleStatus,
};
pub use errors::{FlowError, FlowResult};
pub use evaluation::{
    serve_evaluations, EvaluationInvoker, EvaluationRequest, EvaluationResponse,
    RuleBundleEvaluator, RuleGroupPublisher,
};
pub use inventory::{InventoryClient, InventoryQuery, InventorySource};
pub use nats::{NatsClient, NatsConfig};
pub use resolver::{ObjectDefinitionResolver, ObjectResolver};
pub use rules::{CompiledRule, RuleDefinitionResolver, RuleResolution};
pub use scheduler::{CycleReport, Scheduler};
pub use store::{RuleBundleRepository, SCAN_PAGE_SIZE};
