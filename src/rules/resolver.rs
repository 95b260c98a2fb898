// Copyright (c) 2025 - Cowboy AI, Inc.
//! Rule Definition Resolver
//!
//! Resolves the source and destination objects of every rule in a bundle and
//! compiles the resolvable rules into Suricata text.
//!
//! # Algorithm
//!
//! ```text
//! rules ──(bounded, order-preserving fan-out)──> per-rule outcome
//!   missing object reference   → FAILED
//!   source has no address      → FAILED
//!   destination has no address → FAILED
//!   otherwise                  → address pairs
//! outcomes ──(input order)──> sid assignment → compiled lines
//! no compiled line           → default deny rule
//! ```
//!
//! A transport error on any rule aborts the whole batch: addresses resolved
//! in the same pass are not trusted once the inventory has failed.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use tracing::{info, warn};

use super::compiler::{
    compile_rule, default_deny_rule, CompiledRule, SidSequence, DEFAULT_DENY_RULE_ID,
};
use crate::domain::{FlowObject, FlowRule, FlowRuleBundle, RuleStatus};
use crate::errors::{FlowError, FlowResult};
use crate::resolver::ObjectDefinitionResolver;

pub const UNRESOLVED_REFERENCE_REASON: &str =
    "Unable to resolve reference object of source and/or destination";

const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Per-rule result of object resolution
enum RuleOutcome {
    Failed(FlowRule),
    Resolved {
        rule: FlowRule,
        sources: Vec<String>,
        destinations: Vec<String>,
    },
}

/// Result of resolving one rule bundle
#[derive(Debug, Clone, PartialEq)]
pub struct RuleResolution {
    /// Every input rule, in input order, with status and failure reasons updated
    pub rules: Vec<FlowRule>,
    /// Compiled lines in sid order; never empty
    pub compiled: Vec<CompiledRule>,
}

impl RuleResolution {
    /// Highest sid handed out
    pub fn last_sid(&self) -> u64 {
        self.compiled.iter().map(|c| c.sid).max().unwrap_or_default()
    }

    pub fn failed_rules(&self) -> impl Iterator<Item = &FlowRule> {
        self.rules
            .iter()
            .filter(|rule| rule.status == RuleStatus::Failed)
    }

    /// Whether the compiled set is only the synthetic default deny rule
    pub fn is_default_deny(&self) -> bool {
        self.rules.iter().all(|rule| rule.status != RuleStatus::Active)
    }

    /// Compiled lines joined for a rule group update
    pub fn rules_string(&self) -> String {
        self.compiled
            .iter()
            .map(|c| c.suricata_string.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Resolves and compiles the rules of a bundle
#[derive(Clone)]
pub struct RuleDefinitionResolver {
    objects: ObjectDefinitionResolver,
    max_concurrency: usize,
    default_rule_id: String,
}

impl RuleDefinitionResolver {
    pub fn new(objects: ObjectDefinitionResolver) -> Self {
        Self {
            objects,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            default_rule_id: DEFAULT_DENY_RULE_ID.to_string(),
        }
    }

    /// Limit the number of rules resolved at once
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Override the id of the synthetic default deny rule
    pub fn with_default_rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.default_rule_id = rule_id.into();
        self
    }

    /// Resolve and compile the rules of one bundle
    ///
    /// # Arguments
    ///
    /// * `rule_bundle` - Bundle the rules belong to
    /// * `rules` - Rules to compile, in the order sids are assigned
    /// * `objects` - Objects referenced by the rules; extras are ignored
    /// * `sid_offset` - The first compiled line gets `sid_offset + 1`
    ///
    /// # Errors
    ///
    /// - [`FlowError::UnderlyingService`] if any object resolution hit a transport error
    /// - [`FlowError::NoResolverFound`] if a referenced object has an unsupported shape
    pub async fn resolve_rules(
        &self,
        rule_bundle: &FlowRuleBundle,
        rules: Vec<FlowRule>,
        objects: &[FlowObject],
        sid_offset: u64,
    ) -> FlowResult<RuleResolution> {
        let lookup: HashMap<&str, &FlowObject> =
            objects.iter().map(|object| (object.id.as_str(), object)).collect();

        let pending: Vec<_> = rules
            .into_iter()
            .map(|rule| self.resolve_rule(rule_bundle, rule, &lookup))
            .collect();
        let outcomes: Vec<RuleOutcome> = stream::iter(pending)
            .buffered(self.max_concurrency)
            .try_collect()
            .await
            .map_err(|e| {
                warn!(rule_bundle_id = %rule_bundle.id, error = %e, "rule resolution aborted");
                match e {
                    FlowError::UnderlyingService(_) | FlowError::NoResolverFound { .. } => e,
                    other => FlowError::UnderlyingService(other.to_string()),
                }
            })?;

        let mut sids = SidSequence::starting_after(sid_offset);
        let mut resolved_rules = Vec::with_capacity(outcomes.len());
        let mut compiled = Vec::new();
        for outcome in outcomes {
            match outcome {
                RuleOutcome::Failed(rule) => resolved_rules.push(rule),
                RuleOutcome::Resolved {
                    mut rule,
                    sources,
                    destinations,
                } => {
                    let lines = compile_rule(&rule, &sources, &destinations, &mut sids);
                    rule.activate(
                        lines
                            .iter()
                            .map(|line| line.suricata_string.as_str())
                            .collect::<Vec<_>>()
                            .join("\n"),
                    );
                    compiled.extend(lines);
                    resolved_rules.push(rule);
                }
            }
        }

        if compiled.is_empty() {
            warn!(
                rule_bundle_id = %rule_bundle.id,
                rules = resolved_rules.len(),
                "no resolvable rules, using default deny rule"
            );
            compiled.push(default_deny_rule(&self.default_rule_id, sids.next_sid()));
        }

        info!(
            rule_bundle_id = %rule_bundle.id,
            rules = resolved_rules.len(),
            compiled = compiled.len(),
            last_sid = sids.last(),
            "resolved rule bundle"
        );

        Ok(RuleResolution {
            rules: resolved_rules,
            compiled,
        })
    }

    async fn resolve_rule(
        &self,
        rule_bundle: &FlowRuleBundle,
        mut rule: FlowRule,
        lookup: &HashMap<&str, &FlowObject>,
    ) -> FlowResult<RuleOutcome> {
        let (Some(source), Some(destination)) = (
            lookup.get(rule.source.as_str()),
            lookup.get(rule.destination.as_str()),
        ) else {
            rule.fail(UNRESOLVED_REFERENCE_REASON);
            return Ok(RuleOutcome::Failed(rule));
        };

        let (source, destination) = futures::try_join!(
            self.objects
                .resolve_target((*source).clone(), Some(rule_bundle)),
            self.objects
                .resolve_target((*destination).clone(), Some(rule_bundle)),
        )?;

        if !source.is_resolved() {
            rule.fail(format!(
                "Can not resolve source object to address {}",
                source.id()
            ));
            return Ok(RuleOutcome::Failed(rule));
        }
        if !destination.is_resolved() {
            rule.fail(format!(
                "Can not resolve destination object to address {}",
                destination.id()
            ));
            return Ok(RuleOutcome::Failed(rule));
        }

        Ok(RuleOutcome::Resolved {
            rule,
            sources: source.addresses,
            destinations: destination.addresses,
        })
    }
}
