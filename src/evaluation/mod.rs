// Copyright (c) 2025 - Cowboy AI, Inc.
//! Rule Bundle Evaluation
//!
//! The evaluation entry point compiles a batch of rule bundles that share a
//! firewall rule group and applies the result.
//!
//! # Wire Contract
//!
//! ```text
//! request  { "ruleBundleIds": ["b1", "b2"] }
//! response { "statusCode": 200, "body": "{\"message\": \"...\", \"ruleBundleIds\": [...]}" }
//! ```
//!
//! Status 200 means every listed bundle succeeded; any other status means
//! every listed bundle failed.
//!
//! # Flow
//!
//! ```text
//! EvaluationRequest
//!     ↓
//! load bundles → group by rule group (first-seen order)
//!     ↓
//! per bundle: RuleDefinitionResolver (sid offset continues across the group)
//!     ↓
//! persist rule status → publish combined rule text
//!     ↓
//! EvaluationResponse
//! ```

pub mod invoker;
pub mod publisher;

pub use invoker::{EvaluationInvoker, LocalEvaluationInvoker, NatsEvaluationInvoker};
pub use publisher::{
    InMemoryRuleGroupPublisher, NatsRuleGroupPublisher, RuleGroupPublisher, RuleGroupUpdate,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::domain::FlowRuleBundle;
use crate::errors::{FlowError, FlowResult};
use crate::nats::{MessageProcessor, NatsClient, RequestHandler};
use crate::rules::{RuleDefinitionResolver, RuleResolution};
use crate::store::RuleBundleRepository;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Evaluation request payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub rule_bundle_ids: Vec<String>,
}

impl EvaluationRequest {
    pub fn new(rule_bundle_ids: Vec<String>) -> Self {
        Self { rule_bundle_ids }
    }
}

/// Decoded response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponseBody {
    pub message: String,
    pub rule_bundle_ids: Vec<String>,
}

/// Evaluation response; `body` is a JSON encoded [`EvaluationResponseBody`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub status_code: u16,
    pub body: String,
}

impl EvaluationResponse {
    pub fn new(status_code: u16, message: impl Into<String>, rule_bundle_ids: Vec<String>) -> Self {
        let body = EvaluationResponseBody {
            message: message.into(),
            rule_bundle_ids,
        };
        Self {
            status_code,
            body: serde_json::to_string(&body).unwrap_or_default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    pub fn parse_body(&self) -> FlowResult<EvaluationResponseBody> {
        serde_json::from_str(&self.body).map_err(|e| FlowError::Deserialization(e.to_string()))
    }
}

/// Compilation result for one rule group
#[derive(Debug, Clone, PartialEq)]
pub struct RuleGroupEvaluation {
    pub rule_group_arn: String,
    pub resolutions: Vec<(String, RuleResolution)>,
    pub rules_string: String,
}

/// Evaluation entry point
pub struct RuleBundleEvaluator {
    repository: Arc<dyn RuleBundleRepository>,
    rules: RuleDefinitionResolver,
    publisher: Arc<dyn RuleGroupPublisher>,
}

impl RuleBundleEvaluator {
    pub fn new(
        repository: Arc<dyn RuleBundleRepository>,
        rules: RuleDefinitionResolver,
        publisher: Arc<dyn RuleGroupPublisher>,
    ) -> Self {
        Self {
            repository,
            rules,
            publisher,
        }
    }

    /// Evaluate a batch of bundles, reporting the outcome in the response
    pub async fn evaluate(&self, request: EvaluationRequest) -> EvaluationResponse {
        let ids = request.rule_bundle_ids;
        match self.evaluate_bundles(&ids).await {
            Ok(groups) => {
                info!(
                    bundles = ids.len(),
                    rule_groups = groups.len(),
                    "evaluated rule bundles"
                );
                EvaluationResponse::new(STATUS_OK, "Rule bundles evaluated", ids)
            }
            Err(e) => {
                error!(rule_bundle_ids = ?ids, error = %e, "rule bundle evaluation failed");
                EvaluationResponse::new(STATUS_INTERNAL_ERROR, e.to_string(), ids)
            }
        }
    }

    /// Compile, persist and publish the given bundles
    ///
    /// Each rule group is compiled completely before anything is written, so
    /// a transport error leaves that group's stored rules untouched.
    pub async fn evaluate_bundles(&self, ids: &[String]) -> FlowResult<Vec<RuleGroupEvaluation>> {
        let mut bundles = Vec::with_capacity(ids.len());
        for id in ids {
            let bundle = self
                .repository
                .get_bundle(id)
                .await?
                .ok_or_else(|| FlowError::NotFound(format!("rule bundle {}", id)))?;
            bundles.push(bundle);
        }

        let mut evaluations = Vec::new();
        for (rule_group_arn, group) in group_by_rule_group(bundles) {
            let evaluation = self.compile_group(rule_group_arn, &group).await?;
            self.apply(&evaluation).await?;
            evaluations.push(evaluation);
        }
        Ok(evaluations)
    }

    async fn compile_group(
        &self,
        rule_group_arn: String,
        bundles: &[FlowRuleBundle],
    ) -> FlowResult<RuleGroupEvaluation> {
        let mut sid_offset = 0;
        let mut resolutions = Vec::with_capacity(bundles.len());
        for bundle in bundles {
            let rules = self.repository.rules_for_bundle(&bundle.id).await?;
            let object_ids = referenced_objects(&rules);
            let objects = self.repository.get_objects(&object_ids).await?;

            let resolution = self
                .rules
                .resolve_rules(bundle, rules, &objects, sid_offset)
                .await?;
            sid_offset = resolution.last_sid();
            resolutions.push((bundle.id.clone(), resolution));
        }

        // One bundle without resolvable rules must not deny traffic its
        // siblings in the same rule group allow.
        let mut lines: Vec<&str> = resolutions
            .iter()
            .filter(|(_, resolution)| !resolution.is_default_deny())
            .flat_map(|(_, resolution)| resolution.compiled.iter())
            .map(|compiled| compiled.suricata_string.as_str())
            .collect();
        if lines.is_empty() {
            lines = resolutions
                .iter()
                .take(1)
                .flat_map(|(_, resolution)| resolution.compiled.iter())
                .map(|compiled| compiled.suricata_string.as_str())
                .collect();
        }
        let rules_string = lines.join("\n");

        Ok(RuleGroupEvaluation {
            rule_group_arn,
            resolutions,
            rules_string,
        })
    }

    async fn apply(&self, evaluation: &RuleGroupEvaluation) -> FlowResult<()> {
        let mut updated = Vec::new();
        for (_, resolution) in &evaluation.resolutions {
            for rule in &resolution.rules {
                let mut rule = rule.clone();
                rule.version += 1;
                updated.push(rule);
            }
        }
        self.repository.put_rules(updated).await?;

        self.publisher
            .publish(RuleGroupUpdate {
                rule_group_arn: evaluation.rule_group_arn.clone(),
                rules_string: evaluation.rules_string.clone(),
                rule_bundle_ids: evaluation
                    .resolutions
                    .iter()
                    .map(|(id, _)| id.clone())
                    .collect(),
            })
            .await
    }
}

/// Partition bundles by rule group, keeping first-seen order of groups and bundles
pub fn group_by_rule_group(bundles: Vec<FlowRuleBundle>) -> Vec<(String, Vec<FlowRuleBundle>)> {
    let mut groups: Vec<(String, Vec<FlowRuleBundle>)> = Vec::new();
    for bundle in bundles {
        match groups
            .iter_mut()
            .find(|(arn, _)| *arn == bundle.rule_group_arn)
        {
            Some((_, members)) => members.push(bundle),
            None => groups.push((bundle.rule_group_arn.clone(), vec![bundle])),
        }
    }
    groups
}

/// Distinct source and destination object ids in rule order
fn referenced_objects(rules: &[crate::domain::FlowRule]) -> Vec<String> {
    let mut seen = HashSet::new();
    rules
        .iter()
        .flat_map(|rule| [&rule.source, &rule.destination])
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// NATS request handler answering on behalf of an evaluator
pub struct EvaluationService {
    evaluator: Arc<RuleBundleEvaluator>,
    subject: String,
}

impl EvaluationService {
    pub fn new(evaluator: Arc<RuleBundleEvaluator>, subject: impl Into<String>) -> Self {
        Self {
            evaluator,
            subject: subject.into(),
        }
    }
}

#[async_trait]
impl RequestHandler for EvaluationService {
    type Request = EvaluationRequest;
    type Response = EvaluationResponse;

    async fn handle(&self, request: EvaluationRequest) -> EvaluationResponse {
        self.evaluator.evaluate(request).await
    }

    fn malformed(&self, error: &serde_json::Error) -> EvaluationResponse {
        EvaluationResponse::new(
            STATUS_BAD_REQUEST,
            format!("Invalid evaluation request: {}", error),
            Vec::new(),
        )
    }

    fn subject(&self) -> &str {
        &self.subject
    }
}

/// Answer evaluation requests on `subject` until the subscription closes
pub async fn serve_evaluations(
    client: NatsClient,
    subject: impl Into<String>,
    evaluator: Arc<RuleBundleEvaluator>,
) -> FlowResult<JoinHandle<()>> {
    let service = Arc::new(EvaluationService::new(evaluator, subject));
    info!(subject = %service.subject, "serving rule bundle evaluations");
    MessageProcessor::new(client).run_handler(service).await
}
