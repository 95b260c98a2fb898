// Copyright (c) 2025 - Cowboy AI, Inc.
//! Evaluation invocation
//!
//! The scheduler reaches the evaluation entry point through an
//! [`EvaluationInvoker`], either in-process or as a NATS request.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{EvaluationRequest, EvaluationResponse, RuleBundleEvaluator};
use crate::errors::{FlowError, FlowResult};
use crate::nats::NatsClient;

/// Synchronous invocation of the evaluation entry point
#[async_trait]
pub trait EvaluationInvoker: Send + Sync {
    /// Invoke evaluation and wait for its response
    ///
    /// An `Err` means the invocation itself failed; an evaluation that ran and
    /// failed is reported through the response status.
    async fn invoke(&self, request: EvaluationRequest) -> FlowResult<EvaluationResponse>;
}

/// Invoker calling an evaluator in the same process
#[derive(Clone)]
pub struct LocalEvaluationInvoker {
    evaluator: Arc<RuleBundleEvaluator>,
}

impl LocalEvaluationInvoker {
    pub fn new(evaluator: Arc<RuleBundleEvaluator>) -> Self {
        Self { evaluator }
    }
}

#[async_trait]
impl EvaluationInvoker for LocalEvaluationInvoker {
    async fn invoke(&self, request: EvaluationRequest) -> FlowResult<EvaluationResponse> {
        Ok(self.evaluator.evaluate(request).await)
    }
}

/// Invoker sending a NATS request to a remote evaluator
#[derive(Clone)]
pub struct NatsEvaluationInvoker {
    client: NatsClient,
    subject: String,
}

impl NatsEvaluationInvoker {
    pub fn new(client: NatsClient, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
        }
    }
}

#[async_trait]
impl EvaluationInvoker for NatsEvaluationInvoker {
    async fn invoke(&self, request: EvaluationRequest) -> FlowResult<EvaluationResponse> {
        debug!(subject = %self.subject, rule_bundle_ids = ?request.rule_bundle_ids, "invoking evaluation");
        self.client
            .request(&self.subject, &request)
            .await
            .map_err(|e| FlowError::Invocation(e.to_string()))
    }
}
