// Copyright (c) 2025 - Cowboy AI, Inc.
//! Batch Evaluation Scheduler
//!
//! One cycle walks every rule bundle through
//! `FETCH → GROUP → DISPATCH → RECONCILE`:
//!
//! ```text
//! list_bundles ──> group by ruleGroupArn ──> one invocation per group (concurrent)
//!                                                   ↓
//!               lastSuccessSyncTimestamp <── succeeded \ failed
//! ```
//!
//! A failed group never rolls back the groups that succeeded in the same
//! cycle; the cycle still reports an error naming the failed bundle ids.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::evaluation::{
    group_by_rule_group, EvaluationInvoker, EvaluationRequest, EvaluationResponse,
};
use crate::errors::{FlowError, FlowResult};
use crate::store::RuleBundleRepository;

const DEFAULT_MAX_CONCURRENT_DISPATCHES: usize = 8;

/// Outcome of a completed cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub dispatched_groups: usize,
    pub succeeded: BTreeSet<String>,
    pub failed: BTreeSet<String>,
}

/// Periodic driver of rule bundle evaluation
pub struct Scheduler {
    repository: Arc<dyn RuleBundleRepository>,
    invoker: Arc<dyn EvaluationInvoker>,
    max_concurrent_dispatches: usize,
}

impl Scheduler {
    pub fn new(
        repository: Arc<dyn RuleBundleRepository>,
        invoker: Arc<dyn EvaluationInvoker>,
    ) -> Self {
        Self {
            repository,
            invoker,
            max_concurrent_dispatches: DEFAULT_MAX_CONCURRENT_DISPATCHES,
        }
    }

    pub fn with_max_concurrent_dispatches(mut self, limit: usize) -> Self {
        self.max_concurrent_dispatches = limit.max(1);
        self
    }

    /// Run one cycle, stamping successes with the current time
    pub async fn run_cycle(&self) -> FlowResult<CycleReport> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle, stamping successes with `now`
    ///
    /// Every successful bundle gets its own sync write; a write that fails
    /// moves only that bundle to the failed set.
    ///
    /// # Errors
    ///
    /// [`FlowError::EvaluationFailed`] naming every bundle that failed, whether
    /// its group answered with a non-success status, could not be invoked, or
    /// its sync time could not be recorded
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> FlowResult<CycleReport> {
        let bundles = self.repository.list_bundles().await?;
        let groups = group_by_rule_group(bundles);
        debug!(groups = groups.len(), "dispatching rule groups");

        let pending: Vec<_> = groups
            .into_iter()
            .map(|(rule_group_arn, members)| {
                let ids: Vec<String> = members.into_iter().map(|bundle| bundle.id).collect();
                self.dispatch(rule_group_arn, ids)
            })
            .collect();
        let dispatched_groups = pending.len();
        let outcomes: Vec<(Vec<String>, FlowResult<EvaluationResponse>)> = stream::iter(pending)
            .buffer_unordered(self.max_concurrent_dispatches)
            .collect()
            .await;

        let mut report = CycleReport {
            dispatched_groups,
            ..CycleReport::default()
        };
        for (ids, outcome) in outcomes {
            match outcome {
                Ok(response) => reconcile_response(&mut report, ids, &response),
                Err(e) => {
                    error!(rule_bundle_ids = ?ids, error = %e, "evaluation dispatch failed");
                    report.failed.extend(ids);
                }
            }
        }

        let synced: Vec<String> = report
            .succeeded
            .difference(&report.failed)
            .cloned()
            .collect();
        for id in synced {
            if let Err(e) = self.repository.update_last_success_sync(&id, now).await {
                error!(rule_bundle_id = %id, error = %e, "failed to record sync time");
                report.succeeded.remove(&id);
                report.failed.insert(id);
            }
        }

        info!(
            groups = report.dispatched_groups,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "evaluation cycle finished"
        );

        if !report.failed.is_empty() {
            return Err(FlowError::EvaluationFailed {
                rule_bundle_ids: report.failed.iter().cloned().collect(),
            });
        }
        Ok(report)
    }

    /// Run cycles every `interval` until `shutdown` flips to true
    pub async fn run_forever(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!(error = %e, "evaluation cycle failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("scheduler stopping");
                        return;
                    }
                }
            }
        }
    }

    async fn dispatch(
        &self,
        rule_group_arn: String,
        ids: Vec<String>,
    ) -> (Vec<String>, FlowResult<EvaluationResponse>) {
        debug!(%rule_group_arn, rule_bundle_ids = ?ids, "invoking evaluation");
        let outcome = self
            .invoker
            .invoke(EvaluationRequest::new(ids.clone()))
            .await;
        (ids, outcome)
    }
}

fn reconcile_response(report: &mut CycleReport, ids: Vec<String>, response: &EvaluationResponse) {
    let body_ids = response.parse_body().map(|body| body.rule_bundle_ids);
    match (response.is_success(), body_ids) {
        (true, Ok(body_ids)) => report.succeeded.extend(body_ids),
        (true, Err(e)) => {
            warn!(rule_bundle_ids = ?ids, error = %e, "unreadable evaluation response");
            report.failed.extend(ids);
        }
        (false, body_ids) => {
            warn!(rule_bundle_ids = ?ids, status = response.status_code, "evaluation failed");
            report.failed.extend(body_ids.ok().filter(|b| !b.is_empty()).unwrap_or(ids));
        }
    }
}
