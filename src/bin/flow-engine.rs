// Copyright (c) 2025 - Cowboy AI, Inc.
//! Flow Rules Engine Service
//!
//! Runs the rule bundle evaluator, the batch scheduler, or both in one
//! process, selected by `FLOW_MODE`:
//!
//! - `evaluator` - answers evaluation requests on `FLOW_EVALUATION_SUBJECT`
//! - `scheduler` - dispatches evaluation requests over NATS on an interval
//! - `standalone` (default) - scheduler calling an in-process evaluator
//!
//! Run with: cargo run --bin flow-engine --features http-inventory
//!
//! Prerequisites:
//! 1. NATS server running (via NATS_URL, default: localhost:4222)
//! 2. Resource inventory API accessible (via INVENTORY_URL and INVENTORY_API_TOKEN)
//! 3. Rule bundle snapshot at FLOW_STORE_PATH

use anyhow::{anyhow, Context, Result};
use flow_rules::{
    evaluation::{
        serve_evaluations, LocalEvaluationInvoker, NatsEvaluationInvoker, NatsRuleGroupPublisher,
        RuleBundleEvaluator,
    },
    inventory::{HttpInventoryClient, InventorySource},
    nats::NatsClient,
    resolver::ObjectDefinitionResolver,
    rules::RuleDefinitionResolver,
    scheduler::Scheduler,
    store::FileRuleBundleStore,
    FlowConfig, RuleBundleRepository,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Evaluator,
    Scheduler,
    Standalone,
}

impl Mode {
    fn from_env() -> Result<Self> {
        match std::env::var("FLOW_MODE").as_deref() {
            Ok("evaluator") => Ok(Self::Evaluator),
            Ok("scheduler") => Ok(Self::Scheduler),
            Ok("standalone") | Err(_) => Ok(Self::Standalone),
            Ok(other) => Err(anyhow!(
                "Unknown FLOW_MODE '{}', expected evaluator, scheduler or standalone",
                other
            )),
        }
    }
}

fn build_evaluator(
    config: &FlowConfig,
    repository: Arc<dyn RuleBundleRepository>,
    client: NatsClient,
) -> Result<RuleBundleEvaluator> {
    let inventory_config = config
        .inventory
        .clone()
        .context("INVENTORY_URL not set")?;
    let default_aggregator = inventory_config.default_aggregator.clone();
    let inventory = HttpInventoryClient::new(inventory_config)
        .context("Failed to create inventory client")?;

    let objects = ObjectDefinitionResolver::new(InventorySource::new(
        Arc::new(inventory),
        default_aggregator,
    ));
    let rules = RuleDefinitionResolver::new(objects)
        .with_max_concurrency(config.max_concurrent_resolutions)
        .with_default_rule_id(config.default_deny_rule_id.clone());
    let publisher = NatsRuleGroupPublisher::new(client, config.rule_group_subject_prefix.clone());

    Ok(RuleBundleEvaluator::new(
        repository,
        rules,
        Arc::new(publisher),
    ))
}

fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown requested");
        let _ = tx.send(true);
    });
    rx
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mode = Mode::from_env()?;
    let config = FlowConfig::from_env().context("Invalid configuration")?;
    info!("Starting flow engine in {:?} mode", mode);
    info!("  - NATS: {:?}", config.nats.servers);
    info!("  - Evaluation subject: {}", config.evaluation_subject);
    info!("  - Store: {}", config.store_path.display());

    let client = NatsClient::new(config.nats.clone())
        .await
        .context("Failed to connect to NATS")?;
    let repository: Arc<dyn RuleBundleRepository> = Arc::new(
        FileRuleBundleStore::open(&config.store_path)
            .await
            .context("Failed to open rule bundle store")?,
    );

    match mode {
        Mode::Evaluator => {
            let evaluator = build_evaluator(&config, repository, client.clone())?;
            let mut server = serve_evaluations(
                client,
                config.evaluation_subject.clone(),
                Arc::new(evaluator),
            )
            .await
            .context("Failed to serve evaluations")?;

            let mut shutdown = shutdown_signal();
            tokio::select! {
                _ = shutdown.changed() => {}
                result = &mut server => {
                    result.context("Evaluation responder stopped")?;
                    warn!("Evaluation subscription ended unexpectedly");
                }
            }
            server.abort();
        }
        Mode::Scheduler => {
            let invoker = NatsEvaluationInvoker::new(client, config.evaluation_subject.clone());
            Scheduler::new(repository, Arc::new(invoker))
                .with_max_concurrent_dispatches(config.max_concurrent_dispatches)
                .run_forever(config.schedule_interval(), shutdown_signal())
                .await;
        }
        Mode::Standalone => {
            let evaluator = build_evaluator(&config, repository.clone(), client)?;
            let invoker = LocalEvaluationInvoker::new(Arc::new(evaluator));
            Scheduler::new(repository, Arc::new(invoker))
                .with_max_concurrent_dispatches(config.max_concurrent_dispatches)
                .run_forever(config.schedule_interval(), shutdown_signal())
                .await;
        }
    }

    info!("Flow engine stopped");
    Ok(())
}
