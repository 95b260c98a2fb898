// Copyright (c) 2025 - Cowboy AI, Inc.
//! JSON file backed rule bundle store
//!
//! Loads a [`StoreSnapshot`] on open and rewrites the whole file after every
//! write (temp file in the same directory, then rename).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use super::{InMemoryRuleBundleStore, Page, RuleBundleRepository, StoreSnapshot};
use crate::domain::{FlowObject, FlowRule, FlowRuleBundle};
use crate::errors::{FlowError, FlowResult};

/// Store persisted as a single JSON document
#[derive(Debug)]
pub struct FileRuleBundleStore {
    path: PathBuf,
    inner: InMemoryRuleBundleStore,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileRuleBundleStore {
    /// Open the store, starting empty if the file does not exist
    pub async fn open(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref().to_path_buf();

        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<StoreSnapshot>(&bytes).map_err(|e| {
                FlowError::Deserialization(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreSnapshot::default(),
            Err(e) => {
                return Err(FlowError::Storage(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        info!(
            path = %path.display(),
            bundles = snapshot.rule_bundles.len(),
            rules = snapshot.rules.len(),
            objects = snapshot.objects.len(),
            "opened rule bundle store"
        );

        Ok(Self {
            path,
            inner: InMemoryRuleBundleStore::from_snapshot(snapshot),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.inner.snapshot().await
    }

    async fn flush(&self) -> FlowResult<()> {
        let payload = serde_json::to_vec_pretty(&self.inner.snapshot().await)?;

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store.json".to_string());
        let temp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::now_v7()));

        tokio::fs::write(&temp_path, payload)
            .await
            .map_err(|e| FlowError::Storage(format!("failed to write {}: {}", temp_path.display(), e)))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| FlowError::Storage(format!("failed to replace {}: {}", self.path.display(), e)))?;

        debug!(path = %self.path.display(), "flushed rule bundle store");
        Ok(())
    }
}

#[async_trait]
impl RuleBundleRepository for FileRuleBundleStore {
    async fn scan_bundles(
        &self,
        page_token: Option<String>,
        limit: usize,
    ) -> FlowResult<Page<FlowRuleBundle>> {
        self.inner.scan_bundles(page_token, limit).await
    }

    async fn get_bundle(&self, id: &str) -> FlowResult<Option<FlowRuleBundle>> {
        self.inner.get_bundle(id).await
    }

    async fn rules_for_bundle(&self, rule_bundle_id: &str) -> FlowResult<Vec<FlowRule>> {
        self.inner.rules_for_bundle(rule_bundle_id).await
    }

    async fn get_objects(&self, ids: &[String]) -> FlowResult<Vec<FlowObject>> {
        self.inner.get_objects(ids).await
    }

    async fn put_rules(&self, rules: Vec<FlowRule>) -> FlowResult<()> {
        let _guard = self.write_lock.lock().await;
        self.inner.put_rules(rules).await?;
        self.flush().await
    }

    async fn update_last_success_sync(
        &self,
        rule_bundle_id: &str,
        timestamp: DateTime<Utc>,
    ) -> FlowResult<()> {
        let _guard = self.write_lock.lock().await;
        self.inner
            .update_last_success_sync(rule_bundle_id, timestamp)
            .await?;
        self.flush().await
    }
}
