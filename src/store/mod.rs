// Copyright (c) 2025 - Cowboy AI, Inc.
//! Rule Bundle Persistence Interface
//!
//! The CRUD layer owns bundles, rules and objects; the engine only reads
//! snapshots and writes back derived fields (rule status, compiled text,
//! last successful sync).
//!
//! # Implementations
//!
//! - [`InMemoryRuleBundleStore`] - process-local store for tests and standalone runs
//! - [`FileRuleBundleStore`] - JSON snapshot on disk, rewritten atomically

pub mod file;
pub mod memory;

pub use file::FileRuleBundleStore;
pub use memory::{InMemoryRuleBundleStore, StoreSnapshot};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{FlowObject, FlowRule, FlowRuleBundle};
use crate::errors::FlowResult;

/// Page size used by [`RuleBundleRepository::list_bundles`]
pub const SCAN_PAGE_SIZE: usize = 100;

/// One page of a paginated scan
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the next page; `None` on the last page
    pub next_token: Option<String>,
}

/// Storage operations the engine needs
#[async_trait]
pub trait RuleBundleRepository: Send + Sync {
    /// Scan bundles in storage order
    async fn scan_bundles(
        &self,
        page_token: Option<String>,
        limit: usize,
    ) -> FlowResult<Page<FlowRuleBundle>>;

    /// All bundles, following pagination to the end
    async fn list_bundles(&self) -> FlowResult<Vec<FlowRuleBundle>> {
        let mut bundles = Vec::new();
        let mut token = None;
        loop {
            let page = self.scan_bundles(token, SCAN_PAGE_SIZE).await?;
            bundles.extend(page.items);
            match page.next_token {
                Some(next) => token = Some(next),
                None => return Ok(bundles),
            }
        }
    }

    async fn get_bundle(&self, id: &str) -> FlowResult<Option<FlowRuleBundle>>;

    /// Rules of a bundle, ordered by rule id
    async fn rules_for_bundle(&self, rule_bundle_id: &str) -> FlowResult<Vec<FlowRule>>;

    /// Objects with the given ids; unknown ids are skipped
    async fn get_objects(&self, ids: &[String]) -> FlowResult<Vec<FlowObject>>;

    /// Insert or replace rules by id
    async fn put_rules(&self, rules: Vec<FlowRule>) -> FlowResult<()>;

    /// Record a successful evaluation of a bundle
    ///
    /// # Errors
    ///
    /// [`FlowError::NotFound`](crate::errors::FlowError::NotFound) if the bundle does not exist
    async fn update_last_success_sync(
        &self,
        rule_bundle_id: &str,
        timestamp: DateTime<Utc>,
    ) -> FlowResult<()>;
}
