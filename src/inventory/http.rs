// Copyright (c) 2025 - Cowboy AI, Inc.

//! HTTP Resource Inventory Client
//!
//! Queries a remote resource-inventory aggregator over its REST API. The
//! query is sent as a select expression and results are paged with a
//! continuation token:
//!
//! ```text
//! POST {base_url}/aggregators/{aggregator}/select
//! { "expression": "SELECT ...", "nextToken": null }
//!
//! 200 OK
//! { "results": ["{\"configuration\": {...}}", ...], "nextToken": "..." }
//! ```
//!
//! Result entries may be JSON-encoded strings or inline objects. Entries that
//! fail to parse are returned as `null` so resolvers can skip them.
//!
//! # Example
//!
//! ```rust,no_run
//! use flow_rules::inventory::{HttpInventoryClient, InventoryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = InventoryConfig {
//!         base_url: "http://inventory.internal".to_string(),
//!         api_token: "your-token-here".to_string(),
//!         default_aggregator: "org-aggregator".to_string(),
//!         timeout_secs: 30,
//!     };
//!
//!     let client = HttpInventoryClient::new(config)?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{InventoryClient, InventoryQuery};
use crate::errors::{FlowError, FlowResult};

/// Configuration for the remote inventory connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Inventory API base URL (e.g., "http://inventory.internal")
    pub base_url: String,

    /// API token for authentication
    pub api_token: String,

    /// Aggregator used when a rule bundle does not name one
    pub default_aggregator: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectRequest<'a> {
    expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
    #[serde(default)]
    next_token: Option<String>,
}

/// Inventory client for a remote aggregator API
pub struct HttpInventoryClient {
    config: InventoryConfig,
    client: Client,
}

impl HttpInventoryClient {
    /// Create a new client
    pub fn new(config: InventoryConfig) -> FlowResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Token {}", config.api_token)
                .parse()
                .map_err(|e| FlowError::Configuration(format!("Invalid API token: {}", e)))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                FlowError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    async fn select_page(
        &self,
        url: &str,
        expression: &str,
        next_token: Option<&str>,
    ) -> FlowResult<SelectResponse> {
        let response = self
            .client
            .post(url)
            .json(&SelectRequest {
                expression: expression.to_string(),
                next_token,
            })
            .send()
            .await
            .map_err(|e| FlowError::Inventory(format!("Inventory API error: {}", e)))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FlowError::Inventory(format!(
                "Inventory API returned {}: {}",
                status, body
            )));
        }

        response
            .json::<SelectResponse>()
            .await
            .map_err(|e| FlowError::Inventory(format!("Invalid inventory response: {}", e)))
    }
}

/// Decode one result entry; string entries carry an encoded JSON document
fn decode_entry(entry: serde_json::Value) -> serde_json::Value {
    match entry {
        serde_json::Value::String(encoded) => match serde_json::from_str(&encoded) {
            Ok(value) => value,
            Err(e) => {
                warn!("Skipping unparseable inventory record: {}", e);
                serde_json::Value::Null
            }
        },
        other => other,
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn select(
        &self,
        aggregator: &str,
        query: &InventoryQuery,
    ) -> FlowResult<Vec<serde_json::Value>> {
        let url = format!(
            "{}/aggregators/{}/select",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(aggregator)
        );
        let expression = query.to_expression();

        let mut results = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .select_page(&url, &expression, next_token.as_deref())
                .await?;
            results.extend(page.results.into_iter().map(decode_entry));

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        debug!(aggregator, count = results.len(), "inventory select complete");
        Ok(results)
    }
}
