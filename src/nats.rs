//! NATS client abstraction for evaluation dispatch and rule group publication

use async_nats::{Client, ConnectOptions, Subscriber};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::{FlowError, FlowResult};

/// Configuration for NATS connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Client name
    pub name: String,
    /// Connection timeout
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,
    /// Request timeout; bounds a single evaluation round trip
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "flow-rules".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// NATS client wrapper providing JSON messaging
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Create a new NATS client with the given configuration
    pub async fn new(config: NatsConfig) -> FlowResult<Self> {
        let connect_options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout)
            .request_timeout(Some(config.request_timeout));

        let client = async_nats::connect_with_options(config.servers.join(","), connect_options)
            .await
            .map_err(|e| FlowError::NatsConnection(e.to_string()))?;

        info!("Connected to NATS at {:?}", config.servers);

        Ok(Self { client })
    }

    /// Publish a message to a subject
    pub async fn publish<T>(&self, subject: &str, message: &T) -> FlowResult<()>
    where
        T: Serialize,
    {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| FlowError::NatsPublish(e.to_string()))?;

        debug!("Published message to subject: {}", subject);
        Ok(())
    }

    /// Subscribe to a subject
    pub async fn subscribe(&self, subject: &str) -> FlowResult<Subscriber> {
        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| FlowError::NatsSubscribe(e.to_string()))?;

        info!("Subscribed to subject: {}", subject);
        Ok(subscriber)
    }

    /// Request-reply pattern
    pub async fn request<T, R>(&self, subject: &str, request: &T) -> FlowResult<R>
    where
        T: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let payload = serde_json::to_vec(request)?;

        let response = self
            .client
            .request(subject.to_string(), payload.into())
            .await
            .map_err(|e| FlowError::NatsPublish(e.to_string()))?;

        let result: R = serde_json::from_slice(&response.payload)
            .map_err(|e| FlowError::Deserialization(e.to_string()))?;

        Ok(result)
    }

    /// Get the underlying NATS client for advanced operations
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Trait for answering request-reply messages from NATS
#[async_trait::async_trait]
pub trait RequestHandler: Send + Sync {
    /// The type of request this handler processes
    type Request: for<'de> Deserialize<'de> + Send;

    /// The reply sent back to the requester
    type Response: Serialize + Send + Sync;

    /// Handle a request
    async fn handle(&self, request: Self::Request) -> Self::Response;

    /// Reply for a request payload that could not be decoded
    fn malformed(&self, error: &serde_json::Error) -> Self::Response;

    /// Get the subject this handler subscribes to
    fn subject(&self) -> &str;
}

/// Message processor that runs handlers for subscriptions
pub struct MessageProcessor {
    client: NatsClient,
}

impl MessageProcessor {
    /// Create a new message processor
    pub fn new(client: NatsClient) -> Self {
        Self { client }
    }

    /// Start answering requests for a specific handler
    ///
    /// Requests are handled one at a time in arrival order.
    pub async fn run_handler<H>(&self, handler: Arc<H>) -> FlowResult<JoinHandle<()>>
    where
        H: RequestHandler + 'static,
    {
        let subject = handler.subject().to_string();
        let mut subscriber = self.client.subscribe(&subject).await?;
        let client = self.client.clone();

        Ok(tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                let response = match serde_json::from_slice::<H::Request>(&msg.payload) {
                    Ok(request) => handler.handle(request).await,
                    Err(e) => {
                        error!("Failed to deserialize message on {}: {}", subject, e);
                        handler.malformed(&e)
                    }
                };

                let Some(reply) = msg.reply.as_ref() else {
                    warn!("Request on {} has no reply subject", subject);
                    continue;
                };
                if let Err(e) = client.publish(&reply.to_string(), &response).await {
                    error!("Failed to reply on {}: {}", subject, e);
                }
            }
        }))
    }
}
