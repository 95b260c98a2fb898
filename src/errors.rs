//! Error types for flow rule resolution, compilation and scheduling

use thiserror::Error;

/// Errors that can occur while resolving, compiling or scheduling flow rules
#[derive(Debug, Error)]
pub enum FlowError {
    /// No resolver in the chain accepts the object
    #[error("No resolver found for object {object_id} of type {object_type}")]
    NoResolverFound {
        object_id: String,
        object_type: String,
    },

    /// A remote dependency failed while a batch was being processed
    #[error("Underlying service error: {0}")]
    UnderlyingService(String),

    /// Resource inventory query failed at the transport level
    #[error("Inventory query error: {0}")]
    Inventory(String),

    /// Persistence layer error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Entity not found in the persistence layer
    #[error("Not found: {0}")]
    NotFound(String),

    /// Evaluation invocation failed at the transport level
    #[error("Evaluation invocation error: {0}")]
    Invocation(String),

    /// Rule group publication failed
    #[error("Rule group publish error: {0}")]
    Publish(String),

    /// One or more rule bundles failed evaluation during a scheduler cycle
    #[error("Evaluation failed for rule bundles: {}", rule_bundle_ids.join(", "))]
    EvaluationFailed { rule_bundle_ids: Vec<String> },

    /// NATS connection error
    #[error("NATS connection error: {0}")]
    NatsConnection(String),

    /// NATS publish error
    #[error("NATS publish error: {0}")]
    NatsPublish(String),

    /// NATS subscribe error
    #[error("NATS subscribe error: {0}")]
    NatsSubscribe(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FlowError {
    /// Whether this error came from a remote dependency rather than from the data
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FlowError::UnderlyingService(_)
                | FlowError::Inventory(_)
                | FlowError::Storage(_)
                | FlowError::Invocation(_)
                | FlowError::Publish(_)
                | FlowError::NatsConnection(_)
                | FlowError::NatsPublish(_)
                | FlowError::NatsSubscribe(_)
        )
    }
}

/// Result type for flow rule operations
pub type FlowResult<T> = Result<T, FlowError>;

impl From<async_nats::Error> for FlowError {
    fn from(err: async_nats::Error) -> Self {
        FlowError::NatsConnection(err.to_string())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Serialization(err.to_string())
    }
}
