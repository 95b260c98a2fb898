// Copyright (c) 2025 - Cowboy AI, Inc.
//! Flow Objects
//!
//! A flow object is an addressable network endpoint reference used as the
//! source or destination of a flow rule. The reference is abstract (a cloud
//! resource ARN, a tag query, a function tag) or a literal address, and is
//! turned into concrete addresses by the resolver chain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of a flow object reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// Literal IPv4 address or CIDR block
    Address,
    /// Cloud resource ARN (instance, security group, VPC, subnet, autoscaling group)
    Arn,
    /// Conjunction of tag key/value pairs
    Tagged,
    /// Serverless function selected by a single tag
    Lambda,
}

impl ObjectType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ObjectType::Address => "Address",
            ObjectType::Arn => "Arn",
            ObjectType::Tagged => "Tagged",
            ObjectType::Lambda => "Lambda",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag key/value pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlowTag {
    pub key: String,
    pub value: String,
}

impl FlowTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Type-dependent value of a flow object
#[derive(Debug, Clone, PartialEq)]
pub enum FlowObjectValue {
    Address(String),
    Arn(String),
    Tagged(Vec<FlowTag>),
    /// Kept as raw JSON: stored function tags are not guaranteed to be well formed.
    Lambda(serde_json::Value),
}

impl FlowObjectValue {
    pub fn object_type(&self) -> ObjectType {
        match self {
            FlowObjectValue::Address(_) => ObjectType::Address,
            FlowObjectValue::Arn(_) => ObjectType::Arn,
            FlowObjectValue::Tagged(_) => ObjectType::Tagged,
            FlowObjectValue::Lambda(_) => ObjectType::Lambda,
        }
    }
}

/// Flow object snapshot as stored by the CRUD layer
///
/// Stored records keep the flat `{"id", "type", "value"}` shape; the value is
/// checked against the type when the record is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredFlowObject", into = "StoredFlowObject")]
pub struct FlowObject {
    pub id: String,
    pub value: FlowObjectValue,
}

#[derive(Serialize, Deserialize)]
struct StoredFlowObject {
    id: String,
    #[serde(rename = "type")]
    object_type: ObjectType,
    value: serde_json::Value,
}

impl TryFrom<StoredFlowObject> for FlowObject {
    type Error = String;

    fn try_from(stored: StoredFlowObject) -> Result<Self, Self::Error> {
        let value = match stored.object_type {
            ObjectType::Address => FlowObjectValue::Address(
                serde_json::from_value(stored.value).map_err(|e| e.to_string())?,
            ),
            ObjectType::Arn => FlowObjectValue::Arn(
                serde_json::from_value(stored.value).map_err(|e| e.to_string())?,
            ),
            ObjectType::Tagged => FlowObjectValue::Tagged(
                serde_json::from_value(stored.value).map_err(|e| e.to_string())?,
            ),
            ObjectType::Lambda => FlowObjectValue::Lambda(stored.value),
        };

        Ok(Self {
            id: stored.id,
            value,
        })
    }
}

impl From<FlowObject> for StoredFlowObject {
    fn from(object: FlowObject) -> Self {
        let object_type = object.object_type();
        let value = match object.value {
            FlowObjectValue::Address(address) => serde_json::Value::String(address),
            FlowObjectValue::Arn(arn) => serde_json::Value::String(arn),
            FlowObjectValue::Tagged(tags) => serde_json::Value::Array(
                tags.into_iter()
                    .map(|tag| serde_json::json!({"key": tag.key, "value": tag.value}))
                    .collect(),
            ),
            FlowObjectValue::Lambda(raw) => raw,
        };

        Self {
            id: object.id,
            object_type,
            value,
        }
    }
}

impl FlowObject {
    pub fn new(id: impl Into<String>, value: FlowObjectValue) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }

    pub fn address(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self::new(id, FlowObjectValue::Address(address.into()))
    }

    pub fn arn(id: impl Into<String>, arn: impl Into<String>) -> Self {
        Self::new(id, FlowObjectValue::Arn(arn.into()))
    }

    pub fn tagged(id: impl Into<String>, tags: Vec<FlowTag>) -> Self {
        Self::new(id, FlowObjectValue::Tagged(tags))
    }

    pub fn lambda(id: impl Into<String>, tag: serde_json::Value) -> Self {
        Self::new(id, FlowObjectValue::Lambda(tag))
    }

    pub fn object_type(&self) -> ObjectType {
        self.value.object_type()
    }
}

/// A flow object together with the outcome of resolving it
///
/// An empty `addresses` list with populated `failure_reasons` is a logical
/// miss, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFlowObject {
    pub object: FlowObject,
    pub addresses: Vec<String>,
    pub failure_reasons: Vec<String>,
}

impl ResolvedFlowObject {
    pub fn resolved(object: FlowObject, addresses: Vec<String>) -> Self {
        Self {
            object,
            addresses,
            failure_reasons: Vec::new(),
        }
    }

    pub fn unresolved(object: FlowObject, reason: impl Into<String>) -> Self {
        Self {
            object,
            addresses: Vec::new(),
            failure_reasons: vec![reason.into()],
        }
    }

    pub fn id(&self) -> &str {
        &self.object.id
    }

    pub fn is_resolved(&self) -> bool {
        !self.addresses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_serializes_with_type_and_value() {
        let object = FlowObject::address("onprem", "10.0.0.0/16");
        let value = serde_json::to_value(&object).unwrap();

        assert_eq!(
            value,
            json!({"id": "onprem", "type": "Address", "value": "10.0.0.0/16"})
        );
    }

    #[test]
    fn test_tagged_object_round_trip() {
        let raw = json!({
            "id": "web",
            "type": "Tagged",
            "value": [{"key": "tier", "value": "web"}, {"key": "env", "value": "prod"}]
        });
        let object: FlowObject = serde_json::from_value(raw).unwrap();

        assert_eq!(object.object_type(), ObjectType::Tagged);
        assert_eq!(
            object.value,
            FlowObjectValue::Tagged(vec![FlowTag::new("tier", "web"), FlowTag::new("env", "prod")])
        );
    }

    #[test]
    fn test_lambda_value_keeps_raw_json() {
        let raw = json!({"id": "fn", "type": "Lambda", "value": "not-a-tag"});
        let object: FlowObject = serde_json::from_value(raw).unwrap();

        assert_eq!(object.value, FlowObjectValue::Lambda(json!("not-a-tag")));
    }
}
