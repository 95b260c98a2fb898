// Copyright (c) 2025 - Cowboy AI, Inc.
//! Amazon Resource Names
//!
//! Minimal ARN parsing for the resource kinds the resolver chain understands:
//!
//! ```text
//! arn:aws:ec2:ap-southeast-2:1000:instance/i-0a1b2c
//! arn:aws:ec2:ap-southeast-2:1000:security-group/sg-0a1b2c
//! arn:aws:ec2:ap-southeast-2:1000:vpc/vpc-0a1b2c
//! arn:aws:ec2:ap-southeast-2:1000:subnet/subnet-0a1b2c
//! arn:aws:autoscaling:ap-southeast-2:1000:autoScalingGroup:6d3c:autoScalingGroupName/web-asg
//! ```

use std::fmt;

/// Parsed ARN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    /// Parse an ARN, returning `None` if it does not have six `:`-separated parts
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.splitn(6, ':');
        if parts.next()? != "arn" {
            return None;
        }
        let partition = parts.next()?;
        let service = parts.next()?;
        let region = parts.next()?;
        let account_id = parts.next()?;
        let resource = parts.next()?;

        if partition.is_empty() || service.is_empty() || resource.is_empty() {
            return None;
        }

        Some(Self {
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            resource: resource.to_string(),
        })
    }

    /// Resource type prefix, e.g. `instance` or `autoScalingGroup`
    pub fn resource_type(&self) -> &str {
        self.resource
            .split(['/', ':'])
            .next()
            .unwrap_or(&self.resource)
    }

    /// Trailing resource identifier, e.g. `i-0a1b2c` or `web-asg`
    pub fn resource_id(&self) -> &str {
        self.resource
            .rsplit(['/', ':'])
            .next()
            .unwrap_or(&self.resource)
    }

    pub fn is(&self, service: &str, resource_type: &str) -> bool {
        self.service == service && self.resource_type() == resource_type
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}
