//! Operation intents
//!
//! An [`Intent`] is one fully specified, user-requested resource operation.
//! It is built per request, consumed once by the planner and never persisted,
//! which is why it is deliberately not `Clone`.

use crate::defaults::{default_rule_cidr, default_rule_protocol};
use crate::descriptor::ResourceDescriptor;
use crate::resource_kind::ResourceKind;
use serde::{Deserialize, Serialize};

/// What the caller wants done to the target resource
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Action {
    Create,
    Start,
    Stop,
    Terminate,
    Delete,
}

/// A single security group ingress permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    #[serde(default = "default_rule_protocol")]
    pub protocol: String,
    pub port: u16,
    #[serde(default = "default_rule_cidr")]
    pub cidr: String,
}

impl IngressRule {
    pub fn new(protocol: impl Into<String>, port: u16, cidr: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            port,
            cidr: cidr.into(),
        }
    }

    /// TCP rule open to the world, the most common request shape
    pub fn tcp(port: u16) -> Self {
        Self::new(default_rule_protocol(), port, default_rule_cidr())
    }

    /// Compact label used in step names, e.g. "tcp/443 from 10.0.0.0/8"
    pub fn label(&self) -> String {
        format!("{}/{} from {}", self.protocol, self.port, self.cidr)
    }
}

/// Parameters for launching an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchParameters {
    pub ami_id: String,
    pub instance_type: String,
    pub key_name: Option<String>,
    pub security_group_id: Option<String>,
}

impl LaunchParameters {
    pub fn new(ami_id: impl Into<String>, instance_type: impl Into<String>) -> Self {
        Self {
            ami_id: ami_id.into(),
            instance_type: instance_type.into(),
            key_name: None,
            security_group_id: None,
        }
    }

    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = Some(key_name.into());
        self
    }

    pub fn with_security_group(mut self, security_group_id: impl Into<String>) -> Self {
        self.security_group_id = Some(security_group_id.into());
        self
    }
}

/// Parameters for creating a security group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupParameters {
    pub group_name: String,
    pub description: String,
    /// Uses the account's default VPC when absent
    pub vpc_id: Option<String>,
    /// Applied in order; the first failure rolls the group back
    pub rules: Vec<IngressRule>,
}

/// Action-specific payload of an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentParameters {
    None,
    Launch(LaunchParameters),
    KeyPair { key_name: String },
    SecurityGroup(SecurityGroupParameters),
}

/// One user-requested resource operation
#[derive(Debug)]
pub struct Intent {
    pub action: Action,
    pub target: ResourceDescriptor,
    pub parameters: IntentParameters,
}

impl Intent {
    pub fn new(action: Action, target: ResourceDescriptor, parameters: IntentParameters) -> Self {
        Self {
            action,
            target,
            parameters,
        }
    }

    /// Launch a new instance
    pub fn launch(region: impl Into<String>, params: LaunchParameters) -> Self {
        Self::new(
            Action::Create,
            ResourceDescriptor::new(ResourceKind::Instance, region),
            IntentParameters::Launch(params),
        )
    }

    /// Start an existing instance
    pub fn start(region: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self::lifecycle(Action::Start, region, instance_id)
    }

    /// Stop an existing instance
    pub fn stop(region: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self::lifecycle(Action::Stop, region, instance_id)
    }

    /// Terminate an existing instance
    pub fn terminate(region: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self::lifecycle(Action::Terminate, region, instance_id)
    }

    fn lifecycle(action: Action, region: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self::new(
            action,
            ResourceDescriptor::existing(ResourceKind::Instance, region, instance_id),
            IntentParameters::None,
        )
    }

    /// Create a key pair
    pub fn create_key_pair(region: impl Into<String>, key_name: impl Into<String>) -> Self {
        let key_name = key_name.into();
        Self::new(
            Action::Create,
            ResourceDescriptor::new(ResourceKind::KeyPair, region).with_name(key_name.clone()),
            IntentParameters::KeyPair { key_name },
        )
    }

    /// Delete a key pair by name
    pub fn delete_key_pair(region: impl Into<String>, key_name: impl Into<String>) -> Self {
        Self::new(
            Action::Delete,
            ResourceDescriptor::new(ResourceKind::KeyPair, region).with_name(key_name),
            IntentParameters::None,
        )
    }

    /// Create a security group with ingress rules
    pub fn create_security_group(region: impl Into<String>, params: SecurityGroupParameters) -> Self {
        Self::new(
            Action::Create,
            ResourceDescriptor::new(ResourceKind::SecurityGroup, region)
                .with_name(params.group_name.clone()),
            IntentParameters::SecurityGroup(params),
        )
    }

    /// Delete a security group by id
    pub fn delete_security_group(region: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self::new(
            Action::Delete,
            ResourceDescriptor::existing(ResourceKind::SecurityGroup, region, group_id),
            IntentParameters::None,
        )
    }
}
