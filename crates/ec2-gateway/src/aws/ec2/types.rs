//! EC2 value types returned by the provider

use ec2_gateway_common::ResourceStatus;
use serde::Serialize;

/// Launched instance info
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedInstance {
    pub instance_id: String,
    pub instance_type: String,
    /// State reported by RunInstances (normally `pending`)
    pub state: ResourceStatus,
}

/// One row of a describe-instances listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSummary {
    pub instance_id: String,
    pub instance_type: String,
    pub state: ResourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_time: Option<String>,
}

/// PEM-encoded private key returned once by CreateKeyPair.
///
/// `Debug` is redacted so the key never lands in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial(String);

impl KeyMaterial {
    pub fn new(pem: impl Into<String>) -> Self {
        Self(pem.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyMaterial(<{} bytes redacted>)", self.0.len())
    }
}

/// Result of creating a key pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedKeyPair {
    pub key_name: String,
    pub key_pair_id: String,
    pub fingerprint: Option<String>,
    pub key_material: KeyMaterial,
}

/// One row of a describe-key-pairs listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPairSummary {
    pub key_name: String,
    pub key_pair_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
}

/// Ingress permission as reported by EC2 (port range, many CIDRs)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngressPermission {
    pub protocol: String,
    pub from_port: Option<i32>,
    pub to_port: Option<i32>,
    pub cidrs: Vec<String>,
}

/// One row of a describe-security-groups listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityGroupSummary {
    pub group_id: String,
    pub group_name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    pub ingress: Vec<IngressPermission>,
}
