//! Kinds of cloud resources managed by the gateway

use serde::{Deserialize, Serialize};

/// Types of AWS resources the gateway can manage
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
pub enum ResourceKind {
    /// EC2 instance (must be terminated before its security group can be deleted)
    Instance,
    /// EC2 key pair
    KeyPair,
    /// VPC security group
    SecurityGroup,
}

impl ResourceKind {
    /// Human-readable name for log lines and error messages
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Instance => "EC2 instance",
            ResourceKind::KeyPair => "key pair",
            ResourceKind::SecurityGroup => "security group",
        }
    }

    /// Whether mutating this kind goes through transitional statuses that
    /// need to be polled
    pub fn has_transitions(self) -> bool {
        matches!(self, ResourceKind::Instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_case_round_trip() {
        assert_eq!(ResourceKind::KeyPair.to_string(), "key-pair");
        assert_eq!(
            "security-group".parse::<ResourceKind>().unwrap(),
            ResourceKind::SecurityGroup
        );
    }

    #[test]
    fn only_instances_transition() {
        assert!(ResourceKind::Instance.has_transitions());
        assert!(!ResourceKind::KeyPair.has_transitions());
        assert!(!ResourceKind::SecurityGroup.has_transitions());
    }
}
