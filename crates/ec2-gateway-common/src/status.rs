//! Provider-reported lifecycle status of a managed resource
//!
//! Instance values match the EC2 `InstanceStateName` strings. Key pairs and
//! security groups only ever report `present` or `absent`.

use serde::{Deserialize, Serialize};

/// Lifecycle status as last confirmed by the provider
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive, serialize_all = "kebab-case")]
pub enum ResourceStatus {
    /// No provider read has happened yet
    #[default]
    Unknown,
    Pending,
    Running,
    Stopping,
    Stopped,
    ShuttingDown,
    Terminated,
    /// Key pair or security group exists
    Present,
    /// Key pair or security group does not exist
    Absent,
}

impl ResourceStatus {
    /// Parse from string, returning None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Whether `target` can still be reached from this status.
    ///
    /// Used by the poller to fail fast instead of waiting out the deadline
    /// on an instance that was terminated underneath it.
    pub fn can_reach(self, target: ResourceStatus) -> bool {
        if self == target {
            return true;
        }
        match self {
            Self::Terminated => false,
            Self::ShuttingDown => target == Self::Terminated,
            Self::Absent => target == Self::Present,
            _ => true,
        }
    }
}
