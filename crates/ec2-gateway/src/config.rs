//! Configuration types for the gateway
//!
//! Built once in `main` from CLI arguments and environment, validated, and
//! then handed to the AWS context and HTTP layer as immutable values.

use crate::gateway::GatewaySettings;
use crate::planner::Deadlines;
use crate::wait::PollConfig;
use ec2_gateway_common::defaults::{DEFAULT_BIND_ADDR, default_region};
use std::net::SocketAddr;
use thiserror::Error;

/// Static AWS keys, used instead of the default credential chain
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// How to reach AWS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSettings {
    /// Region used when a request does not name one
    pub region: String,
    /// Named profile from the shared config files
    pub profile: Option<String>,
    pub static_credentials: Option<StaticCredentials>,
}

impl AwsSettings {
    /// Default credential chain in `region`
    pub fn for_region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            profile: None,
            static_credentials: None,
        }
    }
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self::for_region(default_region())
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }
}

/// Invalid configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("region must not be empty")]
    EmptyRegion,

    #[error("poll base interval must be greater than zero")]
    ZeroPollInterval,

    #[error("poll max interval ({max:?}) is shorter than the base interval ({base:?})")]
    PollCapBelowBase {
        base: std::time::Duration,
        max: std::time::Duration,
    },

    #[error("{0} deadline must be greater than zero")]
    ZeroDeadline(&'static str),

    #[error("both an access key id and a secret access key are required")]
    IncompleteCredentials,

    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),
}

/// Complete gateway configuration
///
/// Composed of focused sub-configs, each owned by the component that reads
/// it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayConfig {
    pub aws: AwsSettings,
    pub poll: PollConfig,
    pub deadlines: Deadlines,
    pub server: ServerConfig,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aws.region.trim().is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        if let Some(keys) = &self.aws.static_credentials {
            if keys.access_key_id.is_empty() || keys.secret_access_key.is_empty() {
                return Err(ConfigError::IncompleteCredentials);
            }
        }
        if self.poll.base_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.poll.max_interval < self.poll.base_interval {
            return Err(ConfigError::PollCapBelowBase {
                base: self.poll.base_interval,
                max: self.poll.max_interval,
            });
        }
        if self.deadlines.transition.is_zero() {
            return Err(ConfigError::ZeroDeadline("transition"));
        }
        if self.deadlines.provision.is_zero() {
            return Err(ConfigError::ZeroDeadline("provision"));
        }
        Ok(())
    }

    /// Settings every per-request gateway is built with
    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            poll: self.poll,
            deadlines: self.deadlines,
        }
    }

    pub fn region(&self) -> &str {
        &self.aws.region
    }
}

/// Parse a bind address such as `0.0.0.0:8000`
pub fn parse_bind_addr(s: &str) -> Result<SocketAddr, ConfigError> {
    s.parse()
        .map_err(|_| ConfigError::InvalidBindAddress(s.to_string()))
}

/// Default bind address as a string, for CLI defaults
pub fn default_bind_addr() -> &'static str {
    DEFAULT_BIND_ADDR
}
