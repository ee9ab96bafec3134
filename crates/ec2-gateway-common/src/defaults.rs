//! Default configuration values shared between the gateway and its adapters
//!
//! These constants ensure consistent defaults across the HTTP layer, the CLI
//! and the gateway core.

use std::time::Duration;

/// Region used when a request does not name one
pub const DEFAULT_REGION: &str = "ap-south-1";

/// Default HTTP bind address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Default ingress protocol for security group rules
pub const DEFAULT_RULE_PROTOCOL: &str = "tcp";

/// Default ingress CIDR for security group rules
pub const DEFAULT_RULE_CIDR: &str = "0.0.0.0/0";

/// First poll interval in seconds
pub const DEFAULT_POLL_BASE_SECS: u64 = 2;

/// Poll interval cap in seconds
pub const DEFAULT_POLL_MAX_SECS: u64 = 32;

/// Consecutive failed reads tolerated before a wait gives up
pub const DEFAULT_POLL_READ_RETRIES: u32 = 3;

/// Wait budget for start/stop transitions (5 minutes)
pub const DEFAULT_TRANSITION_DEADLINE_SECS: u64 = 300;

/// Wait budget for launch/terminate transitions (10 minutes)
pub const DEFAULT_PROVISION_DEADLINE_SECS: u64 = 600;

// Serde default functions for struct field defaults

/// Returns the default region
pub fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Returns the default rule protocol
pub fn default_rule_protocol() -> String {
    DEFAULT_RULE_PROTOCOL.to_string()
}

/// Returns the default rule CIDR
pub fn default_rule_cidr() -> String {
    DEFAULT_RULE_CIDR.to_string()
}

/// Wait budget for start/stop as a `Duration`
pub fn transition_deadline() -> Duration {
    Duration::from_secs(DEFAULT_TRANSITION_DEADLINE_SECS)
}

/// Wait budget for launch/terminate as a `Duration`
pub fn provision_deadline() -> Duration {
    Duration::from_secs(DEFAULT_PROVISION_DEADLINE_SECS)
}
