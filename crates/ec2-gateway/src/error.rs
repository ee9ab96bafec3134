//! Gateway error taxonomy
//!
//! Every failure of [`crate::gateway::Gateway::execute`] is one of these.
//! Provider failures stay attached as the `#[source]`, and compensation
//! outcomes ride along with the primary cause instead of replacing it.

use crate::aws::error::ProviderError;
use crate::compensation::CompensationOutcome;
use ec2_gateway_common::{DescriptorError, ResourceDescriptor, ResourceKind, ResourceStatus};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// A dependency the plan needs (e.g. the default VPC) could not be
    /// determined
    #[error("could not resolve {what}: {reason}")]
    ResourceResolution { what: String, reason: String },

    /// A plan step failed after zero or more steps had completed
    #[error("step '{step}' failed: {cause} ({compensation})")]
    PlanExecution {
        step: String,
        #[source]
        cause: ProviderError,
        compensation: CompensationOutcome,
    },

    /// The resource did not reach the target status within the deadline
    #[error(
        "{} did not become {target} within {elapsed:?}, last status {last_status}",
        .descriptor.description()
    )]
    WaitTimeout {
        descriptor: Box<ResourceDescriptor>,
        target: ResourceStatus,
        last_status: ResourceStatus,
        elapsed: Duration,
        intervals: Vec<Duration>,
    },

    /// Status reads kept failing while waiting
    #[error(
        "reading status of {} failed {attempts} times in a row",
        .descriptor.description()
    )]
    Poll {
        descriptor: Box<ResourceDescriptor>,
        attempts: u32,
        #[source]
        cause: ProviderError,
    },

    /// The addressed resource does not exist
    #[error("{} '{handle}' not found", .kind.label())]
    NotFound {
        kind: ResourceKind,
        handle: String,
        #[source]
        cause: ProviderError,
    },

    /// The provider rejected the configured credentials
    #[error("AWS credentials were rejected")]
    Credential {
        #[source]
        cause: ProviderError,
    },

    /// The intent cannot be planned
    #[error("invalid request: {0}")]
    InvalidIntent(String),

    /// The resource moved to a status from which the target is unreachable
    #[error(
        "{} reached {observed} while waiting for {target}",
        .descriptor.description()
    )]
    UnexpectedStatus {
        descriptor: Box<ResourceDescriptor>,
        target: ResourceStatus,
        observed: ResourceStatus,
    },

    /// The caller stopped waiting; completed steps were rolled back
    #[error("abandoned during '{step}' ({compensation})")]
    Cancelled {
        step: String,
        compensation: CompensationOutcome,
    },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

impl GatewayError {
    /// Stable machine-readable name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ResourceResolution { .. } => "resource_resolution",
            Self::PlanExecution { .. } => "plan_execution",
            Self::WaitTimeout { .. } => "wait_timeout",
            Self::Poll { .. } => "poll",
            Self::NotFound { .. } => "not_found",
            Self::Credential { .. } => "credential",
            Self::InvalidIntent(_) => "invalid_intent",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::Cancelled { .. } => "cancelled",
            Self::Descriptor(_) => "descriptor",
        }
    }

    /// Underlying provider error, if any
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::PlanExecution { cause, .. }
            | Self::Poll { cause, .. }
            | Self::NotFound { cause, .. }
            | Self::Credential { cause } => Some(cause),
            _ => None,
        }
    }

    /// Descriptor as last known when the error happened
    pub fn descriptor(&self) -> Option<&ResourceDescriptor> {
        match self {
            Self::WaitTimeout { descriptor, .. }
            | Self::Poll { descriptor, .. }
            | Self::UnexpectedStatus { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
