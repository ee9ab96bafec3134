//! ec2-gateway-common - Shared resource model
//!
//! This crate provides the resource model shared by the gateway core and its
//! adapters, without any AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`descriptor`]: Uniform resource descriptor
//! - [`intent`]: Operation intents and their parameters
//! - [`resource_kind`]: Managed resource kinds
//! - [`status`]: Provider-reported lifecycle status
//! - [`tags`]: AWS resource tag constants

pub mod defaults;
pub mod descriptor;
pub mod intent;
pub mod resource_kind;
pub mod status;
pub mod tags;

// Re-export commonly used types
pub use descriptor::{DescriptorError, Observation, ResourceDescriptor};
pub use intent::{
    Action, IngressRule, Intent, IntentParameters, LaunchParameters, SecurityGroupParameters,
};
pub use resource_kind::ResourceKind;
pub use status::ResourceStatus;
