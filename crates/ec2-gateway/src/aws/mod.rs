//! AWS adapter for the gateway
//!
//! - context: SDK configuration loaded once at startup
//! - ec2: instances, key pairs, security groups, VPC lookup
//! - account: STS caller identity
//! - provider: the `CloudProvider` seam and its AWS implementation

pub mod account;
pub mod context;
pub mod ec2;
pub mod error;
pub mod provider;
pub mod tags;

pub use account::{AccountId, CallerIdentity, get_caller_identity};
pub use context::AwsContext;
pub use ec2::{
    CreatedKeyPair, Ec2Client, IngressPermission, InstanceSummary, KeyMaterial, KeyPairSummary,
    LaunchedInstance, SecurityGroupSummary,
};
pub use error::{ClassifyExt, ProviderError, classify_aws_error, classify_sdk_error};
pub use provider::{AwsProvider, CloudProvider, ProviderFactory};
