//! EC2 resource management

mod instance;
mod key_pair;
mod security_group;
mod types;

pub use types::{
    CreatedKeyPair, IngressPermission, InstanceSummary, KeyMaterial, KeyPairSummary,
    LaunchedInstance, SecurityGroupSummary,
};

use crate::aws::context::AwsContext;
use aws_sdk_ec2::Client;

/// EC2 client bound to one region
#[derive(Clone)]
pub struct Ec2Client {
    pub(crate) client: Client,
    region: String,
}

impl Ec2Client {
    /// Create an EC2 client for `region` from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext, region: &str) -> Self {
        Self {
            client: ctx.ec2_client(region),
            region: region.to_string(),
        }
    }

    /// Region this client talks to
    pub fn region(&self) -> &str {
        &self.region
    }
}

impl std::fmt::Debug for Ec2Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ec2Client")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
