//! Cloud provider seam
//!
//! The gateway talks to the cloud only through [`CloudProvider`]. The AWS
//! implementation binds an EC2 and an STS client to one region.

use crate::aws::account::{self, CallerIdentity};
use crate::aws::context::AwsContext;
use crate::aws::ec2::{
    CreatedKeyPair, Ec2Client, InstanceSummary, KeyPairSummary, LaunchedInstance,
    SecurityGroupSummary,
};
use crate::aws::error::ProviderError;
use ec2_gateway_common::{IngressRule, LaunchParameters, ResourceStatus};
use std::future::Future;

/// Outbound operations against one region of the cloud.
///
/// Every call is a single provider request with no automatic retry; the
/// poller is the only place reads are repeated.
#[cfg_attr(test, mockall::automock)]
pub trait CloudProvider: Send + Sync {
    fn create_instance(
        &self,
        params: &LaunchParameters,
    ) -> impl Future<Output = Result<LaunchedInstance, ProviderError>> + Send;

    fn start_instance(
        &self,
        instance_id: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    fn stop_instance(
        &self,
        instance_id: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    fn terminate_instance(
        &self,
        instance_id: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Current lifecycle status; `NotFound` if the instance does not exist
    fn describe_instance_status(
        &self,
        instance_id: &str,
    ) -> impl Future<Output = Result<ResourceStatus, ProviderError>> + Send;

    fn describe_instances(
        &self,
    ) -> impl Future<Output = Result<Vec<InstanceSummary>, ProviderError>> + Send;

    fn create_key_pair(
        &self,
        key_name: &str,
    ) -> impl Future<Output = Result<CreatedKeyPair, ProviderError>> + Send;

    /// Delete a key pair; `NotFound` if no key pair has that name
    fn delete_key_pair(
        &self,
        key_name: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    fn list_key_pairs(
        &self,
    ) -> impl Future<Output = Result<Vec<KeyPairSummary>, ProviderError>> + Send;

    /// Create an empty security group and return its id
    fn create_security_group(
        &self,
        group_name: &str,
        description: &str,
        vpc_id: &str,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;

    fn authorize_ingress(
        &self,
        group_id: &str,
        rule: &IngressRule,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    fn delete_security_group(
        &self,
        group_id: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    fn list_security_groups(
        &self,
    ) -> impl Future<Output = Result<Vec<SecurityGroupSummary>, ProviderError>> + Send;

    /// IDs of the region's default VPCs (normally zero or one)
    fn describe_default_vpc(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, ProviderError>> + Send;

    fn get_caller_identity(
        &self,
    ) -> impl Future<Output = Result<CallerIdentity, ProviderError>> + Send;
}

/// Creates region-bound providers from shared, immutable credentials
pub trait ProviderFactory: Send + Sync + 'static {
    type Provider: CloudProvider + 'static;

    fn for_region(&self, region: &str) -> Self::Provider;
}

/// [`CloudProvider`] backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct AwsProvider {
    ec2: Ec2Client,
    sts: aws_sdk_sts::Client,
}

impl AwsProvider {
    pub fn from_context(ctx: &AwsContext, region: &str) -> Self {
        Self {
            ec2: Ec2Client::from_context(ctx, region),
            sts: ctx.sts_client(region),
        }
    }

    pub fn region(&self) -> &str {
        self.ec2.region()
    }
}

impl CloudProvider for AwsProvider {
    async fn create_instance(
        &self,
        params: &LaunchParameters,
    ) -> Result<LaunchedInstance, ProviderError> {
        self.ec2.launch_instance(params).await
    }

    async fn start_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.ec2.start_instance(instance_id).await
    }

    async fn stop_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.ec2.stop_instance(instance_id).await
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.ec2.terminate_instance(instance_id).await
    }

    async fn describe_instance_status(
        &self,
        instance_id: &str,
    ) -> Result<ResourceStatus, ProviderError> {
        self.ec2.describe_instance_status(instance_id).await
    }

    async fn describe_instances(&self) -> Result<Vec<InstanceSummary>, ProviderError> {
        self.ec2.describe_instances().await
    }

    async fn create_key_pair(&self, key_name: &str) -> Result<CreatedKeyPair, ProviderError> {
        self.ec2.create_key_pair(key_name).await
    }

    async fn delete_key_pair(&self, key_name: &str) -> Result<(), ProviderError> {
        self.ec2.delete_key_pair(key_name).await
    }

    async fn list_key_pairs(&self) -> Result<Vec<KeyPairSummary>, ProviderError> {
        self.ec2.list_key_pairs().await
    }

    async fn create_security_group(
        &self,
        group_name: &str,
        description: &str,
        vpc_id: &str,
    ) -> Result<String, ProviderError> {
        self.ec2
            .create_security_group(group_name, description, vpc_id)
            .await
    }

    async fn authorize_ingress(
        &self,
        group_id: &str,
        rule: &IngressRule,
    ) -> Result<(), ProviderError> {
        self.ec2.authorize_ingress(group_id, rule).await
    }

    async fn delete_security_group(&self, group_id: &str) -> Result<(), ProviderError> {
        self.ec2.delete_security_group(group_id).await
    }

    async fn list_security_groups(&self) -> Result<Vec<SecurityGroupSummary>, ProviderError> {
        self.ec2.list_security_groups().await
    }

    async fn describe_default_vpc(&self) -> Result<Vec<String>, ProviderError> {
        self.ec2.describe_default_vpc().await
    }

    async fn get_caller_identity(&self) -> Result<CallerIdentity, ProviderError> {
        account::get_caller_identity(&self.sts).await
    }
}
