//! Shared AWS configuration context
//!
//! Provides `AwsContext` for loading AWS SDK configuration once at startup
//! and creating region-bound providers from it per request.

use crate::aws::provider::{AwsProvider, ProviderFactory};
use crate::config::AwsSettings;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_ec2::config::Credentials;
use std::sync::Arc;
use tracing::debug;

/// Shared AWS configuration context for creating service clients.
///
/// Credentials come from the explicit [`AwsSettings`] handed in at startup;
/// the loaded config is immutable afterwards and shared by every request.
///
/// # Example
/// ```ignore
/// let aws = AwsContext::new(&settings).await;
///
/// // One provider per request, bound to the request's region
/// let provider = aws.for_region("eu-west-1");
/// ```
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Load AWS configuration from the given settings.
    ///
    /// Static keys take precedence over the named profile; with neither, the
    /// SDK's default credential chain is used.
    pub async fn new(settings: &AwsSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));

        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }

        if let Some(keys) = &settings.static_credentials {
            debug!(access_key_id = %keys.access_key_id, "Using static AWS credentials");
            loader = loader.credentials_provider(Credentials::new(
                keys.access_key_id.clone(),
                keys.secret_access_key.clone(),
                keys.session_token.clone(),
                None,
                "ec2-gateway-settings",
            ));
        }

        Self::from_sdk_config(loader.load().await)
    }

    /// Wrap an already loaded SDK config
    pub fn from_sdk_config(config: SdkConfig) -> Self {
        let region = config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_default();
        Self {
            config: Arc::new(config),
            region,
        }
    }

    /// Get the underlying SDK config for direct client construction.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// Get the default region string.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// SDK config with the region overridden
    pub fn config_for_region(&self, region: &str) -> SdkConfig {
        if region == self.region {
            return self.config.as_ref().clone();
        }
        self.config
            .to_builder()
            .region(Region::new(region.to_string()))
            .build()
    }

    /// Create an EC2 client for the given region.
    pub fn ec2_client(&self, region: &str) -> aws_sdk_ec2::Client {
        aws_sdk_ec2::Client::new(&self.config_for_region(region))
    }

    /// Create an STS client for the given region.
    pub fn sts_client(&self, region: &str) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(&self.config_for_region(region))
    }
}

impl ProviderFactory for AwsContext {
    type Provider = AwsProvider;

    fn for_region(&self, region: &str) -> AwsProvider {
        AwsProvider::from_context(self, region)
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
