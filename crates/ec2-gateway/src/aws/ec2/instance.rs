//! EC2 instance lifecycle operations

use super::Ec2Client;
use super::types::{InstanceSummary, LaunchedInstance};
use crate::aws::error::{ClassifyExt, ProviderError};
use crate::aws::tags;
use aws_sdk_ec2::primitives::DateTimeFormat;
use aws_sdk_ec2::types::{Instance, InstanceType, ResourceType};
use ec2_gateway_common::{LaunchParameters, ResourceStatus};
use tracing::{debug, info};

/// Map an EC2 instance's state to the gateway status model
fn instance_status(instance: &Instance) -> ResourceStatus {
    instance
        .state()
        .and_then(|s| s.name())
        .and_then(|name| ResourceStatus::parse(name.as_str()))
        .unwrap_or(ResourceStatus::Unknown)
}

fn instance_not_found(instance_id: &str) -> ProviderError {
    ProviderError::NotFound {
        code: "InvalidInstanceID.NotFound".to_string(),
        message: format!("The instance ID '{instance_id}' does not exist"),
    }
}

impl Ec2Client {
    /// Launch a single EC2 instance.
    ///
    /// Instance creation is atomic on the provider side: either an id comes
    /// back or nothing was created.
    pub async fn launch_instance(
        &self,
        params: &LaunchParameters,
    ) -> Result<LaunchedInstance, ProviderError> {
        info!(
            instance_type = %params.instance_type,
            ami = %params.ami_id,
            region = %self.region(),
            "Launching instance"
        );

        let mut request = self
            .client
            .run_instances()
            .image_id(&params.ami_id)
            .instance_type(InstanceType::from(params.instance_type.as_str()))
            .min_count(1)
            .max_count(1)
            .tag_specifications(tags::ec2_tag_spec(ResourceType::Instance, None));

        if let Some(key_name) = &params.key_name {
            request = request.key_name(key_name);
        }

        if let Some(sg) = &params.security_group_id {
            request = request.security_group_ids(sg);
        }

        let response = request.send().await.classify()?;

        let instance = response
            .instances()
            .first()
            .ok_or_else(|| ProviderError::Sdk {
                code: None,
                message: "RunInstances returned no instance".to_string(),
            })?;

        let instance_id = instance
            .instance_id()
            .ok_or_else(|| ProviderError::Sdk {
                code: None,
                message: "RunInstances returned an instance without an id".to_string(),
            })?
            .to_string();

        info!(instance_id = %instance_id, "Instance launched");

        Ok(LaunchedInstance {
            instance_id,
            instance_type: params.instance_type.clone(),
            state: instance_status(instance),
        })
    }

    /// Start a stopped instance (no-op for a running one)
    pub async fn start_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        info!(instance_id = %instance_id, "Starting instance");

        self.client
            .start_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .classify()?;

        Ok(())
    }

    /// Stop a running instance (no-op for a stopped one)
    pub async fn stop_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        info!(instance_id = %instance_id, "Stopping instance");

        self.client
            .stop_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .classify()?;

        Ok(())
    }

    /// Terminate an instance
    pub async fn terminate_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        info!(instance_id = %instance_id, "Terminating instance");

        self.client
            .terminate_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .classify()?;

        Ok(())
    }

    /// Read the current lifecycle status of one instance
    pub async fn describe_instance_status(
        &self,
        instance_id: &str,
    ) -> Result<ResourceStatus, ProviderError> {
        let response = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .classify()?;

        let instance = response
            .reservations()
            .first()
            .and_then(|r| r.instances().first())
            .ok_or_else(|| instance_not_found(instance_id))?;

        let status = instance_status(instance);
        debug!(instance_id = %instance_id, status = %status, "Described instance");
        Ok(status)
    }

    /// List every instance in the region
    pub async fn describe_instances(&self) -> Result<Vec<InstanceSummary>, ProviderError> {
        let mut summaries = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_instances()
                .set_next_token(next_token.take())
                .send()
                .await
                .classify()?;

            for instance in response.reservations().iter().flat_map(|r| r.instances()) {
                let Some(instance_id) = instance.instance_id() else {
                    continue;
                };
                summaries.push(InstanceSummary {
                    instance_id: instance_id.to_string(),
                    instance_type: instance
                        .instance_type()
                        .map(|t| t.as_str().to_string())
                        .unwrap_or_default(),
                    state: instance_status(instance),
                    name: tags::name_tag(instance.tags()),
                    public_ip: instance.public_ip_address().map(str::to_string),
                    private_ip: instance.private_ip_address().map(str::to_string),
                    launch_time: instance
                        .launch_time()
                        .and_then(|t| t.fmt(DateTimeFormat::DateTime).ok()),
                });
            }

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(count = summaries.len(), region = %self.region(), "Described instances");
        Ok(summaries)
    }
}
