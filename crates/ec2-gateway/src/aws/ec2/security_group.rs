//! Security group and VPC lookups

use super::Ec2Client;
use super::types::{IngressPermission, SecurityGroupSummary};
use crate::aws::error::{ClassifyExt, ProviderError};
use crate::aws::tags;
use aws_sdk_ec2::types::{Filter, IpPermission, IpRange, ResourceType};
use ec2_gateway_common::IngressRule;
use tracing::{debug, info};

impl Ec2Client {
    /// IDs of the region's default VPCs.
    ///
    /// EC2 allows at most one default VPC per region, but the result is
    /// returned unfiltered so the caller decides what to do with zero or many.
    pub async fn describe_default_vpc(&self) -> Result<Vec<String>, ProviderError> {
        let vpcs = self
            .client
            .describe_vpcs()
            .filters(Filter::builder().name("isDefault").values("true").build())
            .send()
            .await
            .classify()?;

        let ids: Vec<String> = vpcs
            .vpcs()
            .iter()
            .filter_map(|v| v.vpc_id())
            .map(str::to_string)
            .collect();

        debug!(region = %self.region(), vpcs = ?ids, "Described default VPCs");
        Ok(ids)
    }

    /// Create an empty security group and return its id
    pub async fn create_security_group(
        &self,
        group_name: &str,
        description: &str,
        vpc_id: &str,
    ) -> Result<String, ProviderError> {
        info!(name = %group_name, vpc_id = %vpc_id, "Creating security group");

        let response = self
            .client
            .create_security_group()
            .group_name(group_name)
            .description(description)
            .vpc_id(vpc_id)
            .tag_specifications(tags::ec2_tag_spec(
                ResourceType::SecurityGroup,
                Some(group_name),
            ))
            .send()
            .await
            .classify()?;

        let sg_id = response
            .group_id()
            .ok_or_else(|| ProviderError::Sdk {
                code: None,
                message: "No security group ID in response".to_string(),
            })?
            .to_string();

        info!(sg_id = %sg_id, "Created security group");
        Ok(sg_id)
    }

    /// Authorize one ingress rule on a security group
    pub async fn authorize_ingress(
        &self,
        security_group_id: &str,
        rule: &IngressRule,
    ) -> Result<(), ProviderError> {
        info!(
            sg_id = %security_group_id,
            rule = %rule.label(),
            "Authorizing ingress rule"
        );

        let permission = IpPermission::builder()
            .ip_protocol(&rule.protocol)
            .from_port(i32::from(rule.port))
            .to_port(i32::from(rule.port))
            .ip_ranges(IpRange::builder().cidr_ip(&rule.cidr).build())
            .build();

        self.client
            .authorize_security_group_ingress()
            .group_id(security_group_id)
            .ip_permissions(permission)
            .send()
            .await
            .classify()?;

        debug!(sg_id = %security_group_id, "Ingress rule authorized");
        Ok(())
    }

    /// Delete a security group.
    ///
    /// A missing group surfaces as `InvalidGroup.NotFound`; nothing is retried.
    pub async fn delete_security_group(&self, security_group_id: &str) -> Result<(), ProviderError> {
        info!(sg_id = %security_group_id, "Deleting security group");

        self.client
            .delete_security_group()
            .group_id(security_group_id)
            .send()
            .await
            .classify()?;

        info!(sg_id = %security_group_id, "Security group deleted");
        Ok(())
    }

    /// List security groups in the region
    pub async fn list_security_groups(&self) -> Result<Vec<SecurityGroupSummary>, ProviderError> {
        let mut groups = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_security_groups()
                .set_next_token(next_token.take())
                .send()
                .await
                .classify()?;

            for sg in response.security_groups() {
                let Some(group_id) = sg.group_id() else {
                    continue;
                };
                groups.push(SecurityGroupSummary {
                    group_id: group_id.to_string(),
                    group_name: sg.group_name().unwrap_or_default().to_string(),
                    description: sg.description().unwrap_or_default().to_string(),
                    vpc_id: sg.vpc_id().map(str::to_string),
                    ingress: sg
                        .ip_permissions()
                        .iter()
                        .map(|p| IngressPermission {
                            protocol: p.ip_protocol().unwrap_or("-1").to_string(),
                            from_port: p.from_port(),
                            to_port: p.to_port(),
                            cidrs: p
                                .ip_ranges()
                                .iter()
                                .filter_map(|r| r.cidr_ip())
                                .map(str::to_string)
                                .collect(),
                        })
                        .collect(),
                });
            }

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(groups)
    }
}
