//! Request and response bodies of the HTTP adapter

use crate::wait::WaitReport;
use ec2_gateway_common::defaults::default_region;
use ec2_gateway_common::{
    IngressRule, Intent, LaunchParameters, ResourceDescriptor, SecurityGroupParameters,
};
use serde::{Deserialize, Serialize};

/// `?region=` on routes that address an existing resource
#[derive(Debug, Default, Deserialize)]
pub struct RegionQuery {
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InstanceLaunchRequest {
    pub instance_type: String,
    pub ami_id: String,
    #[serde(default)]
    pub key_name: Option<String>,
    #[serde(default)]
    pub security_group_id: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
}

impl InstanceLaunchRequest {
    pub fn into_intent(self) -> Intent {
        let mut params = LaunchParameters::new(self.ami_id, self.instance_type);
        params.key_name = self.key_name.filter(|k| !k.is_empty());
        params.security_group_id = self.security_group_id.filter(|s| !s.is_empty());
        Intent::launch(self.region, params)
    }
}

#[derive(Debug, Deserialize)]
pub struct KeyPairRequest {
    pub key_name: String,
    #[serde(default = "default_region")]
    pub region: String,
}

impl KeyPairRequest {
    pub fn into_intent(self) -> Intent {
        Intent::create_key_pair(self.region, self.key_name)
    }
}

#[derive(Debug, Deserialize)]
pub struct SecurityGroupRequest {
    pub group_name: String,
    pub description: String,
    #[serde(default)]
    pub vpc_id: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub rules: Vec<IngressRule>,
}

impl SecurityGroupRequest {
    pub fn into_intent(self) -> Intent {
        Intent::create_security_group(
            self.region,
            SecurityGroupParameters {
                group_name: self.group_name,
                description: self.description,
                vpc_id: self.vpc_id,
                rules: self.rules,
            },
        )
    }
}

/// Poll statistics included when an operation waited for a transition
#[derive(Debug, Serialize)]
pub struct WaitSummary {
    pub polls: u32,
    pub elapsed_secs: f64,
}

impl From<&WaitReport> for WaitSummary {
    fn from(report: &WaitReport) -> Self {
        Self {
            polls: report.polls,
            elapsed_secs: report.elapsed.as_secs_f64(),
        }
    }
}

/// Body returned by every mutating route except key pair creation
#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub resource: ResourceDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<WaitSummary>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub details: serde_json::Value,
}

/// Strip characters that would break a `Content-Disposition` filename
pub fn pem_filename(key_name: &str) -> String {
    let stem: String = key_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.pem")
}
