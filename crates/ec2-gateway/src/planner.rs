//! Operation planning
//!
//! Turns an [`Intent`] into an ordered list of provider calls. Steps that
//! create something carry the [`Compensation`] that undoes them, and
//! lifecycle plans carry the status to wait for.

use crate::compensation::Compensation;
use crate::error::GatewayError;
use crate::wait::WaitTarget;
use ec2_gateway_common::defaults::{transition_deadline, provision_deadline};
use ec2_gateway_common::{
    Action, IngressRule, Intent, IntentParameters, LaunchParameters, ResourceDescriptor,
    ResourceKind, ResourceStatus, SecurityGroupParameters,
};
use std::time::Duration;

/// Wait budgets per kind of transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    /// start / stop
    pub transition: Duration,
    /// launch / terminate
    pub provision: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            transition: transition_deadline(),
            provision: provision_deadline(),
        }
    }
}

/// Where the VPC for a new security group comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VpcSource {
    Given(String),
    AccountDefault,
}

/// The provider call a step makes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepCall {
    ResolveVpc(VpcSource),
    CreateSecurityGroup {
        group_name: String,
        description: String,
    },
    AuthorizeIngress(IngressRule),
    LaunchInstance(LaunchParameters),
    StartInstance,
    StopInstance,
    TerminateInstance,
    CreateKeyPair {
        key_name: String,
    },
    DeleteKeyPair {
        key_name: String,
    },
    DeleteSecurityGroup,
}

impl StepCall {
    /// Whether the call addresses a resource the caller claims already exists.
    ///
    /// A provider "not found" from such a call means the caller's target is
    /// missing rather than the plan having broken halfway.
    pub fn targets_existing_resource(&self) -> bool {
        matches!(
            self,
            Self::StartInstance
                | Self::StopInstance
                | Self::TerminateInstance
                | Self::DeleteKeyPair { .. }
                | Self::DeleteSecurityGroup
        )
    }
}

/// One ordered unit of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub call: StepCall,
    pub compensation: Option<Compensation>,
}

impl Step {
    fn new(name: impl Into<String>, call: StepCall) -> Self {
        Self {
            name: name.into(),
            call,
            compensation: None,
        }
    }

    fn compensated_by(mut self, compensation: Compensation) -> Self {
        self.compensation = Some(compensation);
        self
    }
}

/// Executable form of an intent
#[derive(Debug)]
pub struct Plan {
    pub action: Action,
    pub target: ResourceDescriptor,
    pub steps: Vec<Step>,
    /// Status to poll for after the steps, if the resource has transitions
    pub wait: Option<WaitTarget>,
    /// Status recorded once the plan has succeeded
    pub confirmed_status: ResourceStatus,
}

impl Plan {
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Builds plans from intents
#[derive(Debug, Clone, Default)]
pub struct Planner {
    deadlines: Deadlines,
}

fn invalid(message: impl Into<String>) -> GatewayError {
    GatewayError::InvalidIntent(message.into())
}

fn require_non_empty(value: &str, field: &str) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

impl Planner {
    pub fn new(deadlines: Deadlines) -> Self {
        Self { deadlines }
    }

    pub fn deadlines(&self) -> Deadlines {
        self.deadlines
    }

    /// Plan an intent, rejecting combinations that make no sense
    pub fn plan(&self, intent: Intent) -> Result<Plan, GatewayError> {
        let Intent {
            action,
            target,
            parameters,
        } = intent;

        require_non_empty(target.region(), "region")?;

        match (action, target.kind()) {
            (Action::Create, ResourceKind::Instance) => self.plan_launch(target, parameters),
            (Action::Create, ResourceKind::KeyPair) => Self::plan_create_key_pair(target, parameters),
            (Action::Create, ResourceKind::SecurityGroup) => {
                Self::plan_create_security_group(target, parameters)
            }
            (Action::Start | Action::Stop | Action::Terminate, ResourceKind::Instance) => {
                self.plan_transition(action, target, parameters)
            }
            (Action::Delete, ResourceKind::KeyPair) => Self::plan_delete_key_pair(target, parameters),
            (Action::Delete, ResourceKind::SecurityGroup) => {
                Self::plan_delete_security_group(target, parameters)
            }
            (Action::Delete, ResourceKind::Instance) => Err(invalid(
                "instances are removed with terminate, not delete",
            )),
            (action, kind) => Err(invalid(format!(
                "{action} is not supported for a {}",
                kind.label()
            ))),
        }
    }

    fn plan_launch(
        &self,
        target: ResourceDescriptor,
        parameters: IntentParameters,
    ) -> Result<Plan, GatewayError> {
        let IntentParameters::Launch(params) = parameters else {
            return Err(invalid("launching an instance needs launch parameters"));
        };
        if target.has_id() {
            return Err(invalid(format!(
                "cannot launch into an existing instance id '{}'",
                target.id()
            )));
        }
        require_non_empty(&params.ami_id, "ami_id")?;
        require_non_empty(&params.instance_type, "instance_type")?;

        Ok(Plan {
            action: Action::Create,
            target,
            steps: vec![Step::new("launch-instance", StepCall::LaunchInstance(params))],
            wait: Some(WaitTarget::new(
                ResourceStatus::Running,
                self.deadlines.provision,
            )),
            confirmed_status: ResourceStatus::Running,
        })
    }

    fn plan_transition(
        &self,
        action: Action,
        target: ResourceDescriptor,
        parameters: IntentParameters,
    ) -> Result<Plan, GatewayError> {
        if parameters != IntentParameters::None {
            return Err(invalid(format!("{action} takes no parameters")));
        }
        if !target.has_id() {
            return Err(invalid(format!("{action} needs an instance id")));
        }

        let (name, call, status, deadline) = match action {
            Action::Start => (
                "start-instance",
                StepCall::StartInstance,
                ResourceStatus::Running,
                self.deadlines.transition,
            ),
            Action::Stop => (
                "stop-instance",
                StepCall::StopInstance,
                ResourceStatus::Stopped,
                self.deadlines.transition,
            ),
            _ => (
                "terminate-instance",
                StepCall::TerminateInstance,
                ResourceStatus::Terminated,
                self.deadlines.provision,
            ),
        };

        Ok(Plan {
            action,
            target,
            steps: vec![Step::new(name, call)],
            wait: Some(WaitTarget::new(status, deadline)),
            confirmed_status: status,
        })
    }

    fn plan_create_key_pair(
        target: ResourceDescriptor,
        parameters: IntentParameters,
    ) -> Result<Plan, GatewayError> {
        let IntentParameters::KeyPair { key_name } = parameters else {
            return Err(invalid("creating a key pair needs a key name"));
        };
        require_non_empty(&key_name, "key_name")?;
        if target.has_id() {
            return Err(invalid("a key pair being created cannot have an id yet"));
        }
        let target = match target.name() {
            Some(name) if name != key_name => {
                return Err(invalid(format!(
                    "target name '{name}' does not match key name '{key_name}'"
                )));
            }
            Some(_) => target,
            None => target.with_name(key_name.clone()),
        };

        Ok(Plan {
            action: Action::Create,
            target,
            steps: vec![Step::new(
                "create-key-pair",
                StepCall::CreateKeyPair { key_name },
            )],
            wait: None,
            confirmed_status: ResourceStatus::Present,
        })
    }

    fn plan_delete_key_pair(
        target: ResourceDescriptor,
        parameters: IntentParameters,
    ) -> Result<Plan, GatewayError> {
        let key_name = match (&parameters, target.name()) {
            (IntentParameters::KeyPair { key_name }, _) => key_name.clone(),
            (IntentParameters::None, Some(name)) => name.to_string(),
            (IntentParameters::None, None) => {
                return Err(invalid("deleting a key pair needs its name"));
            }
            _ => return Err(invalid("unexpected parameters for key pair deletion")),
        };
        require_non_empty(&key_name, "key_name")?;

        Ok(Plan {
            action: Action::Delete,
            target,
            steps: vec![Step::new(
                "delete-key-pair",
                StepCall::DeleteKeyPair { key_name },
            )],
            wait: None,
            confirmed_status: ResourceStatus::Absent,
        })
    }

    fn plan_create_security_group(
        target: ResourceDescriptor,
        parameters: IntentParameters,
    ) -> Result<Plan, GatewayError> {
        let IntentParameters::SecurityGroup(SecurityGroupParameters {
            group_name,
            description,
            vpc_id,
            rules,
        }) = parameters
        else {
            return Err(invalid("creating a security group needs group parameters"));
        };
        require_non_empty(&group_name, "group_name")?;
        require_non_empty(&description, "description")?;
        if target.has_id() {
            return Err(invalid("a security group being created cannot have an id yet"));
        }
        for rule in &rules {
            require_non_empty(&rule.protocol, "rule protocol")?;
            require_non_empty(&rule.cidr, "rule cidr")?;
        }

        let source = match vpc_id {
            Some(id) if !id.trim().is_empty() => VpcSource::Given(id),
            _ => VpcSource::AccountDefault,
        };

        let target = if target.name().is_some() {
            target
        } else {
            target.with_name(group_name.clone())
        };

        let mut steps = Vec::with_capacity(rules.len() + 2);
        steps.push(Step::new("resolve-vpc", StepCall::ResolveVpc(source)));
        steps.push(
            Step::new(
                "create-security-group",
                StepCall::CreateSecurityGroup {
                    group_name,
                    description,
                },
            )
            .compensated_by(Compensation::DeleteCreated(ResourceKind::SecurityGroup)),
        );
        steps.extend(rules.into_iter().map(|rule| {
            Step::new(
                format!("authorize-ingress {}", rule.label()),
                StepCall::AuthorizeIngress(rule),
            )
        }));

        Ok(Plan {
            action: Action::Create,
            target,
            steps,
            wait: None,
            confirmed_status: ResourceStatus::Present,
        })
    }

    fn plan_delete_security_group(
        target: ResourceDescriptor,
        parameters: IntentParameters,
    ) -> Result<Plan, GatewayError> {
        if parameters != IntentParameters::None {
            return Err(invalid("deleting a security group takes no parameters"));
        }
        if !target.has_id() {
            return Err(invalid("deleting a security group needs its id"));
        }

        Ok(Plan {
            action: Action::Delete,
            target,
            steps: vec![Step::new(
                "delete-security-group",
                StepCall::DeleteSecurityGroup,
            )],
            wait: None,
            confirmed_status: ResourceStatus::Absent,
        })
    }
}
