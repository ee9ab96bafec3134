//! Gateway: plan, execute, compensate, wait
//!
//! [`Gateway::execute`] is the single entry point for mutating operations.
//! Steps run strictly in order; on failure the completed steps are
//! compensated newest first and the failure is returned with the rollback
//! outcome attached. Instance transitions return only once the provider
//! confirms the target status.

use crate::aws::account::CallerIdentity;
use crate::aws::ec2::{InstanceSummary, KeyMaterial, KeyPairSummary, SecurityGroupSummary};
use crate::aws::error::ProviderError;
use crate::aws::provider::{CloudProvider, ProviderFactory};
use crate::compensation::{CompensationLedger, CompensationOutcome};
use crate::error::GatewayError;
use crate::planner::{Deadlines, Plan, Planner, Step, StepCall, VpcSource};
use crate::wait::{PollConfig, Poller, WaitError, WaitReport, WaitTarget};
use ec2_gateway_common::{DescriptorError, Intent, Observation, ResourceDescriptor};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Tuning shared by every gateway built from the same configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GatewaySettings {
    pub poll: PollConfig,
    pub deadlines: Deadlines,
}

/// Result of a successful execution
#[derive(Debug)]
pub struct Execution {
    pub descriptor: ResourceDescriptor,
    /// Private key returned by key pair creation; EC2 never returns it again
    pub key_material: Option<KeyMaterial>,
    /// Poll statistics when the plan waited for a transition
    pub wait: Option<WaitReport>,
}

/// Values produced by earlier steps and consumed by later ones
#[derive(Debug, Default)]
struct StepContext {
    vpc_id: Option<String>,
    key_material: Option<KeyMaterial>,
}

/// Why a single step failed
#[derive(Debug)]
enum StepFailure {
    Provider(ProviderError),
    Resolution { what: String, reason: String },
    Descriptor(DescriptorError),
}

impl From<ProviderError> for StepFailure {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e)
    }
}

impl From<DescriptorError> for StepFailure {
    fn from(e: DescriptorError) -> Self {
        Self::Descriptor(e)
    }
}

/// Executes intents against one region-bound provider
#[derive(Debug)]
pub struct Gateway<P> {
    provider: Arc<P>,
    planner: Planner,
    poller: Poller,
}

impl<P> Clone for Gateway<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            planner: self.planner.clone(),
            poller: self.poller.clone(),
        }
    }
}

impl<P: CloudProvider + 'static> Gateway<P> {
    pub fn new(provider: P, settings: GatewaySettings) -> Self {
        Self {
            provider: Arc::new(provider),
            planner: Planner::new(settings.deadlines),
            poller: Poller::new(settings.poll),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Execute an intent and return the provider-confirmed descriptor
    pub async fn execute(&self, intent: Intent) -> Result<ResourceDescriptor, GatewayError> {
        self.execute_with_artifacts(intent)
            .await
            .map(|execution| execution.descriptor)
    }

    /// Execute an intent and also return what the provider hands out only
    /// once (key material) plus poll statistics.
    ///
    /// The plan runs on its own task. Dropping the returned future cancels
    /// it, and the task still rolls back whatever it had already created.
    pub async fn execute_with_artifacts(&self, intent: Intent) -> Result<Execution, GatewayError> {
        let plan = self.planner.plan(intent)?;

        let cancel = CancellationToken::new();
        let _abandon_on_drop = cancel.clone().drop_guard();

        let gateway = self.clone();
        let task = tokio::spawn(async move { gateway.run_plan(plan, cancel).await });

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(GatewayError::Cancelled {
                step: "plan".into(),
                compensation: CompensationOutcome::NotRequired,
            }),
        }
    }

    async fn run_plan(&self, plan: Plan, cancel: CancellationToken) -> Result<Execution, GatewayError> {
        let Plan {
            action,
            mut target,
            steps,
            wait,
            confirmed_status,
        } = plan;

        info!(
            action = %action,
            resource = %target.description(),
            region = %target.region(),
            steps = steps.len(),
            "Executing plan"
        );

        let mut ledger = CompensationLedger::new();
        let mut ctx = StepContext::default();

        for step in &steps {
            if cancel.is_cancelled() {
                return Err(self.abandon(step, &target, ledger).await);
            }

            debug!(step = %step.name, "Running step");
            // A call that created something must be allowed to land, or its
            // id is lost. Once the ledger holds a resource, rolling it back
            // also undoes an in-flight call against it.
            let outcome = if ledger.is_empty() {
                Some(self.run_step(step, &mut target, &mut ctx).await)
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = self.run_step(step, &mut target, &mut ctx) => Some(result),
                }
            };

            match outcome {
                None => return Err(self.abandon(step, &target, ledger).await),
                Some(Err(failure)) => return Err(self.fail(step, failure, &target, ledger).await),
                Some(Ok(())) => {}
            }

            if let (Some(compensation), Some(handle)) = (step.compensation, target.handle()) {
                ledger.record(step.name.clone(), compensation, handle);
            }
        }

        let generation = target.record_mutation();

        let report = match wait {
            Some(wait_target) => Some(
                self.await_status(&mut target, wait_target, generation, &cancel)
                    .await?,
            ),
            None => {
                target.observe(Observation::new(confirmed_status, generation))?;
                None
            }
        };

        info!(
            action = %action,
            resource = %target.description(),
            status = %target.status(),
            generation,
            "Plan complete"
        );

        Ok(Execution {
            descriptor: target,
            key_material: ctx.key_material,
            wait: report,
        })
    }

    async fn run_step(
        &self,
        step: &Step,
        target: &mut ResourceDescriptor,
        ctx: &mut StepContext,
    ) -> Result<(), StepFailure> {
        match &step.call {
            StepCall::ResolveVpc(VpcSource::Given(vpc_id)) => {
                ctx.vpc_id = Some(vpc_id.clone());
            }
            StepCall::ResolveVpc(VpcSource::AccountDefault) => {
                ctx.vpc_id = Some(self.resolve_default_vpc().await?);
            }
            StepCall::CreateSecurityGroup {
                group_name,
                description,
            } => {
                let vpc_id = ctx.vpc_id.as_deref().ok_or_else(|| StepFailure::Resolution {
                    what: "VPC".into(),
                    reason: "no VPC was resolved before creating the group".into(),
                })?;
                let group_id = self
                    .provider
                    .create_security_group(group_name, description, vpc_id)
                    .await?;
                target.assign_id(group_id)?;
            }
            StepCall::AuthorizeIngress(rule) => {
                self.provider.authorize_ingress(target.id(), rule).await?;
            }
            StepCall::LaunchInstance(params) => {
                let launched = self.provider.create_instance(params).await?;
                target.assign_id(launched.instance_id)?;
            }
            StepCall::StartInstance => self.provider.start_instance(target.id()).await?,
            StepCall::StopInstance => self.provider.stop_instance(target.id()).await?,
            StepCall::TerminateInstance => self.provider.terminate_instance(target.id()).await?,
            StepCall::CreateKeyPair { key_name } => {
                let created = self.provider.create_key_pair(key_name).await?;
                if !created.key_pair_id.is_empty() {
                    target.assign_id(created.key_pair_id)?;
                }
                ctx.key_material = Some(created.key_material);
            }
            StepCall::DeleteKeyPair { key_name } => {
                self.provider.delete_key_pair(key_name).await?;
            }
            StepCall::DeleteSecurityGroup => {
                self.provider.delete_security_group(target.id()).await?;
            }
        }
        Ok(())
    }

    /// Exactly one default VPC must exist
    async fn resolve_default_vpc(&self) -> Result<String, StepFailure> {
        let mut vpcs = self.provider.describe_default_vpc().await?;
        match vpcs.len() {
            1 => Ok(vpcs.remove(0)),
            0 => Err(StepFailure::Resolution {
                what: "default VPC".into(),
                reason: "the region has no default VPC; pass vpc_id explicitly".into(),
            }),
            _ => Err(StepFailure::Resolution {
                what: "default VPC".into(),
                reason: format!(
                    "found {} default VPCs ({}); pass vpc_id explicitly",
                    vpcs.len(),
                    vpcs.join(", ")
                ),
            }),
        }
    }

    /// Roll back after the caller went away
    async fn abandon(
        &self,
        step: &Step,
        target: &ResourceDescriptor,
        ledger: CompensationLedger,
    ) -> GatewayError {
        let compensation = ledger.rollback(self.provider.as_ref()).await;
        warn!(
            step = %step.name,
            resource = %target.description(),
            compensation = %compensation,
            "Caller went away, plan abandoned"
        );
        GatewayError::Cancelled {
            step: step.name.clone(),
            compensation,
        }
    }

    /// Roll back completed steps and classify the failure
    async fn fail(
        &self,
        step: &Step,
        failure: StepFailure,
        target: &ResourceDescriptor,
        ledger: CompensationLedger,
    ) -> GatewayError {
        let nothing_to_undo = ledger.is_empty();
        let compensation = ledger.rollback(self.provider.as_ref()).await;
        if !compensation.is_clean() {
            error!(
                step = %step.name,
                resource = %target.description(),
                compensation = %compensation,
                "Rollback incomplete"
            );
        }

        match failure {
            StepFailure::Resolution { what, reason } => {
                warn!(step = %step.name, what = %what, reason = %reason, "Resolution failed");
                GatewayError::ResourceResolution { what, reason }
            }
            StepFailure::Descriptor(e) => {
                warn!(step = %step.name, error = %e, "Descriptor rejected provider response");
                GatewayError::Descriptor(e)
            }
            StepFailure::Provider(cause)
                if nothing_to_undo && cause.is_not_found() && step.call.targets_existing_resource() =>
            {
                warn!(resource = %target.description(), "Resource not found");
                GatewayError::NotFound {
                    kind: target.kind(),
                    handle: target.handle().unwrap_or_default().to_string(),
                    cause,
                }
            }
            StepFailure::Provider(cause @ ProviderError::Unauthorized { .. })
                if compensation == CompensationOutcome::NotRequired =>
            {
                warn!(step = %step.name, error = %cause, "Credentials rejected");
                GatewayError::Credential { cause }
            }
            StepFailure::Provider(cause) => {
                warn!(
                    step = %step.name,
                    resource = %target.description(),
                    error = %cause,
                    compensation = %compensation,
                    "Step failed"
                );
                GatewayError::PlanExecution {
                    step: step.name.clone(),
                    cause,
                    compensation,
                }
            }
        }
    }

    /// Poll until the instance reaches the target and record the observation
    async fn await_status(
        &self,
        target: &mut ResourceDescriptor,
        wait: WaitTarget,
        generation: u64,
        cancel: &CancellationToken,
    ) -> Result<WaitReport, GatewayError> {
        let provider = self.provider.as_ref();
        let instance_id = target.id().to_string();
        let instance_id = instance_id.as_str();

        let result = self
            .poller
            .wait_for(target, wait, Some(cancel), move || {
                provider.describe_instance_status(instance_id)
            })
            .await;

        match result {
            Ok(report) => {
                target.observe(Observation::new(report.status, generation))?;
                Ok(report)
            }
            Err(WaitError::Timeout {
                target: wanted,
                last_status,
                elapsed,
                intervals,
            }) => {
                target.observe(Observation::new(last_status, generation))?;
                Err(GatewayError::WaitTimeout {
                    descriptor: Box::new(target.clone()),
                    target: wanted,
                    last_status,
                    elapsed,
                    intervals,
                })
            }
            Err(WaitError::ReadFailed { attempts, cause }) => Err(GatewayError::Poll {
                descriptor: Box::new(target.clone()),
                attempts,
                cause,
            }),
            Err(WaitError::Unreachable {
                target: wanted,
                observed,
            }) => {
                target.observe(Observation::new(observed, generation))?;
                Err(GatewayError::UnexpectedStatus {
                    descriptor: Box::new(target.clone()),
                    target: wanted,
                    observed,
                })
            }
            Err(WaitError::Cancelled { last_status }) => {
                target.observe(Observation::new(last_status, generation))?;
                Err(GatewayError::Cancelled {
                    step: format!("wait for {}", wait.status),
                    compensation: CompensationOutcome::NotRequired,
                })
            }
        }
    }

    /// Map a failed read-only call
    fn read_failure(call: &str, cause: ProviderError) -> GatewayError {
        match cause {
            ProviderError::Unauthorized { .. } => GatewayError::Credential { cause },
            cause => GatewayError::PlanExecution {
                step: call.to_string(),
                cause,
                compensation: CompensationOutcome::NotRequired,
            },
        }
    }

    pub async fn describe_instances(&self) -> Result<Vec<InstanceSummary>, GatewayError> {
        self.provider
            .describe_instances()
            .await
            .map_err(|e| Self::read_failure("describe-instances", e))
    }

    pub async fn list_key_pairs(&self) -> Result<Vec<KeyPairSummary>, GatewayError> {
        self.provider
            .list_key_pairs()
            .await
            .map_err(|e| Self::read_failure("list-key-pairs", e))
    }

    pub async fn list_security_groups(&self) -> Result<Vec<SecurityGroupSummary>, GatewayError> {
        self.provider
            .list_security_groups()
            .await
            .map_err(|e| Self::read_failure("list-security-groups", e))
    }

    /// Identity of the configured credentials; any failure is a credential
    /// problem from the caller's point of view
    pub async fn caller_identity(&self) -> Result<CallerIdentity, GatewayError> {
        self.provider
            .get_caller_identity()
            .await
            .map_err(|cause| GatewayError::Credential { cause })
    }
}

/// Gateway for one region, built from a provider factory
pub fn gateway_for<F: ProviderFactory>(
    factory: &F,
    region: &str,
    settings: GatewaySettings,
) -> Gateway<F::Provider> {
    Gateway::new(factory.for_region(region), settings)
}
