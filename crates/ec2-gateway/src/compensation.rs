//! Compensation ledger for partially executed plans
//!
//! Every completed step that created something records how to undo it.
//! On failure the ledger is unwound in reverse order; a resource that is
//! already gone counts as rolled back.

use crate::aws::error::ProviderError;
use crate::aws::provider::CloudProvider;
use ec2_gateway_common::ResourceKind;
use std::fmt;
use tracing::{info, warn};

/// Undo action attached to a plan step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compensation {
    /// Delete the resource the step created
    DeleteCreated(ResourceKind),
}

/// A concrete undo recorded after its step succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
struct LedgerEntry {
    step: String,
    kind: ResourceKind,
    handle: String,
}

/// One compensation that could not be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompensationFailure {
    pub step: String,
    pub cause: ProviderError,
}

/// What happened to the completed steps of a failed plan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompensationOutcome {
    /// Nothing had been created yet
    #[default]
    NotRequired,
    /// Every recorded compensation ran
    Succeeded { steps: Vec<String> },
    /// At least one compensation failed; the resource may still exist
    Failed {
        succeeded: Vec<String>,
        failures: Vec<CompensationFailure>,
    },
}

impl CompensationOutcome {
    /// True unless a compensation failed
    pub fn is_clean(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for CompensationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequired => write!(f, "nothing to roll back"),
            Self::Succeeded { steps } => write!(f, "rolled back {}", steps.join(", ")),
            Self::Failed { failures, .. } => {
                write!(f, "rollback incomplete: ")?;
                for (i, failure) in failures.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{} ({})", failure.step, failure.cause)?;
                }
                Ok(())
            }
        }
    }
}

/// Undo actions for the steps completed so far, in execution order
#[derive(Debug, Default)]
pub struct CompensationLedger {
    entries: Vec<LedgerEntry>,
}

impl CompensationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the undo for a step that just created `handle`
    pub fn record(&mut self, step: impl Into<String>, compensation: Compensation, handle: &str) {
        let Compensation::DeleteCreated(kind) = compensation;
        self.entries.push(LedgerEntry {
            step: step.into(),
            kind,
            handle: handle.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Run every recorded compensation, newest first.
    ///
    /// A failing compensation does not stop the others.
    pub async fn rollback<P: CloudProvider>(self, provider: &P) -> CompensationOutcome {
        if self.entries.is_empty() {
            return CompensationOutcome::NotRequired;
        }

        let mut succeeded = Vec::new();
        let mut failures = Vec::new();

        for entry in self.entries.into_iter().rev() {
            let result = match entry.kind {
                ResourceKind::Instance => provider.terminate_instance(&entry.handle).await,
                ResourceKind::KeyPair => provider.delete_key_pair(&entry.handle).await,
                ResourceKind::SecurityGroup => provider.delete_security_group(&entry.handle).await,
            };

            match result {
                Ok(()) => {
                    info!(
                        step = %entry.step,
                        resource = %entry.handle,
                        "Compensated {}",
                        entry.kind.label()
                    );
                    succeeded.push(entry.step);
                }
                Err(e) if e.is_not_found() => {
                    info!(step = %entry.step, resource = %entry.handle, "Already gone");
                    succeeded.push(entry.step);
                }
                Err(cause) => {
                    warn!(
                        step = %entry.step,
                        resource = %entry.handle,
                        error = %cause,
                        "Compensation failed, resource may be orphaned"
                    );
                    failures.push(CompensationFailure {
                        step: entry.step,
                        cause,
                    });
                }
            }
        }

        if failures.is_empty() {
            CompensationOutcome::Succeeded { steps: succeeded }
        } else {
            CompensationOutcome::Failed {
                succeeded,
                failures,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::provider::MockCloudProvider;
    use crate::testing::FakeCloud;
    use mockall::Sequence;

    #[tokio::test]
    async fn empty_ledger_needs_nothing() {
        // No expectations: any provider call fails the test
        let provider = MockCloudProvider::new();
        let outcome = CompensationLedger::new().rollback(&provider).await;
        assert_eq!(outcome, CompensationOutcome::NotRequired);
    }

    #[tokio::test]
    async fn unwinds_newest_first() {
        let mut provider = MockCloudProvider::new();
        let mut seq = Sequence::new();
        provider
            .expect_delete_key_pair()
            .withf(|key_name| key_name == "ops")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(std::future::ready(Ok(()))));
        provider
            .expect_delete_security_group()
            .withf(|group_id| group_id == "sg-web")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Box::pin(std::future::ready(Ok(()))));

        let mut ledger = CompensationLedger::new();
        ledger.record(
            "create-security-group",
            Compensation::DeleteCreated(ResourceKind::SecurityGroup),
            "sg-web",
        );
        ledger.record(
            "create-key-pair",
            Compensation::DeleteCreated(ResourceKind::KeyPair),
            "ops",
        );
        assert_eq!(ledger.len(), 2);

        let outcome = ledger.rollback(&provider).await;
        assert_eq!(
            outcome,
            CompensationOutcome::Succeeded {
                steps: vec!["create-key-pair".into(), "create-security-group".into()]
            }
        );
    }

    #[tokio::test]
    async fn missing_resource_counts_as_rolled_back() {
        let cloud = FakeCloud::new();
        let mut ledger = CompensationLedger::new();
        ledger.record(
            "create-security-group",
            Compensation::DeleteCreated(ResourceKind::SecurityGroup),
            "sg-gone",
        );

        let outcome = ledger.rollback(&cloud).await;
        assert!(outcome.is_clean());
        assert!(matches!(outcome, CompensationOutcome::Succeeded { .. }));
    }

    #[tokio::test]
    async fn failures_are_reported_not_hidden() {
        let cloud = FakeCloud::new().fail_group_deletes();
        let sg = cloud.seed_security_group("web", "vpc-default");

        let mut ledger = CompensationLedger::new();
        ledger.record(
            "create-security-group",
            Compensation::DeleteCreated(ResourceKind::SecurityGroup),
            &sg,
        );

        let outcome = ledger.rollback(&cloud).await;
        assert!(!outcome.is_clean());
        let CompensationOutcome::Failed { failures, .. } = &outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            failures[0].cause,
            ProviderError::DependencyViolation { .. }
        ));
        assert!(outcome.to_string().contains("rollback incomplete"));
    }
}
