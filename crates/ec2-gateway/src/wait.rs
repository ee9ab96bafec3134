//! Status polling with exponential backoff and a deadline.
//!
//! The [`Poller`] repeatedly reads a resource's status until it matches a
//! target, the target becomes unreachable, reads keep failing, the caller
//! cancels, or the deadline passes. Delays come from `backon::ExponentialBuilder` without
//! jitter, so the schedule is deterministic: 2s, 4s, 8s, 16s, 32s, 32s, ...

use crate::aws::error::ProviderError;
use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use ec2_gateway_common::ResourceDescriptor;
use ec2_gateway_common::ResourceStatus;
use ec2_gateway_common::defaults::{
    DEFAULT_POLL_BASE_SECS, DEFAULT_POLL_MAX_SECS, DEFAULT_POLL_READ_RETRIES,
};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Backoff tuning for status polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay after the first non-matching read
    pub base_interval: Duration,
    /// Cap for exponential growth
    pub max_interval: Duration,
    /// Consecutive failed reads tolerated before giving up
    pub max_read_retries: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(DEFAULT_POLL_BASE_SECS),
            max_interval: Duration::from_secs(DEFAULT_POLL_MAX_SECS),
            max_read_retries: DEFAULT_POLL_READ_RETRIES,
        }
    }
}

impl PollConfig {
    /// Fresh delay schedule starting at `base_interval`
    pub fn schedule(&self) -> PollSchedule {
        let delays = ExponentialBuilder::default()
            .with_min_delay(self.base_interval)
            .with_max_delay(self.max_interval)
            .with_factor(2.0)
            .with_max_times(usize::MAX)
            .build();
        PollSchedule {
            delays,
            max: self.max_interval,
        }
    }
}

/// Endless, non-decreasing sequence of poll delays
pub struct PollSchedule {
    delays: ExponentialBackoff,
    max: Duration,
}

impl Iterator for PollSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.delays.next().unwrap_or(self.max).min(self.max))
    }
}

/// Status to wait for and the total time budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTarget {
    pub status: ResourceStatus,
    pub deadline: Duration,
}

impl WaitTarget {
    pub fn new(status: ResourceStatus, deadline: Duration) -> Self {
        Self { status, deadline }
    }
}

/// Outcome of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitReport {
    /// Matching status returned by the final read
    pub status: ResourceStatus,
    /// Number of reads issued, failed ones included
    pub polls: u32,
    pub elapsed: Duration,
    /// Delays slept between reads, in order
    pub intervals: Vec<Duration>,
}

/// Why a wait ended without reaching its target
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("still {last_status} after {elapsed:?} waiting for {target}")]
    Timeout {
        target: ResourceStatus,
        last_status: ResourceStatus,
        elapsed: Duration,
        intervals: Vec<Duration>,
    },

    #[error("status read failed {attempts} times in a row")]
    ReadFailed {
        attempts: u32,
        #[source]
        cause: ProviderError,
    },

    #[error("reached {observed}, from which {target} cannot be reached")]
    Unreachable {
        target: ResourceStatus,
        observed: ResourceStatus,
    },

    #[error("wait cancelled while {last_status}")]
    Cancelled { last_status: ResourceStatus },
}

/// Polls resource status until it reaches a target
#[derive(Debug, Clone, Default)]
pub struct Poller {
    config: PollConfig,
}

impl Poller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Wait until `read` reports `target.status`.
    ///
    /// The interval doubles after every read that does not match, failed
    /// reads included, and the deadline is checked before every sleep, so
    /// the total elapsed time never exceeds the deadline by more than one
    /// interval. A cancelled `cancel` token ends the wait before the next
    /// read or during a sleep.
    pub async fn wait_for<F, Fut>(
        &self,
        descriptor: &ResourceDescriptor,
        target: WaitTarget,
        cancel: Option<&CancellationToken>,
        mut read: F,
    ) -> Result<WaitReport, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ResourceStatus, ProviderError>>,
    {
        let resource = descriptor.description();
        let start = Instant::now();
        let mut schedule = self.config.schedule();
        let mut intervals = Vec::new();
        let mut polls = 0u32;
        let mut failed_reads = 0u32;
        let mut last_status = descriptor.status();

        info!(
            resource = %resource,
            target = %target.status,
            deadline = ?target.deadline,
            "Waiting for status"
        );

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                info!(resource = %resource, last_status = %last_status, "Wait cancelled");
                return Err(WaitError::Cancelled { last_status });
            }

            polls += 1;

            match read().await {
                Ok(status) if status == target.status => {
                    let elapsed = start.elapsed();
                    info!(
                        resource = %resource,
                        status = %status,
                        polls,
                        elapsed = ?elapsed,
                        "Status reached"
                    );
                    return Ok(WaitReport {
                        status,
                        polls,
                        elapsed,
                        intervals,
                    });
                }
                Ok(status) => {
                    failed_reads = 0;
                    last_status = status;
                    if !status.can_reach(target.status) {
                        warn!(
                            resource = %resource,
                            observed = %status,
                            target = %target.status,
                            "Target status is no longer reachable"
                        );
                        return Err(WaitError::Unreachable {
                            target: target.status,
                            observed: status,
                        });
                    }
                    debug!(resource = %resource, status = %status, poll = polls, "Not there yet");
                }
                Err(cause) => {
                    failed_reads += 1;
                    if failed_reads > self.config.max_read_retries {
                        return Err(WaitError::ReadFailed {
                            attempts: failed_reads,
                            cause,
                        });
                    }
                    // Throttling, transport and eventual-consistency misses
                    // all get the same treatment
                    warn!(
                        resource = %resource,
                        attempt = failed_reads,
                        transient = cause.is_transient(),
                        error = %cause,
                        "Status read failed, retrying"
                    );
                }
            }

            let elapsed = start.elapsed();
            if elapsed >= target.deadline {
                warn!(
                    resource = %resource,
                    last_status = %last_status,
                    elapsed = ?elapsed,
                    "Timed out waiting for status"
                );
                return Err(WaitError::Timeout {
                    target: target.status,
                    last_status,
                    elapsed,
                    intervals,
                });
            }

            let delay = schedule.next().unwrap_or(self.config.max_interval);
            debug!(resource = %resource, delay = ?delay, "Sleeping before next read");
            intervals.push(delay);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = async {
                    match cancel {
                        Some(token) => token.cancelled().await,
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    info!(resource = %resource, last_status = %last_status, "Wait cancelled");
                    return Err(WaitError::Cancelled { last_status });
                }
            }
        }
    }
}
