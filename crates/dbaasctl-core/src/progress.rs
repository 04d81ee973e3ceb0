//! Bounded readiness polling
//!
//! The control plane provisions asynchronously: a create call only confirms the
//! request was accepted. Clusters, databases and dumps are therefore polled until
//! they report ready, using one primitive, [`poll_until`], driven by a
//! [`PollPolicy`] (attempt budget and delay) and a readiness predicate.
//!
//! There is no deadline and no backoff: at most `max_attempts` checks with a fixed
//! `interval` between consecutive checks. Running out of attempts is an outcome,
//! not an error; [`PollOutcome::require`] applies the configured
//! [`ReadinessPolicy`] to decide whether the run continues.

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{ReadinessPolicy, WorkflowSettings};
use crate::error::{CoreError, Result};
use crate::step::Step;

/// Remote resources whose readiness is polled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Cluster,
    Database,
    Dump,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Cluster => write!(f, "cluster"),
            ResourceKind::Database => write!(f, "database"),
            ResourceKind::Dump => write!(f, "dump"),
        }
    }
}

/// Attempt budget and delay for one readiness poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(5),
        }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn from_settings(settings: &WorkflowSettings) -> Self {
        Self::new(settings.max_attempts, settings.interval())
    }

    /// Upper bound on time spent sleeping
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Progress events emitted while polling
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Polling has begun
    Started { resource: ResourceKind, id: String },
    /// One status check completed
    Polling {
        resource: ResourceKind,
        id: String,
        attempt: u32,
        max_attempts: u32,
        status: String,
    },
    /// Resource reported ready
    Ready {
        resource: ResourceKind,
        id: String,
        attempts: u32,
    },
    /// Attempt budget used up without a ready status
    Exhausted {
        resource: ResourceKind,
        id: String,
        attempts: u32,
        last_status: String,
    },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive a spinner; library callers usually pass `None`.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Result of a poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<S> {
    Ready { status: S, attempts: u32 },
    Exhausted { last_status: S, attempts: u32 },
}

impl<S: fmt::Display> PollOutcome<S> {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. } | PollOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Apply the readiness policy, yielding the last observed status
    ///
    /// `Proceed` turns exhaustion into a warning; `Fail` turns it into
    /// [`CoreError::NotReady`] attributed to `step`.
    pub fn require(
        self,
        step: Step,
        resource: ResourceKind,
        id: &str,
        policy: ReadinessPolicy,
    ) -> Result<S> {
        match self {
            PollOutcome::Ready { status, .. } => Ok(status),
            PollOutcome::Exhausted {
                last_status,
                attempts,
            } => match policy {
                ReadinessPolicy::Proceed => {
                    warn!(
                        "{} {} still '{}' after {} checks, proceeding anyway",
                        resource, id, last_status, attempts
                    );
                    Ok(last_status)
                }
                ReadinessPolicy::Fail => Err(CoreError::NotReady {
                    step,
                    resource,
                    id: id.to_string(),
                    attempts,
                    last_status: last_status.to_string(),
                }),
            },
        }
    }
}

/// Poll `fetch` until `is_ready` accepts its result or the budget runs out
///
/// Performs at most `policy.max_attempts` checks (at least one) and sleeps
/// `policy.interval` between checks, never after the last one. An error from
/// `fetch` ends polling immediately.
pub async fn poll_until<S, F, Fut>(
    policy: &PollPolicy,
    resource: ResourceKind,
    id: &str,
    mut fetch: F,
    is_ready: impl Fn(&S) -> bool,
    on_progress: Option<&ProgressCallback>,
) -> Result<PollOutcome<S>>
where
    S: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S>>,
{
    let max_attempts = policy.max_attempts.max(1);
    emit(
        on_progress,
        ProgressEvent::Started {
            resource,
            id: id.to_string(),
        },
    );

    let mut attempt = 0;
    loop {
        attempt += 1;
        let status = fetch().await?;

        emit(
            on_progress,
            ProgressEvent::Polling {
                resource,
                id: id.to_string(),
                attempt,
                max_attempts,
                status: status.to_string(),
            },
        );

        if is_ready(&status) {
            info!("{} {} ready after {} checks", resource, id, attempt);
            emit(
                on_progress,
                ProgressEvent::Ready {
                    resource,
                    id: id.to_string(),
                    attempts: attempt,
                },
            );
            return Ok(PollOutcome::Ready {
                status,
                attempts: attempt,
            });
        }

        if attempt >= max_attempts {
            emit(
                on_progress,
                ProgressEvent::Exhausted {
                    resource,
                    id: id.to_string(),
                    attempts: attempt,
                    last_status: status.to_string(),
                },
            );
            return Ok(PollOutcome::Exhausted {
                last_status: status,
                attempts: attempt,
            });
        }

        debug!(
            "{} {} status is '{}', waiting for OK ({}/{})",
            resource, id, status, attempt, max_attempts
        );
        tokio::time::sleep(policy.interval).await;
    }
}

fn emit(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
