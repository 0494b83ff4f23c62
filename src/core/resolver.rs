//! Poll-until-settled resolution of call analyses.
//!
//! A resolution issues one status request at a time, sleeping a fixed
//! interval between attempts, until the job settles into exactly one of
//! `Resolved`, `Failed`, `TimedOut` or `DemoFallback`.
//!
//! Pending responses and transport errors draw from `max_attempts`; 404s draw
//! from the separate, smaller `not_found_retry_budget`. A demo-data hit on a
//! 404 settles immediately.
//!
//! Every suspension point races the cancellation token, and no update is
//! delivered once the token is cancelled.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::adapters::{FetchError, StatusSource};
use crate::domain::{
    CallAnalysisStatus, CallId, FailureReason, ResolutionOutcome, ResolutionUpdate,
};

use super::fallback::{DemoFallback, NoDemoData};
use super::policy::PollPolicy;

/// Message for failed jobs that carry no error text
pub const GENERIC_FAILURE_MESSAGE: &str = "analysis failed";

/// Resolves call ids into settled analysis outcomes
#[derive(Clone)]
pub struct AnalysisStatusResolver {
    source: Arc<dyn StatusSource>,
    fallback: Arc<dyn DemoFallback>,
    policy: PollPolicy,
}

impl AnalysisStatusResolver {
    /// Create a resolver without demo data
    pub fn new(source: Arc<dyn StatusSource>, policy: PollPolicy) -> Self {
        Self {
            source,
            fallback: Arc::new(NoDemoData),
            policy,
        }
    }

    /// Attach a demo-data lookup consulted on 404
    pub fn with_fallback(mut self, fallback: impl DemoFallback + 'static) -> Self {
        self.fallback = Arc::new(fallback);
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Resolve one call, reporting progress through `on_update`.
    ///
    /// Returns the outcome that was delivered, or `None` when `call_id` is
    /// empty (no request is made) or `cancel` fired first.
    #[instrument(skip(self, cancel, on_update), fields(source = self.source.name()))]
    pub async fn run<U>(
        &self,
        call_id: &str,
        cancel: &CancellationToken,
        mut on_update: U,
    ) -> Option<ResolutionOutcome>
    where
        U: FnMut(ResolutionUpdate) + Send,
    {
        let Some(call_id) = CallId::parse(call_id) else {
            debug!("Empty call id, nothing to resolve");
            return None;
        };

        let mut attempts = 0u32;
        let mut not_found = 0u32;
        let mut last_error: Option<String> = None;

        loop {
            if cancel.is_cancelled() {
                return None;
            }

            let attempt = attempts + not_found + 1;
            on_update(ResolutionUpdate::Polling { attempt });

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                result = self.source.fetch_status(&call_id) => result,
            };

            let settled = match result {
                Ok(response) => match response.normalize() {
                    CallAnalysisStatus::Completed(report) => {
                        Some(ResolutionOutcome::Resolved { report })
                    }
                    CallAnalysisStatus::Failed { error } => Some(ResolutionOutcome::Failed {
                        reason: FailureReason::BackendReported {
                            message: error
                                .filter(|e| !e.trim().is_empty())
                                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
                        },
                    }),
                    CallAnalysisStatus::Processing => {
                        attempts += 1;
                        last_error = None;
                        debug!(attempt, attempts, "Analysis still processing");
                        self.policy
                            .is_timed_out(attempts)
                            .then_some(ResolutionOutcome::TimedOut {
                                attempts,
                                last_error: None,
                            })
                    }
                },
                Err(FetchError::NotFound) => match self.fallback.lookup(&call_id) {
                    Some(report) => {
                        info!(%call_id, "Call unknown to backend, using demo data");
                        Some(ResolutionOutcome::DemoFallback { report })
                    }
                    None => {
                        not_found += 1;
                        debug!(attempt, not_found, "Call not found yet");
                        self.policy
                            .is_not_found_exhausted(not_found)
                            .then_some(ResolutionOutcome::Failed {
                                reason: FailureReason::NotFound {
                                    attempts: not_found,
                                },
                            })
                    }
                },
                Err(e) => {
                    attempts += 1;
                    warn!(attempt, attempts, error = %e, "Status request failed");
                    let timed_out = self.policy.is_timed_out(attempts);
                    last_error = Some(e.to_string());
                    timed_out.then(|| ResolutionOutcome::TimedOut {
                        attempts,
                        last_error: last_error.clone(),
                    })
                }
            };

            if let Some(outcome) = settled {
                if cancel.is_cancelled() {
                    return None;
                }
                info!(
                    %call_id,
                    outcome = outcome.label(),
                    attempts,
                    not_found,
                    "Resolution settled"
                );
                on_update(ResolutionUpdate::Settled(outcome.clone()));
                return Some(outcome);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(self.policy.interval()) => {}
            }
        }
    }

    /// Start resolving `call_id` on the current tokio runtime.
    ///
    /// Updates are read from the returned handle. Dropping the handle cancels
    /// the resolution.
    pub fn resolve(&self, call_id: &str) -> ResolutionHandle {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let resolver = self.clone();
        let call_id = call_id.to_string();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            resolver
                .run(&call_id, &task_token, |update| {
                    // Receiver gone means the caller stopped listening
                    let _ = tx.send(update);
                })
                .await;
        });

        ResolutionHandle {
            updates: rx,
            token,
            task,
            settled: false,
        }
    }
}

/// Caller's side of one running resolution
pub struct ResolutionHandle {
    updates: mpsc::UnboundedReceiver<ResolutionUpdate>,
    token: CancellationToken,
    task: JoinHandle<()>,
    settled: bool,
}

impl ResolutionHandle {
    /// Next update, or `None` once settled, cancelled, or the id was empty
    pub async fn next(&mut self) -> Option<ResolutionUpdate> {
        if self.settled || self.token.is_cancelled() {
            return None;
        }

        let update = tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            update = self.updates.recv() => update,
        };

        // Buffered updates are discarded once cancelled
        if self.token.is_cancelled() {
            return None;
        }

        if matches!(update, Some(ResolutionUpdate::Settled(_))) {
            self.settled = true;
        }
        update
    }

    /// Skip progress updates and wait for the terminal outcome
    pub async fn outcome(mut self) -> Option<ResolutionOutcome> {
        while let Some(update) = self.next().await {
            if let ResolutionUpdate::Settled(outcome) = update {
                return Some(outcome);
            }
        }
        None
    }

    /// Stop the resolution; no update is observed after this returns
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token that cancels this resolution, for wiring into other tasks
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// True once the polling task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ResolutionHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
