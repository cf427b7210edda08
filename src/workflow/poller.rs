use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use crate::config::FamilyConfig;
use crate::error::{AppError, Result};
use crate::http::ApiClient;
use crate::workflow::types::{PollOutcome, StatusSnapshot, WorkflowHandle, WorkflowStatus};

/// Source of status snapshots for an in-flight workflow.
///
/// The production implementation reads the platform's status endpoint;
/// tests substitute a scripted in-memory source. An `Err` from
/// `fetch_status` means "nothing observable this attempt" (connection
/// failure, empty body, unparseable body) and is treated as transient.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, handle: &WorkflowHandle) -> Result<StatusSnapshot>;
}

/// `StatusSource` backed by the platform's HTTP status endpoint.
pub struct HttpStatusSource<'a> {
    api: &'a ApiClient,
    status_path: &'a str,
}

impl<'a> HttpStatusSource<'a> {
    /// `status_path` carries a `{workflow_id}` placeholder.
    pub fn new(api: &'a ApiClient, status_path: &'a str) -> Self {
        Self { api, status_path }
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource<'_> {
    async fn fetch_status(&self, handle: &WorkflowHandle) -> Result<StatusSnapshot> {
        let path = self.status_path.replace("{workflow_id}", &handle.workflow_id);
        let response = self.api.get_json(&path).await?;

        if !response.is_success() {
            return Err(AppError::Internal(format!(
                "status endpoint returned {}",
                response.status
            )));
        }

        let body = response
            .body
            .ok_or_else(|| AppError::Internal("status response body was empty".to_string()))?;

        StatusSnapshot::from_body(&body).ok_or_else(|| {
            AppError::Internal("status response carried no workflow_status".to_string())
        })
    }
}

/// Attempt and delay budget for one polling run.
///
/// `max_attempts * delay` bounds the worst-case wall-clock wait;
/// `deadline` additionally caps it absolutely, since attempt counting
/// alone is fragile when the server slows down. The consecutive-transient
/// cap is separate from the total budget: a status endpoint that stops
/// answering entirely should not be hammered for the full attempt count.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub delay: Duration,
    pub deadline: Option<Duration>,
    pub max_consecutive_transient: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            delay: Duration::from_secs(2),
            deadline: None,
            max_consecutive_transient: 10,
        }
    }
}

impl From<&FamilyConfig> for PollConfig {
    fn from(family: &FamilyConfig) -> Self {
        Self {
            max_attempts: family.max_attempts,
            delay: family.delay(),
            deadline: family.deadline(),
            max_consecutive_transient: family.max_consecutive_transient,
        }
    }
}

/// Drives one workflow handle to a terminal outcome.
///
/// Attempts are strictly sequential: no two status queries for the same
/// handle are ever in flight at once, and the only suspension points are
/// the status GET and the inter-attempt sleep.
pub struct WorkflowPoller<S: StatusSource> {
    source: S,
    config: PollConfig,
}

impl<S: StatusSource> WorkflowPoller<S> {
    pub fn new(source: S, config: PollConfig) -> Self {
        Self { source, config }
    }

    /// Poll until a terminal state or until the budget runs out.
    pub async fn poll(&self, handle: &WorkflowHandle) -> PollOutcome {
        self.poll_with_cancel(handle, || std::future::ready(false))
            .await
    }

    /// Like `poll`, with an async cancellation callback checked before
    /// every attempt. A `true` return stops watching immediately; the
    /// workflow itself keeps running server-side.
    pub async fn poll_with_cancel<F, Fut>(
        &self,
        handle: &WorkflowHandle,
        is_cancelled: F,
    ) -> PollOutcome
    where
        F: Fn() -> Fut,
        Fut: Future<Output = bool>,
    {
        let started = Instant::now();
        let max_attempts = self.config.max_attempts.max(1);
        let transient_cap = self.config.max_consecutive_transient.max(1);
        let mut consecutive_transient = 0u32;

        for attempt in 1..=max_attempts {
            if is_cancelled().await {
                tracing::info!(
                    workflow_id = %handle.workflow_id,
                    attempt = attempt,
                    "Polling aborted by caller"
                );
                return PollOutcome::Aborted;
            }

            match self.source.fetch_status(handle).await {
                Ok(snapshot) => {
                    consecutive_transient = 0;

                    tracing::debug!(
                        workflow_id = %handle.workflow_id,
                        attempt = attempt,
                        status = ?snapshot.status,
                        step = snapshot.current_step.as_deref().unwrap_or(""),
                        "Workflow status"
                    );

                    match snapshot.status {
                        WorkflowStatus::Completed => {
                            return PollOutcome::Success(
                                snapshot.result.unwrap_or(Value::Null),
                            );
                        }
                        WorkflowStatus::Failed => {
                            return PollOutcome::Failed(
                                snapshot
                                    .error
                                    .unwrap_or_else(|| "unspecified failure".to_string()),
                            );
                        }
                        WorkflowStatus::Cancelled => {
                            return PollOutcome::Cancelled {
                                reason: snapshot.error,
                            };
                        }
                        WorkflowStatus::Pending | WorkflowStatus::Running => {}
                    }
                }
                Err(e) => {
                    // A single flaky poll never aborts the loop.
                    consecutive_transient += 1;
                    tracing::warn!(
                        workflow_id = %handle.workflow_id,
                        attempt = attempt,
                        error = %e,
                        "Transient poll failure"
                    );

                    if consecutive_transient >= transient_cap {
                        tracing::warn!(
                            workflow_id = %handle.workflow_id,
                            consecutive = consecutive_transient,
                            "Status endpoint unreachable, giving up"
                        );
                        return PollOutcome::TimedOut { attempts: attempt };
                    }
                }
            }

            if attempt < max_attempts {
                // Never start a sleep that would end past the deadline.
                if let Some(deadline) = self.config.deadline {
                    if started.elapsed() + self.config.delay >= deadline {
                        tracing::warn!(
                            workflow_id = %handle.workflow_id,
                            attempt = attempt,
                            "Deadline reached while workflow still in progress"
                        );
                        return PollOutcome::TimedOut { attempts: attempt };
                    }
                }
                tokio::time::sleep(self.config.delay).await;
            }
        }

        tracing::warn!(
            workflow_id = %handle.workflow_id,
            attempts = max_attempts,
            "Attempt budget spent while workflow still in progress"
        );
        PollOutcome::TimedOut {
            attempts: max_attempts,
        }
    }
}
