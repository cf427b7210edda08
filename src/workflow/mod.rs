pub mod interpret;
pub mod poller;
pub mod starter;
pub mod types;

use std::future::Future;

use serde::Serialize;

use crate::config::FamilyConfig;
use crate::error::Result;
use crate::http::ApiClient;
use interpret::{interpret, CallerFacingResult, ResultShape};
use poller::{HttpStatusSource, PollConfig, WorkflowPoller};
use types::WorkflowHandle;

/// One workflow family's client: the starter, poller and interpreter
/// wired together over a shared transport.
///
/// Two entry points cover both usage patterns: `start` fires the workflow
/// and hands back the handle without watching it, `start_and_await` drives
/// it all the way to a caller-facing result.
pub struct WorkflowClient<'a> {
    api: &'a ApiClient,
    family: &'a FamilyConfig,
    workflow_type: &'static str,
    shape: ResultShape,
}

impl<'a> WorkflowClient<'a> {
    pub fn new(
        api: &'a ApiClient,
        family: &'a FamilyConfig,
        workflow_type: &'static str,
        shape: ResultShape,
    ) -> Self {
        Self {
            api,
            family,
            workflow_type,
            shape,
        }
    }

    /// Fire-and-forget: start the workflow, return its handle, never poll.
    pub async fn start<T: Serialize + ?Sized>(&self, payload: &T) -> Result<WorkflowHandle> {
        let handle = starter::start_workflow(
            self.api,
            &self.family.start_path,
            payload,
            Some(self.workflow_type),
        )
        .await?;
        Ok(handle)
    }

    /// Start the workflow and poll it to a terminal outcome.
    pub async fn start_and_await<T: Serialize + ?Sized>(
        &self,
        payload: &T,
    ) -> Result<CallerFacingResult> {
        let handle = self.start(payload).await?;
        Ok(self.await_result(&handle).await)
    }

    /// Poll an already-started workflow to its caller-facing result.
    pub async fn await_result(&self, handle: &WorkflowHandle) -> CallerFacingResult {
        self.await_result_with_cancel(handle, || std::future::ready(false))
            .await
    }

    /// Like `await_result`, with a cancellation callback checked before
    /// each poll attempt.
    pub async fn await_result_with_cancel<F, Fut>(
        &self,
        handle: &WorkflowHandle,
        is_cancelled: F,
    ) -> CallerFacingResult
    where
        F: Fn() -> Fut,
        Fut: Future<Output = bool>,
    {
        let source = HttpStatusSource::new(self.api, &self.family.status_path);
        let poller = WorkflowPoller::new(source, PollConfig::from(self.family));
        let outcome = poller.poll_with_cancel(handle, is_cancelled).await;
        interpret(outcome, &self.shape)
    }
}
