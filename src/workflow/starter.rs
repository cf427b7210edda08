use serde::Serialize;
use thiserror::Error;

use crate::http::{ApiClient, ApiResponse};
use crate::workflow::types::WorkflowHandle;

/// Ways a workflow start request can fail.
///
/// `EndpointNotFound` is kept separate from `Rejected` so operators can
/// tell "feature not deployed" apart from a business rejection: some
/// deployments answer 404 for workflow routes that were never rolled out.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("workflow endpoint not found: {endpoint}")]
    EndpointNotFound { endpoint: String },

    #[error("workflow start rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed start response ({status}): {detail}")]
    MalformedResponse { status: u16, detail: String },

    #[error("transport error during start: {0}")]
    Transport(String),
}

/// Submit a workflow-initiation request.
///
/// Exactly one network call, no retry: a failed start is surfaced as-is
/// and retrying (with an idempotency key in the payload) is the caller's
/// decision. No `WorkflowHandle` exists unless the server returned a
/// non-empty `workflow_id`.
pub async fn start_workflow<T: Serialize + ?Sized>(
    api: &ApiClient,
    endpoint: &str,
    payload: &T,
    workflow_type: Option<&str>,
) -> Result<WorkflowHandle, StartError> {
    let response = api
        .post_json(endpoint, payload)
        .await
        .map_err(|e| StartError::Transport(e.to_string()))?;

    let handle = classify_start_response(endpoint, &response, workflow_type)?;

    tracing::info!(
        workflow_id = %handle.workflow_id,
        workflow_type = handle.workflow_type.as_deref().unwrap_or("unspecified"),
        endpoint = endpoint,
        "Workflow started"
    );

    Ok(handle)
}

/// Map one start response to a handle or a `StartError`.
fn classify_start_response(
    endpoint: &str,
    response: &ApiResponse,
    workflow_type: Option<&str>,
) -> Result<WorkflowHandle, StartError> {
    if response.status == 404 {
        return Err(StartError::EndpointNotFound {
            endpoint: endpoint.to_string(),
        });
    }

    if !response.is_success() {
        let message = response
            .error_message()
            .unwrap_or_else(|| "no error detail supplied".to_string());
        return Err(StartError::Rejected {
            status: response.status,
            message,
        });
    }

    let workflow_id = response
        .body
        .as_ref()
        .and_then(|b| b.get("workflow_id"))
        .and_then(|id| id.as_str())
        .unwrap_or_default();

    if workflow_id.is_empty() {
        return Err(StartError::MalformedResponse {
            status: response.status,
            detail: "missing or empty workflow_id".to_string(),
        });
    }

    Ok(WorkflowHandle::new(
        workflow_id.to_string(),
        workflow_type.map(|t| t.to_string()),
    ))
}
