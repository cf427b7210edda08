use chrono::{DateTime, Utc};
use serde_json::Value;

/// Identity of one in-flight asynchronous operation on the platform.
///
/// Immutable once constructed; discarded by the caller after a terminal
/// outcome is obtained. The server owns any cleanup of finished workflows.
#[derive(Debug, Clone)]
pub struct WorkflowHandle {
    pub workflow_id: String,
    pub workflow_type: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl WorkflowHandle {
    pub fn new(workflow_id: String, workflow_type: Option<String>) -> Self {
        Self {
            workflow_id,
            workflow_type,
            started_at: Utc::now(),
        }
    }
}

/// Server-reported workflow status.
///
/// Any in-progress value the server invents that we don't recognize maps
/// to `Running`; the three terminal values are matched exactly (modulo
/// case and the `canceled` spelling).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "pending" => WorkflowStatus::Pending,
            "running" => WorkflowStatus::Running,
            "completed" => WorkflowStatus::Completed,
            "failed" => WorkflowStatus::Failed,
            "cancelled" | "canceled" => WorkflowStatus::Cancelled,
            _ => WorkflowStatus::Running,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Cancelled
        )
    }
}

/// One poll's observation. Ephemeral: the poller discards it as soon as
/// the next attempt is issued.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub status: WorkflowStatus,
    pub current_step: Option<String>,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl StatusSnapshot {
    /// Parse a status body of the shape
    /// `{workflow_status, current_step?, result?, error?}`.
    /// Returns `None` when `workflow_status` is missing, so the caller can
    /// treat the response as a transient non-terminal observation.
    pub fn from_body(body: &Value) -> Option<Self> {
        let status = body.get("workflow_status").and_then(Value::as_str)?;

        Some(Self {
            status: WorkflowStatus::parse(status),
            current_step: body
                .get("current_step")
                .and_then(Value::as_str)
                .map(|s| s.to_string()),
            result: body.get("result").filter(|r| !r.is_null()).cloned(),
            error: body
                .get("error")
                .and_then(Value::as_str)
                .map(|s| s.to_string()),
        })
    }
}

/// Final product of one `poll` invocation. Exactly one variant applies.
///
/// `TimedOut` is a client-side decision (attempt or deadline budget spent
/// while the workflow was still in progress), distinct from the
/// server-reported `Failed`/`Cancelled`. `Aborted` is the caller asking us
/// to stop watching via the cancellation callback.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Success(Value),
    Failed(String),
    Cancelled { reason: Option<String> },
    TimedOut { attempts: u32 },
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parse_terminal_values() {
        assert_eq!(WorkflowStatus::parse("completed"), WorkflowStatus::Completed);
        assert_eq!(WorkflowStatus::parse("FAILED"), WorkflowStatus::Failed);
        assert_eq!(WorkflowStatus::parse("cancelled"), WorkflowStatus::Cancelled);
        assert_eq!(WorkflowStatus::parse("canceled"), WorkflowStatus::Cancelled);
    }

    #[test]
    fn test_unknown_status_is_in_progress() {
        let status = WorkflowStatus::parse("awaiting_counterparty");
        assert_eq!(status, WorkflowStatus::Running);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_snapshot_from_completed_body() {
        let body = json!({
            "workflow_status": "completed",
            "current_step": "done",
            "result": {"annuity_contract_id": "A1"},
        });
        let snapshot = StatusSnapshot::from_body(&body).unwrap();
        assert_eq!(snapshot.status, WorkflowStatus::Completed);
        assert_eq!(snapshot.current_step.as_deref(), Some("done"));
        assert_eq!(snapshot.result, Some(json!({"annuity_contract_id": "A1"})));
    }

    #[test]
    fn test_snapshot_missing_status_is_none() {
        assert!(StatusSnapshot::from_body(&json!({"result": {}})).is_none());
    }

    #[test]
    fn test_snapshot_null_result_dropped() {
        let body = json!({"workflow_status": "running", "result": null});
        let snapshot = StatusSnapshot::from_body(&body).unwrap();
        assert!(snapshot.result.is_none());
    }
}
