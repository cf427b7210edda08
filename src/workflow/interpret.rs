use serde_json::Value;

use crate::workflow::types::PollOutcome;

/// Placeholder for a result field the server did not supply.
pub const NOT_AVAILABLE: &str = "N/A";

/// The result fields one workflow family expects the server to return on
/// completion, e.g. `["annuity_contract_id"]`. Extraction is permissive:
/// a missing field degrades to `N/A`, never a hard error.
#[derive(Debug, Clone, Copy)]
pub struct ResultShape {
    pub fields: &'static [&'static str],
}

/// Why a workflow did not produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server reported a terminal `failed` status.
    Business,
    /// The server reported a terminal `cancelled` status.
    Cancelled,
    /// The client spent its polling budget; the workflow may still be
    /// running server-side.
    TimedOut,
    /// The caller stopped watching via the cancellation callback.
    Aborted,
}

/// What the caller of a workflow family ultimately receives.
#[derive(Debug, Clone, PartialEq)]
pub enum CallerFacingResult {
    Completed {
        fields: Vec<(String, String)>,
        raw: Value,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

impl CallerFacingResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CallerFacingResult::Completed { .. })
    }

    /// Extracted value of a named result field, when completed.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            CallerFacingResult::Completed { fields, .. } => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value.as_str()),
            CallerFacingResult::Failed { .. } => None,
        }
    }
}

impl std::fmt::Display for CallerFacingResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallerFacingResult::Completed { fields, .. } => {
                write!(f, "completed")?;
                for (name, value) in fields {
                    write!(f, " {name}={value}")?;
                }
                Ok(())
            }
            CallerFacingResult::Failed { kind, message } => {
                write!(f, "{kind:?}: {message}")
            }
        }
    }
}

/// Map a terminal `PollOutcome` into the caller-facing result.
///
/// Pure and deterministic: this is the seam unit tests drive without a
/// live server. Every failure path keeps a human-readable cause.
pub fn interpret(outcome: PollOutcome, shape: &ResultShape) -> CallerFacingResult {
    match outcome {
        PollOutcome::Success(raw) => {
            let fields = shape
                .fields
                .iter()
                .map(|&name| (name.to_string(), extract_field(&raw, name)))
                .collect();
            CallerFacingResult::Completed { fields, raw }
        }
        PollOutcome::Failed(error) => CallerFacingResult::Failed {
            kind: FailureKind::Business,
            message: error,
        },
        PollOutcome::Cancelled { reason } => CallerFacingResult::Failed {
            kind: FailureKind::Cancelled,
            message: reason.unwrap_or_else(|| "cancelled by the platform".to_string()),
        },
        PollOutcome::TimedOut { attempts } => CallerFacingResult::Failed {
            kind: FailureKind::TimedOut,
            message: format!(
                "gave up after {attempts} status checks; the workflow may still be running server-side"
            ),
        },
        PollOutcome::Aborted => CallerFacingResult::Failed {
            kind: FailureKind::Aborted,
            message: "polling was aborted by the caller; the workflow may still be running server-side"
                .to_string(),
        },
    }
}

fn extract_field(result: &Value, name: &str) -> String {
    match result.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => NOT_AVAILABLE.to_string(),
        // Numbers, bools and nested objects are still shown, stringified.
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ANNUITY_SHAPE: ResultShape = ResultShape {
        fields: &["annuity_contract_id"],
    };

    const SETTLE_SHAPE: ResultShape = ResultShape {
        fields: &["settlement_id", "amount_settled"],
    };

    #[test]
    fn test_completed_extracts_expected_fields() {
        let outcome = PollOutcome::Success(json!({"annuity_contract_id": "AC-77"}));
        let result = interpret(outcome, &ANNUITY_SHAPE);

        assert!(result.is_success());
        assert_eq!(result.field("annuity_contract_id"), Some("AC-77"));
    }

    #[test]
    fn test_missing_field_degrades_to_na() {
        let outcome = PollOutcome::Success(json!({"something_else": true}));
        let result = interpret(outcome, &ANNUITY_SHAPE);

        assert!(result.is_success());
        assert_eq!(result.field("annuity_contract_id"), Some(NOT_AVAILABLE));
    }

    #[test]
    fn test_numeric_field_is_stringified() {
        let outcome =
            PollOutcome::Success(json!({"settlement_id": "S-1", "amount_settled": 125000}));
        let result = interpret(outcome, &SETTLE_SHAPE);

        assert_eq!(result.field("settlement_id"), Some("S-1"));
        assert_eq!(result.field("amount_settled"), Some("125000"));
    }

    #[test]
    fn test_null_result_payload() {
        let result = interpret(PollOutcome::Success(Value::Null), &ANNUITY_SHAPE);
        assert_eq!(result.field("annuity_contract_id"), Some(NOT_AVAILABLE));
    }

    #[test]
    fn test_business_failure_surfaces_server_error() {
        let result = interpret(
            PollOutcome::Failed("insufficient balance".to_string()),
            &ANNUITY_SHAPE,
        );
        match result {
            CallerFacingResult::Failed { kind, message } => {
                assert_eq!(kind, FailureKind::Business);
                assert_eq!(message, "insufficient balance");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout_message_notes_workflow_may_still_run() {
        let result = interpret(PollOutcome::TimedOut { attempts: 60 }, &ANNUITY_SHAPE);
        match result {
            CallerFacingResult::Failed { kind, message } => {
                assert_eq!(kind, FailureKind::TimedOut);
                assert!(message.contains("60"));
                assert!(message.contains("still be running"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_without_reason_gets_default() {
        let result = interpret(PollOutcome::Cancelled { reason: None }, &ANNUITY_SHAPE);
        match result {
            CallerFacingResult::Failed { kind, message } => {
                assert_eq!(kind, FailureKind::Cancelled);
                assert_eq!(message, "cancelled by the platform");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_aborted_is_distinct_from_timeout() {
        let aborted = interpret(PollOutcome::Aborted, &ANNUITY_SHAPE);
        match aborted {
            CallerFacingResult::Failed { kind, .. } => assert_eq!(kind, FailureKind::Aborted),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_field_lookup_on_failure_is_none() {
        let result = interpret(PollOutcome::Failed("boom".to_string()), &ANNUITY_SHAPE);
        assert_eq!(result.field("annuity_contract_id"), None);
    }
}
