use std::collections::HashMap;

use crate::workflow::interpret::CallerFacingResult;

/// Values produced by earlier steps of a multi-step flow, keyed by
/// `(step_name, field_name)`.
///
/// Owned by the orchestrating driver and passed explicitly to each step;
/// there is no ambient global state for later steps to reach into.
#[derive(Debug, Default)]
pub struct StepContext {
    values: HashMap<(String, String), String>,
}

impl StepContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, step: &str, field: &str, value: &str) {
        self.values
            .insert((step.to_string(), field.to_string()), value.to_string());
    }

    pub fn get(&self, step: &str, field: &str) -> Option<&str> {
        self.values
            .get(&(step.to_string(), field.to_string()))
            .map(|v| v.as_str())
    }

    /// Record every extracted field of a completed result under a step
    /// name. Failures record nothing; the caller already holds the error.
    pub fn record_result(&mut self, step: &str, result: &CallerFacingResult) {
        if let CallerFacingResult::Completed { fields, .. } = result {
            for (field, value) in fields {
                self.set(step, field, value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::interpret::FailureKind;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let mut ctx = StepContext::new();
        ctx.set("issue", "annuity_contract_id", "AC-1");

        assert_eq!(ctx.get("issue", "annuity_contract_id"), Some("AC-1"));
        assert_eq!(ctx.get("issue", "other"), None);
        assert_eq!(ctx.get("settle", "annuity_contract_id"), None);
    }

    #[test]
    fn test_record_completed_result() {
        let result = CallerFacingResult::Completed {
            fields: vec![
                ("swap_id".to_string(), "SW-3".to_string()),
                ("transaction_id".to_string(), "N/A".to_string()),
            ],
            raw: json!({}),
        };

        let mut ctx = StepContext::new();
        ctx.record_result("swap", &result);

        assert_eq!(ctx.get("swap", "swap_id"), Some("SW-3"));
        assert_eq!(ctx.get("swap", "transaction_id"), Some("N/A"));
    }

    #[test]
    fn test_record_failure_records_nothing() {
        let result = CallerFacingResult::Failed {
            kind: FailureKind::Business,
            message: "rejected".to_string(),
        };

        let mut ctx = StepContext::new();
        ctx.record_result("swap", &result);

        assert!(ctx.is_empty());
    }
}
