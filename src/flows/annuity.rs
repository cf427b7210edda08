use serde::{Deserialize, Serialize};

use crate::config::WorkflowsConfig;
use crate::context::StepContext;
use crate::error::Result;
use crate::graphql::new_idempotency_key;
use crate::http::ApiClient;
use crate::workflow::interpret::{CallerFacingResult, ResultShape};
use crate::workflow::types::WorkflowHandle;
use crate::workflow::WorkflowClient;

pub const ISSUE_SHAPE: ResultShape = ResultShape {
    fields: &["annuity_contract_id"],
};

pub const SETTLE_SHAPE: ResultShape = ResultShape {
    fields: &["settlement_id", "amount_settled"],
};

/// Terms for issuing a new annuity contract. All business validation is
/// server-side; the client forwards the terms as given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityIssueRequest {
    pub holder: String,
    /// Principal in minor units of `denomination`.
    pub principal: u64,
    pub denomination: String,
    pub term_months: u32,
    pub rate_bps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuitySettleRequest {
    pub annuity_contract_id: String,
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

fn issue_client<'a>(api: &'a ApiClient, workflows: &'a WorkflowsConfig) -> WorkflowClient<'a> {
    WorkflowClient::new(api, &workflows.annuity_issue, "annuity_issue", ISSUE_SHAPE)
}

fn settle_client<'a>(api: &'a ApiClient, workflows: &'a WorkflowsConfig) -> WorkflowClient<'a> {
    WorkflowClient::new(api, &workflows.annuity_settle, "annuity_settle", SETTLE_SHAPE)
}

/// Issue an annuity and await the resulting contract id.
pub async fn issue(
    api: &ApiClient,
    workflows: &WorkflowsConfig,
    request: &AnnuityIssueRequest,
    ctx: &mut StepContext,
) -> Result<CallerFacingResult> {
    let mut request = request.clone();
    if request.idempotency_key.is_none() {
        request.idempotency_key = Some(new_idempotency_key());
    }

    let result = issue_client(api, workflows).start_and_await(&request).await?;
    ctx.record_result("annuity_issue", &result);
    Ok(result)
}

/// Fire-and-forget variant of `issue`.
pub async fn start_issue(
    api: &ApiClient,
    workflows: &WorkflowsConfig,
    request: &AnnuityIssueRequest,
) -> Result<WorkflowHandle> {
    issue_client(api, workflows).start(request).await
}

/// Settle one period of an existing annuity and await the settlement.
pub async fn settle(
    api: &ApiClient,
    workflows: &WorkflowsConfig,
    request: &AnnuitySettleRequest,
    ctx: &mut StepContext,
) -> Result<CallerFacingResult> {
    let mut request = request.clone();
    if request.idempotency_key.is_none() {
        request.idempotency_key = Some(new_idempotency_key());
    }

    let result = settle_client(api, workflows)
        .start_and_await(&request)
        .await?;
    ctx.record_result("annuity_settle", &result);
    Ok(result)
}

/// Fire-and-forget variant of `settle`.
pub async fn start_settle(
    api: &ApiClient,
    workflows: &WorkflowsConfig,
    request: &AnnuitySettleRequest,
) -> Result<WorkflowHandle> {
    settle_client(api, workflows).start(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_request_serialization() {
        let request = AnnuityIssueRequest {
            holder: "acct-42".to_string(),
            principal: 1_000_000,
            denomination: "USD".to_string(),
            term_months: 120,
            rate_bps: 425,
            idempotency_key: Some("key-1".to_string()),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "holder": "acct-42",
                "principal": 1_000_000,
                "denomination": "USD",
                "term_months": 120,
                "rate_bps": 425,
                "idempotency_key": "key-1",
            })
        );
    }

    #[test]
    fn test_absent_idempotency_key_is_omitted() {
        let request = AnnuitySettleRequest {
            annuity_contract_id: "AC-1".to_string(),
            period: 3,
            idempotency_key: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("idempotency_key").is_none());
    }
}
