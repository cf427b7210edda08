use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::WorkflowsConfig;
use crate::context::StepContext;
use crate::error::{AppError, Result};
use crate::graphql::{new_idempotency_key, GraphqlClient};
use crate::http::ApiClient;
use crate::workflow::interpret::{CallerFacingResult, ResultShape};
use crate::workflow::types::WorkflowHandle;
use crate::workflow::WorkflowClient;

pub const ISSUE_SHAPE: ResultShape = ResultShape {
    fields: &["composed_contract_id"],
};

pub const SWAP_SHAPE: ResultShape = ResultShape {
    fields: &["swap_id", "transaction_id"],
};

/// One obligation inside a composed contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObligationTerms {
    /// Amount in minor units of `denomination`.
    pub amount: u64,
    pub denomination: String,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposedIssueRequest {
    pub counterparty: String,
    pub obligations: Vec<ObligationTerms>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// A swap settles an existing obligation against payment. The swap and
/// obligation ids come from an earlier issue flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposedSwapRequest {
    pub swap_id: String,
    pub obligation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

fn issue_client<'a>(api: &'a ApiClient, workflows: &'a WorkflowsConfig) -> WorkflowClient<'a> {
    WorkflowClient::new(api, &workflows.composed_issue, "composed_issue", ISSUE_SHAPE)
}

fn swap_client<'a>(api: &'a ApiClient, workflows: &'a WorkflowsConfig) -> WorkflowClient<'a> {
    WorkflowClient::new(api, &workflows.composed_swap, "composed_swap", SWAP_SHAPE)
}

/// Issue a composed contract from an obligation list and await the
/// resulting contract id.
pub async fn issue(
    api: &ApiClient,
    workflows: &WorkflowsConfig,
    request: &ComposedIssueRequest,
    ctx: &mut StepContext,
) -> Result<CallerFacingResult> {
    let mut request = request.clone();
    if request.idempotency_key.is_none() {
        request.idempotency_key = Some(new_idempotency_key());
    }

    let result = issue_client(api, workflows).start_and_await(&request).await?;
    ctx.record_result("composed_issue", &result);
    Ok(result)
}

/// Fire-and-forget variant of `issue`.
pub async fn start_issue(
    api: &ApiClient,
    workflows: &WorkflowsConfig,
    request: &ComposedIssueRequest,
) -> Result<WorkflowHandle> {
    issue_client(api, workflows).start(request).await
}

/// Run the full swap flow: start the swap workflow, accept the obligation
/// and complete the swap through the GraphQL mutations, then poll the
/// workflow to its terminal state.
///
/// The mutations are synchronous and never retried here; a rejected
/// mutation surfaces immediately and the caller decides whether to rerun
/// the flow with the same idempotency key.
pub async fn swap(
    api: &ApiClient,
    workflows: &WorkflowsConfig,
    request: &ComposedSwapRequest,
    ctx: &mut StepContext,
) -> Result<CallerFacingResult> {
    let mut request = request.clone();
    let key = request
        .idempotency_key
        .get_or_insert_with(new_idempotency_key)
        .clone();

    let client = swap_client(api, workflows);
    let graphql = GraphqlClient::new(api);

    let handle = client.start(&request).await?;

    let accept = graphql
        .accept_obligation(&request.obligation_id, Some(&key))
        .await?;
    if !accept.success {
        return Err(AppError::Graphql(format!(
            "acceptObligation rejected: {}",
            accept.message.as_deref().unwrap_or("no message")
        )));
    }
    ctx.set(
        "accept_obligation",
        "message_id",
        accept.message_id.as_deref().unwrap_or(""),
    );

    let complete = graphql.complete_swap(&request.swap_id, Some(&key)).await?;
    if !complete.success {
        return Err(AppError::Graphql(format!(
            "completeSwap rejected: {}",
            complete.message.as_deref().unwrap_or("no message")
        )));
    }
    ctx.set(
        "complete_swap",
        "transaction_id",
        complete.transaction_id.as_deref().unwrap_or(""),
    );

    // The mutations only enqueue the settlement; its outcome is observed
    // through the workflow status endpoint.
    let result = client.await_result(&handle).await;
    ctx.record_result("composed_swap", &result);
    Ok(result)
}

/// Start the swap workflow without accepting or completing anything.
pub async fn start_swap(
    api: &ApiClient,
    workflows: &WorkflowsConfig,
    request: &ComposedSwapRequest,
) -> Result<WorkflowHandle> {
    swap_client(api, workflows).start(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_request_serializes_obligation_list() {
        let request = ComposedIssueRequest {
            counterparty: "acct-9".to_string(),
            obligations: vec![
                ObligationTerms {
                    amount: 50_000,
                    denomination: "USD".to_string(),
                    due_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
                },
                ObligationTerms {
                    amount: 75_000,
                    denomination: "EUR".to_string(),
                    due_date: NaiveDate::from_ymd_opt(2027, 1, 15).unwrap(),
                },
            ],
            idempotency_key: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["counterparty"], "acct-9");
        assert_eq!(
            value["obligations"],
            json!([
                {"amount": 50_000, "denomination": "USD", "due_date": "2026-10-01"},
                {"amount": 75_000, "denomination": "EUR", "due_date": "2027-01-15"},
            ])
        );
        assert!(value.get("idempotency_key").is_none());
    }
}
