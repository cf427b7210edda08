use serde::{Deserialize, Serialize};

use crate::config::WorkflowsConfig;
use crate::context::StepContext;
use crate::error::Result;
use crate::graphql::new_idempotency_key;
use crate::http::ApiClient;
use crate::workflow::interpret::{CallerFacingResult, ResultShape};
use crate::workflow::types::WorkflowHandle;
use crate::workflow::WorkflowClient;

pub const ONRAMP_SHAPE: ResultShape = ResultShape {
    fields: &["onramp_id"],
};

/// Funds an entity's platform wallet from an external reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnrampRequest {
    pub entity: String,
    /// Amount in minor units of `denomination`.
    pub amount: u64,
    pub denomination: String,
    pub funding_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

fn client<'a>(api: &'a ApiClient, workflows: &'a WorkflowsConfig) -> WorkflowClient<'a> {
    WorkflowClient::new(api, &workflows.onramp, "onramp", ONRAMP_SHAPE)
}

/// Run an onramp workflow to completion.
pub async fn run(
    api: &ApiClient,
    workflows: &WorkflowsConfig,
    request: &OnrampRequest,
    ctx: &mut StepContext,
) -> Result<CallerFacingResult> {
    let mut request = request.clone();
    if request.idempotency_key.is_none() {
        request.idempotency_key = Some(new_idempotency_key());
    }

    let result = client(api, workflows).start_and_await(&request).await?;
    ctx.record_result("onramp", &result);
    Ok(result)
}

/// Fire-and-forget variant of `run`.
pub async fn start(
    api: &ApiClient,
    workflows: &WorkflowsConfig,
    request: &OnrampRequest,
) -> Result<WorkflowHandle> {
    client(api, workflows).start(request).await
}
