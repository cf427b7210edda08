use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::http::ApiClient;

const GRAPHQL_PATH: &str = "/graphql";

const COMPLETE_SWAP_MUTATION: &str = "mutation CompleteSwap($input: CompleteSwapInput!) { completeSwap(input: $input) { success message messageId transactionId } }";

const ACCEPT_OBLIGATION_MUTATION: &str = "mutation AcceptObligation($input: AcceptObligationInput!) { acceptObligation(input: $input) { success message messageId transactionId } }";

/// A GraphQL request with structured variables. Values travel in the
/// `variables` payload, never interpolated into the query text, so no
/// escaping is needed anywhere.
#[derive(Debug, Serialize)]
pub struct GraphqlRequest {
    pub query: &'static str,
    pub variables: Value,
}

/// Acknowledgement shape shared by the swap/obligation mutations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MutationAck {
    pub success: bool,
    pub message: Option<String>,
    #[serde(rename = "messageId")]
    pub message_id: Option<String>,
    #[serde(rename = "transactionId")]
    pub transaction_id: Option<String>,
}

/// Fresh idempotency key for a mutation. The server deduplicates on it;
/// this client only generates and forwards it.
pub fn new_idempotency_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Client for the platform's synchronous GraphQL mutations.
///
/// These are plain request/response calls, never polled and never retried
/// automatically: their downstream effect is observed later through the
/// workflow status endpoints.
pub struct GraphqlClient<'a> {
    api: &'a ApiClient,
}

impl<'a> GraphqlClient<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn complete_swap(
        &self,
        swap_id: &str,
        idempotency_key: Option<&str>,
    ) -> Result<MutationAck> {
        let input = mutation_input(json!({"swapId": swap_id}), idempotency_key);
        self.execute("completeSwap", COMPLETE_SWAP_MUTATION, input)
            .await
    }

    pub async fn accept_obligation(
        &self,
        obligation_id: &str,
        idempotency_key: Option<&str>,
    ) -> Result<MutationAck> {
        let input = mutation_input(json!({"obligationId": obligation_id}), idempotency_key);
        self.execute("acceptObligation", ACCEPT_OBLIGATION_MUTATION, input)
            .await
    }

    async fn execute(
        &self,
        field: &str,
        query: &'static str,
        input: Value,
    ) -> Result<MutationAck> {
        let request = GraphqlRequest {
            query,
            variables: json!({ "input": input }),
        };

        let response = self.api.post_json(GRAPHQL_PATH, &request).await?;

        if !response.is_success() {
            return Err(AppError::Graphql(format!(
                "graphql endpoint returned {}",
                response.status
            )));
        }

        let body = response
            .body
            .ok_or_else(|| AppError::Graphql("empty graphql response".to_string()))?;

        let ack = ack_from_body(&body, field)?;

        tracing::info!(
            mutation = field,
            success = ack.success,
            transaction_id = ack.transaction_id.as_deref().unwrap_or(""),
            "GraphQL mutation acknowledged"
        );

        Ok(ack)
    }
}

fn mutation_input(mut input: Value, idempotency_key: Option<&str>) -> Value {
    if let Some(key) = idempotency_key {
        input["idempotencyKey"] = json!(key);
    }
    input
}

/// Parse `{data: {<field>: ack}}`, surfacing `errors[]` messages verbatim.
fn ack_from_body(body: &Value, field: &str) -> Result<MutationAck> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let joined = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("; ");
            let message = if joined.is_empty() {
                "unspecified graphql error".to_string()
            } else {
                joined
            };
            return Err(AppError::Graphql(message));
        }
    }

    let ack = body
        .get("data")
        .and_then(|data| data.get(field))
        .filter(|ack| !ack.is_null())
        .ok_or_else(|| AppError::Graphql(format!("response carried no data.{field}")))?;

    serde_json::from_value(ack.clone())
        .map_err(|e| AppError::Graphql(format!("malformed {field} ack: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_parsed_from_data_field() {
        let body = json!({
            "data": {
                "completeSwap": {
                    "success": true,
                    "message": "swap settled",
                    "messageId": "m-1",
                    "transactionId": "tx-9",
                }
            }
        });
        let ack = ack_from_body(&body, "completeSwap").unwrap();
        assert!(ack.success);
        assert_eq!(ack.transaction_id.as_deref(), Some("tx-9"));
    }

    #[test]
    fn test_graphql_errors_surface_messages() {
        let body = json!({
            "errors": [
                {"message": "swap not found"},
                {"message": "unauthorized"},
            ]
        });
        let err = ack_from_body(&body, "completeSwap").unwrap_err();
        assert!(err.to_string().contains("swap not found; unauthorized"));
    }

    #[test]
    fn test_missing_data_field() {
        let body = json!({"data": {"somethingElse": {}}});
        assert!(ack_from_body(&body, "acceptObligation").is_err());
    }

    #[test]
    fn test_null_ack_is_an_error() {
        let body = json!({"data": {"completeSwap": null}});
        assert!(ack_from_body(&body, "completeSwap").is_err());
    }

    #[test]
    fn test_variables_carry_values_structurally() {
        // Hostile identifiers stay inert data in the variables payload;
        // the query text never changes.
        let request = GraphqlRequest {
            query: COMPLETE_SWAP_MUTATION,
            variables: json!({
                "input": mutation_input(
                    json!({"swapId": "sw\"1) { __typename }"}),
                    Some("key-1"),
                )
            }),
        };
        let serialized = serde_json::to_value(&request).unwrap();

        assert_eq!(serialized["query"], COMPLETE_SWAP_MUTATION);
        assert_eq!(
            serialized["variables"]["input"]["swapId"],
            "sw\"1) { __typename }"
        );
        assert_eq!(serialized["variables"]["input"]["idempotencyKey"], "key-1");
    }

    #[test]
    fn test_idempotency_key_omitted_when_absent() {
        let input = mutation_input(json!({"swapId": "sw-1"}), None);
        assert!(input.get("idempotencyKey").is_none());
    }

    #[test]
    fn test_new_idempotency_keys_are_unique() {
        assert_ne!(new_idempotency_key(), new_idempotency_key());
    }
}
