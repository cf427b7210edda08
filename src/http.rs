use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::error::Result;

/// Authenticated JSON transport for the payments platform.
///
/// Owns the transport-level timeout and nothing else: no retries, no
/// interpretation of the body beyond attempting to parse it as JSON.
pub struct ApiClient {
    client: Client,
    base_url: String,
    bearer_token: String,
}

/// Raw result of one HTTP exchange: the status code plus the body parsed
/// as JSON when possible (`None` for an empty or non-JSON body).
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Server-supplied `error` string, when the body carries one.
    pub fn error_message(&self) -> Option<String> {
        self.body
            .as_ref()
            .and_then(|b| b.get("error"))
            .and_then(|e| e.as_str())
            .map(|s| s.to_string())
    }
}

impl ApiClient {
    pub fn new(base_url: &str, bearer_token: &str, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<ApiResponse> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.bearer_token)
            .json(payload)
            .send()
            .await?;

        Self::into_api_response(response).await
    }

    pub async fn get_json(&self, path: &str) -> Result<ApiResponse> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        Self::into_api_response(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn into_api_response(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).ok();

        Ok(ApiResponse { status, body })
    }
}
