use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::{AuthConfig, PlatformConfig};
use crate::error::{AppError, Result};

const LOGIN_PATH: &str = "/auth/login/with-services";

/// Token field names the auth service has been observed to use, in
/// lookup order.
const TOKEN_FIELDS: [&str; 3] = ["token", "access_token", "jwt"];

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    services: &'a [String],
}

/// Client for the external auth service.
///
/// Its whole contract surface is "POST credentials -> bearer token or
/// failure"; the token is opaque to this crate.
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(platform: &PlatformConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(platform.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: platform.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Exchange credentials for a bearer token. Exactly one network call;
    /// failures are surfaced to the caller, never retried here.
    pub async fn login(&self, auth: &AuthConfig) -> Result<String> {
        let request = LoginRequest {
            email: &auth.email,
            password: &auth.password,
            services: &auth.services,
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, LOGIN_PATH))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!("login returned {status}: {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("login response was not JSON: {e}")))?;

        token_from_response(&body).ok_or_else(|| {
            AppError::Auth(format!(
                "login response carried none of {}",
                TOKEN_FIELDS.join("/")
            ))
        })
    }
}

/// Prioritized-fallback token lookup over the parsed login response.
fn token_from_response(body: &Value) -> Option<String> {
    TOKEN_FIELDS
        .iter()
        .filter_map(|field| body.get(field).and_then(Value::as_str))
        .find(|token| !token.is_empty())
        .map(|token| token.to_string())
}
