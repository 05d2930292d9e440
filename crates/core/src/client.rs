// HTTP client wrapper for the service under test
//
// Owns the reqwest client, the endpoint URLs and the process-wide cap on
// in-flight requests. Knows nothing about classification or statistics.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::config::LoadTestConfig;
use crate::error::{LoadTestError, Result};

/// Bearer token returned by the login endpoint
#[derive(Clone)]
pub struct BearerToken(Arc<str>);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username_or_email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

pub struct ApiClient {
    login_url: String,
    dashboard_url: String,
    http: reqwest::Client,
    login_timeout: Duration,
    request_timeout: Duration,
    slots: Semaphore,
}

impl ApiClient {
    pub fn new(config: &LoadTestConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(config.max_connections_per_host)
            .build()
            .map_err(LoadTestError::Client)?;

        Ok(Self {
            login_url: config.login_url(),
            dashboard_url: config.dashboard_url(),
            http,
            login_timeout: config.login_timeout,
            request_timeout: config.request_timeout,
            slots: Semaphore::new(config.effective_connection_limit()),
        })
    }

    pub fn dashboard_url(&self) -> &str {
        &self.dashboard_url
    }

    /// Exchange credentials for a bearer token
    pub async fn login(&self, username: &str, password: &str) -> Result<BearerToken> {
        let body = LoginRequest {
            username_or_email: username,
            password,
        };

        let response = self
            .http
            .post(&self.login_url)
            .timeout(self.login_timeout)
            .json(&body)
            .send()
            .await
            .map_err(LoadTestError::AuthTransport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LoadTestError::AuthRejected {
                status: status.as_u16(),
            });
        }

        let payload: LoginResponse = response
            .json()
            .await
            .map_err(LoadTestError::AuthTransport)?;

        payload
            .token
            .filter(|t| !t.is_empty())
            .map(BearerToken::new)
            .ok_or(LoadTestError::MissingToken)
    }

    /// Wait for an in-flight slot
    ///
    /// Returns None only if the semaphore was closed, in which case the
    /// caller proceeds without a slot.
    pub async fn acquire_slot(&self) -> Option<SemaphorePermit<'_>> {
        self.slots.acquire().await.ok()
    }

    /// Send the dashboard request; the body is left unread
    pub async fn get_dashboard(&self, token: &BearerToken) -> reqwest::Result<reqwest::Response> {
        self.http
            .get(&self.dashboard_url)
            .timeout(self.request_timeout)
            .header(AUTHORIZATION, token.header_value())
            .header(ACCEPT, "application/json")
            .send()
            .await
    }

    /// Configured per-request timeout for dashboard calls
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("secret-jwt");
        assert_eq!(format!("{:?}", token), "BearerToken(***)");
        assert_eq!(token.as_str(), "secret-jwt");
        assert_eq!(token.header_value(), "Bearer secret-jwt");
    }

    #[test]
    fn test_login_request_field_names() {
        let body = LoginRequest {
            username_or_email: "admin",
            password: "admin123",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"usernameOrEmail": "admin", "password": "admin123"})
        );
    }
}
