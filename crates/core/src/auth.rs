// Authentication step
//
// Runs once per load test, before any dashboard traffic. Failure is fatal
// for the run but is returned as a value, never raised as a panic.

use crate::client::{ApiClient, BearerToken};
use crate::error::Result;

/// Username/password pair sent to the login endpoint
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Log in and report the result to the operator
pub async fn authenticate(client: &ApiClient, credentials: &Credentials) -> Result<BearerToken> {
    tracing::debug!(username = %credentials.username, "Sending login request");

    match client
        .login(&credentials.username, &credentials.password)
        .await
    {
        Ok(token) => {
            tracing::info!(username = %credentials.username, "Authenticated");
            println!("✓ Authentication successful");
            Ok(token)
        }
        Err(e) => {
            tracing::error!(error = %e, "Authentication failed");
            println!("✗ {}", e);
            Err(e)
        }
    }
}
