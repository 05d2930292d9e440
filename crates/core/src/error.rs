// Error types for a load-test run
//
// Only failures that abort the run live here. Per-request failures are
// recorded as data in RequestRecord and never surface as errors.

use thiserror::Error;

/// Result type alias for load-test operations
pub type Result<T> = std::result::Result<T, LoadTestError>;

/// Errors that stop a load-test run
#[derive(Debug, Error)]
pub enum LoadTestError {
    /// Login endpoint answered with something other than 200
    #[error("Authentication failed with status {status}")]
    AuthRejected { status: u16 },

    /// Login request never produced a usable response
    #[error("Authentication error: {0}")]
    AuthTransport(#[source] reqwest::Error),

    /// Login returned 200 but no token field
    #[error("Authentication response did not contain a token")]
    MissingToken,

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Writing the CSV trace failed
    #[error("Export error: {0}")]
    Export(#[from] std::io::Error),
}

impl LoadTestError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        LoadTestError::Configuration(msg.into())
    }

    /// Whether this error came from the authentication step
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            LoadTestError::AuthRejected { .. }
                | LoadTestError::AuthTransport(_)
                | LoadTestError::MissingToken
        )
    }
}
