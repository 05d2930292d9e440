// Load-test configuration
//
// LoadTestConfig is plain data. The CLI fills it from flags/environment;
// tests build it directly with the with_* methods.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{LoadTestError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin123";

/// Login path relative to the base URL
pub const LOGIN_PATH: &str = "/api/auth/login";
/// Dashboard path relative to the base URL
pub const DASHBOARD_PATH: &str = "/api/analytics/dashboard";

/// Configuration for a single load-test run
#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    /// Base URL of the service under test (no trailing slash needed)
    pub base_url: String,

    pub username: String,
    pub password: String,

    /// Number of concurrent requests per batch
    pub concurrency: usize,

    /// Wall-clock length of the measured phase
    pub duration: Duration,

    /// Sequential requests issued before measurement starts
    pub warmup: u32,

    /// Timeout for each dashboard request
    pub request_timeout: Duration,

    /// Timeout for the login request
    pub login_timeout: Duration,

    /// Pause between batches
    pub batch_pause: Duration,

    /// Progress is printed each time the record count crosses a multiple of this
    pub progress_interval: usize,

    /// Upper bound on simultaneous in-flight requests
    pub max_connections: usize,

    /// Upper bound on connections to the target host
    pub max_connections_per_host: usize,

    /// Directory the CSV trace is written into
    pub output_dir: PathBuf,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            concurrency: 10,
            duration: Duration::from_secs(120),
            warmup: 5,
            request_timeout: Duration::from_secs(60),
            login_timeout: Duration::from_secs(30),
            batch_pause: Duration::from_millis(100),
            progress_interval: 20,
            max_connections: 100,
            max_connections_per_host: 50,
            output_dir: PathBuf::from("."),
        }
    }
}

impl LoadTestConfig {
    /// Create a configuration targeting `base_url` with all other values defaulted
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_warmup(mut self, warmup: u32) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_connection_limits(mut self, total: usize, per_host: usize) -> Self {
        self.max_connections = total;
        self.max_connections_per_host = per_host;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Base URL with any trailing slash removed
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Full URL of the login endpoint
    pub fn login_url(&self) -> String {
        format!("{}{}", self.trimmed_base_url(), LOGIN_PATH)
    }

    /// Full URL of the dashboard endpoint
    pub fn dashboard_url(&self) -> String {
        format!("{}{}", self.trimmed_base_url(), DASHBOARD_PATH)
    }

    /// In-flight request cap actually enforced against the single target host
    pub fn effective_connection_limit(&self) -> usize {
        self.max_connections.min(self.max_connections_per_host)
    }

    /// Reject configurations that cannot produce a meaningful run
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| LoadTestError::config(format!("invalid base URL {:?}: {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LoadTestError::config(format!(
                "unsupported URL scheme {:?}",
                url.scheme()
            )));
        }
        if self.concurrency == 0 {
            return Err(LoadTestError::config("concurrency must be at least 1"));
        }
        if self.duration.is_zero() {
            return Err(LoadTestError::config("duration must be greater than zero"));
        }
        if self.max_connections == 0 || self.max_connections_per_host == 0 {
            return Err(LoadTestError::config("connection limits must be at least 1"));
        }
        if self.progress_interval == 0 {
            return Err(LoadTestError::config("progress interval must be at least 1"));
        }
        Ok(())
    }
}
