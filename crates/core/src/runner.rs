// Load test orchestration
//
// Wires config, client, authenticator and scheduler together. The caller
// owns RunState so it can still report on partial results if the run is
// interrupted.

use std::future::{pending, Future};
use std::sync::Arc;

use crate::auth::{authenticate, Credentials};
use crate::client::ApiClient;
use crate::config::LoadTestConfig;
use crate::driver::DashboardProbe;
use crate::error::{LoadTestError, Result};
use crate::report::{Report, Reporter};
use crate::scheduler::{BatchScheduler, RunEnd};
use crate::state::RunState;

pub struct LoadTest {
    config: LoadTestConfig,
    client: Arc<ApiClient>,
}

impl LoadTest {
    /// Validate the configuration and build the HTTP client
    pub fn new(config: LoadTestConfig) -> Result<Self> {
        config.validate()?;
        let client = Arc::new(ApiClient::new(&config)?);
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    /// Fresh run state for this configuration
    pub fn new_state(&self) -> RunState {
        RunState::new(self.config.clone())
    }

    pub fn print_banner(&self) {
        println!("=== Analytics Dashboard Load Test ===");
        println!("Target URL: {}", self.client.dashboard_url());
        println!("Concurrent Users: {}", self.config.concurrency);
        println!("Test Duration: {} seconds", self.config.duration.as_secs_f64());
        println!("Warmup Requests: {}", self.config.warmup);
        println!();
    }

    /// Log in and store the token in `state`
    pub async fn authenticate(&self, state: &mut RunState) -> Result<()> {
        let credentials = Credentials::new(&self.config.username, &self.config.password);
        let token = authenticate(&self.client, &credentials).await?;
        if !state.set_token(token) {
            tracing::warn!("Run state already held a token; keeping the first one");
        }
        Ok(())
    }

    /// Scheduler bound to the token held in `state`
    pub fn scheduler(&self, state: &RunState) -> Result<BatchScheduler<DashboardProbe>> {
        let token = state.token().cloned().ok_or(LoadTestError::MissingToken)?;
        let probe = DashboardProbe::new(Arc::clone(&self.client), token);
        Ok(BatchScheduler::new(Arc::new(probe), &self.config))
    }

    /// Authenticate, warm up and run the measured phase
    pub async fn execute(&self, state: &mut RunState) -> Result<()> {
        self.execute_until(state, pending()).await.map(|_| ())
    }

    /// Like `execute`, but stops as soon as `shutdown` resolves
    ///
    /// In-flight requests are aborted; records finished before the stop stay
    /// in `state` so they can still be reported.
    pub async fn execute_until<F>(&self, state: &mut RunState, shutdown: F) -> Result<RunEnd>
    where
        F: Future<Output = ()>,
    {
        let mut shutdown = std::pin::pin!(shutdown);
        tokio::select! {
            result = self.authenticate(state) => result?,
            _ = shutdown.as_mut() => {
                tracing::warn!("Shutdown requested before authentication finished");
                return Ok(RunEnd::Interrupted);
            }
        }

        let scheduler = self.scheduler(state)?;
        Ok(scheduler.run_until(state, shutdown).await)
    }

    /// Summarise, print and export the measured records
    pub fn report(&self, state: &RunState) -> Result<Report> {
        Reporter::new(&self.config).generate(state.records())
    }
}
