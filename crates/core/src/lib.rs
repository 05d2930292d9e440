// Analytics dashboard load tester
//
// Authenticates once, then drives fixed-size batches of concurrent
// dashboard requests for a wall-clock duration and summarises the results.
//
// Key design decisions:
// - Every request attempt becomes a RequestRecord; request failures are data
// - Warmup records are kept apart from the measured population
// - The scheduler talks to a RequestProbe trait, so tests can swap the probe
// - Statistics are computed once over the finished record set

pub mod auth;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod record;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod state;
pub mod stats;

// Re-exports for convenience
pub use auth::Credentials;
pub use client::{ApiClient, BearerToken};
pub use config::LoadTestConfig;
pub use driver::DashboardProbe;
pub use error::{LoadTestError, Result};
pub use record::{DashboardCounts, Outcome, RequestId, RequestRecord};
pub use report::{Report, Reporter, TextReport};
pub use runner::LoadTest;
pub use scheduler::{BatchOutcome, BatchScheduler, RequestProbe, RunEnd};
pub use state::RunState;
pub use stats::{LatencySummary, ReliabilityBand, ResponseBand, Summary};
