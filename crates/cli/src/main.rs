// dashload CLI
//
// Design Decision: Use clap derive with env fallbacks for every tunable.
// Design Decision: Logs go to stderr so stdout carries only the report.
// Design Decision: Ctrl-C aborts in-flight requests but still reports collected results.

mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use dashload_core::{LoadTest, LoadTestConfig, LoadTestError, RunEnd};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "dashload")]
#[command(about = "Load test the analytics dashboard endpoint")]
#[command(version)]
pub struct Cli {
    /// Number of concurrent users (requests per batch)
    #[arg(long, env = "DASHLOAD_USERS", default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub users: u32,

    /// Test duration in seconds
    #[arg(long, env = "DASHLOAD_DURATION", default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    pub duration: u64,

    /// Base URL of the service under test
    #[arg(long, env = "DASHLOAD_URL", default_value = "http://localhost:8080")]
    pub url: String,

    /// Login username
    #[arg(long, env = "DASHLOAD_USERNAME", default_value = "admin")]
    pub username: String,

    /// Login password
    #[arg(long, env = "DASHLOAD_PASSWORD", default_value = "admin123", hide_env_values = true)]
    pub password: String,

    /// Number of sequential warmup requests
    #[arg(long, env = "DASHLOAD_WARMUP", default_value_t = 5)]
    pub warmup: u32,

    /// Dashboard request timeout in seconds
    #[arg(long, env = "DASHLOAD_REQUEST_TIMEOUT", default_value_t = 60)]
    pub request_timeout: u64,

    /// Login request timeout in seconds
    #[arg(long, env = "DASHLOAD_LOGIN_TIMEOUT", default_value_t = 30)]
    pub login_timeout: u64,

    /// Directory for the CSV trace
    #[arg(long, env = "DASHLOAD_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Summary format printed after the report
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl Cli {
    fn to_config(&self) -> LoadTestConfig {
        LoadTestConfig::new(&self.url)
            .with_credentials(&self.username, &self.password)
            .with_concurrency(self.users as usize)
            .with_duration(Duration::from_secs(self.duration))
            .with_warmup(self.warmup)
            .with_request_timeout(Duration::from_secs(self.request_timeout))
            .with_login_timeout(Duration::from_secs(self.login_timeout))
            .with_output_dir(&self.output_dir)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashload=info,dashload_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load environment before clap reads the DASHLOAD_* fallbacks
    if let Ok(path) = dotenvy::dotenv() {
        tracing::info!("Loaded .env from {:?}", path);
    }

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Auth failures were already reported by the authenticator
            let reported = e
                .downcast_ref::<LoadTestError>()
                .is_some_and(LoadTestError::is_auth);
            if !reported {
                println!("Test failed: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let load_test = LoadTest::new(cli.to_config())?;
    let mut state = load_test.new_state();

    load_test.print_banner();
    tracing::info!(
        url = %load_test.config().base_url,
        users = cli.users,
        duration_secs = cli.duration,
        "Load test starting"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C; running to the deadline");
            std::future::pending::<()>().await;
        }
    };
    let interrupted = load_test.execute_until(&mut state, shutdown).await? == RunEnd::Interrupted;

    if interrupted {
        println!("\nTest interrupted by user");
        if state.records().is_empty() {
            tracing::warn!("No results collected before interruption; skipping report");
            return Ok(());
        }
    }

    let report = load_test.report(&state)?;
    cli.output.print_value(&report.summary)?;

    if !interrupted {
        println!("\nLoad test completed successfully!");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["dashload"]).unwrap();
        let config = cli.to_config();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.duration, Duration::from_secs(120));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.username, "admin");
        assert_eq!(config.password, "admin123");
        assert_eq!(config.warmup, 5);
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "dashload",
            "--users",
            "25",
            "--duration",
            "30",
            "--url",
            "http://svc:9000",
            "--warmup",
            "0",
            "--request-timeout",
            "5",
            "-o",
            "json",
        ])
        .unwrap();
        let config = cli.to_config();
        assert_eq!(config.concurrency, 25);
        assert_eq!(config.duration, Duration::from_secs(30));
        assert_eq!(config.dashboard_url(), "http://svc:9000/api/analytics/dashboard");
        assert_eq!(config.warmup, 0);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn test_zero_users_rejected() {
        assert!(Cli::try_parse_from(["dashload", "--users", "0"]).is_err());
        assert!(Cli::try_parse_from(["dashload", "--duration", "0"]).is_err());
    }
}
