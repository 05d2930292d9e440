//! Console report and CSV trace
//!
//! The report is rendered to a String so it can be printed or inspected in
//! tests. The CSV trace holds one row per measured record.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat};

use crate::config::{LoadTestConfig, DASHBOARD_PATH};
use crate::error::Result;
use crate::record::RequestRecord;
use crate::stats::Summary;

pub const CSV_PREFIX: &str = "analytics-dashboard-load-test-results";

pub const CSV_HEADER: &str = "request_id,timestamp,response_time_ms,status,status_code,data_size,user_count,book_count,transaction_count,execution_time_ms,error_message";

/// Summary plus where the trace was written
#[derive(Debug, Clone)]
pub struct Report {
    pub summary: Summary,
    pub csv_path: PathBuf,
}

/// Computes the summary, prints it and writes the CSV trace
pub struct Reporter {
    config: LoadTestConfig,
}

impl Reporter {
    pub fn new(config: &LoadTestConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn generate(&self, records: &[RequestRecord]) -> Result<Report> {
        let summary = Summary::from_records(records, self.config.duration, self.config.concurrency);
        print!("{}", render_text(&summary));

        let csv_path = write_csv(records, &self.config.output_dir, Local::now())?;
        tracing::info!(path = %csv_path.display(), rows = records.len(), "CSV trace written");
        println!("\nDetailed results saved to: {}", csv_path.display());

        Ok(Report { summary, csv_path })
    }
}

/// Render the operator-facing text report
pub fn render_text(summary: &Summary) -> String {
    TextReport(summary).to_string()
}

/// Display adapter for the text report
pub struct TextReport<'a>(pub &'a Summary);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        let l = &s.latency;

        writeln!(out)?;
        writeln!(out, "=== ANALYTICS DASHBOARD PERFORMANCE REPORT ===")?;
        writeln!(out)?;
        writeln!(out, "Test Configuration:")?;
        writeln!(out, "  Concurrent Users: {}", s.concurrency)?;
        writeln!(out, "  Test Duration: {} seconds", s.duration_secs)?;
        writeln!(out, "  Target Endpoint: {}", DASHBOARD_PATH)?;
        writeln!(out)?;
        writeln!(out, "Request Statistics:")?;
        writeln!(out, "  Total Requests: {}", s.total_requests)?;
        writeln!(out, "  Successful Requests: {}", s.successful_requests)?;
        writeln!(out, "  Failed Requests: {}", s.failed_requests)?;
        writeln!(out, "  Success Rate: {:.2}%", s.success_rate)?;
        writeln!(out, "  Throughput: {:.2} requests/second", s.throughput)?;
        writeln!(out)?;
        writeln!(out, "Response Time Analysis:")?;
        writeln!(out, "  Average Response Time: {:.2}ms", l.mean_ms)?;
        writeln!(out, "  Median Response Time: {:.2}ms", l.median_ms)?;
        writeln!(out, "  Minimum Response Time: {:.2}ms", l.min_ms)?;
        writeln!(out, "  Maximum Response Time: {:.2}ms", l.max_ms)?;
        writeln!(out)?;
        writeln!(out, "Response Time Percentiles:")?;
        writeln!(out, "  90th Percentile: {:.2}ms", l.p90_ms)?;
        writeln!(out, "  95th Percentile: {:.2}ms", l.p95_ms)?;
        writeln!(out, "  99th Percentile: {:.2}ms", l.p99_ms)?;
        writeln!(out)?;

        if let Some(counts) = &s.sample_counts {
            writeln!(out, "Data Analysis:")?;
            writeln!(out, "  Average Response Data Size: {:.2} bytes", s.avg_data_size)?;
            writeln!(out, "  Average Server Execution Time: {:.2}ms", s.avg_execution_time_ms)?;
            writeln!(out, "  Sample Data Counts:")?;
            writeln!(out, "    Users: {}", counts.users)?;
            writeln!(out, "    Books: {}", counts.books)?;
            writeln!(out, "    Transactions: {}", counts.transactions)?;
            writeln!(out)?;
        }

        writeln!(out, "Performance Assessment:")?;
        match &s.response_band {
            Some(band) => writeln!(out, "  {}", band)?,
            None => writeln!(out, "  - Response time not rated (no successful requests)")?,
        }
        writeln!(out, "  {}", s.reliability_band)?;
        Ok(())
    }
}

/// File name for a trace written at `at`
pub fn csv_filename(at: DateTime<Local>) -> String {
    format!("{}-{}.csv", CSV_PREFIX, at.format("%Y%m%d-%H%M%S"))
}

/// Render the records as CSV, header first
pub fn render_csv(records: &[RequestRecord]) -> String {
    let mut out = String::with_capacity(64 * (records.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');

    for r in records {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            csv_escape(&r.id.to_string()),
            r.timestamp.to_rfc3339_opts(SecondsFormat::Micros, false),
            r.response_time_ms,
            r.outcome,
            r.status_code,
            r.data_size,
            r.counts.users,
            r.counts.books,
            r.counts.transactions,
            r.execution_time_ms,
            csv_escape(&r.error_message),
        ));
    }

    out
}

/// Write the trace into `dir`, returning the file path
pub fn write_csv(records: &[RequestRecord], dir: &Path, at: DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(csv_filename(at));
    fs::write(&path, render_csv(records))?;
    Ok(path)
}

/// Quote a field if it contains a delimiter, quote or line break
fn csv_escape(value: &str) -> String {
    if value.contains(|c| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
