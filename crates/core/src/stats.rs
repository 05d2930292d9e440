//! Aggregate statistics over a finished run
//!
//! Latency figures are computed over successful requests only. Percentiles
//! use nearest-rank selection on the ascending sample.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::record::{DashboardCounts, RequestRecord};

/// Nearest-rank percentile of an ascending sample (p in 0.0..=1.0)
///
/// The rank is `floor(p * len)` clamped to the last element; an empty
/// sample yields 0.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 * p).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Median of an ascending sample; even lengths average the two middle values
pub fn median(sorted: &[f64]) -> f64 {
    let len = sorted.len();
    if len == 0 {
        return 0.0;
    }
    if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    }
}

fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Summary statistics for response times, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: usize,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl LatencySummary {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            count: sorted.len(),
            mean_ms: mean(sorted.iter().copied()),
            median_ms: median(&sorted),
            min_ms: sorted[0],
            max_ms: sorted[sorted.len() - 1],
            p90_ms: percentile(&sorted, 0.90),
            p95_ms: percentile(&sorted, 0.95),
            p99_ms: percentile(&sorted, 0.99),
        }
    }
}

/// Qualitative rating of the mean response time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseBand {
    /// Under 500ms
    Excellent,
    /// 500-1000ms
    Good,
    /// 1-2s
    Acceptable,
    /// 2s and above
    Poor,
}

impl ResponseBand {
    pub fn from_mean_ms(mean_ms: f64) -> Self {
        if mean_ms < 500.0 {
            Self::Excellent
        } else if mean_ms < 1000.0 {
            Self::Good
        } else if mean_ms < 2000.0 {
            Self::Acceptable
        } else {
            Self::Poor
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Excellent => "✓ Excellent response time (< 500ms)",
            Self::Good => "⚠ Good response time (500-1000ms)",
            Self::Acceptable => "⚠ Acceptable response time (1-2s)",
            Self::Poor => "✗ Poor response time (> 2s)",
        }
    }
}

/// Qualitative rating of the success rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityBand {
    /// Above 95%
    Excellent,
    /// Above 90%, up to 95%
    Good,
    /// 90% or less
    Poor,
}

impl ReliabilityBand {
    pub fn from_success_rate(rate: f64) -> Self {
        if rate > 95.0 {
            Self::Excellent
        } else if rate > 90.0 {
            Self::Good
        } else {
            Self::Poor
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Excellent => "✓ Excellent reliability (> 95% success rate)",
            Self::Good => "⚠ Good reliability (90-95% success rate)",
            Self::Poor => "✗ Poor reliability (<= 90% success rate)",
        }
    }
}

impl fmt::Display for ResponseBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl fmt::Display for ReliabilityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Everything the report shows, as a value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub concurrency: usize,
    pub duration_secs: f64,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    /// Percentage in 0..=100
    pub success_rate: f64,
    /// Requests per second over the nominal duration
    pub throughput: f64,
    /// Successful requests only
    pub latency: LatencySummary,
    pub avg_data_size: f64,
    /// Mean over successful requests that reported a nonzero execution time
    pub avg_execution_time_ms: f64,
    /// Counts from the first successful response
    pub sample_counts: Option<DashboardCounts>,
    /// None when nothing succeeded
    pub response_band: Option<ResponseBand>,
    pub reliability_band: ReliabilityBand,
}

impl Summary {
    pub fn from_records(records: &[RequestRecord], duration: Duration, concurrency: usize) -> Self {
        let successes: Vec<&RequestRecord> = records.iter().filter(|r| r.is_success()).collect();

        let total = records.len();
        let success = successes.len();
        let success_rate = if total > 0 {
            success as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let duration_secs = duration.as_secs_f64();
        let throughput = if duration_secs > 0.0 {
            total as f64 / duration_secs
        } else {
            0.0
        };

        let response_times: Vec<f64> = successes.iter().map(|r| r.response_time_ms).collect();
        let latency = LatencySummary::from_samples(&response_times);

        let avg_data_size = mean(successes.iter().map(|r| r.data_size as f64));
        let avg_execution_time_ms = mean(
            successes
                .iter()
                .map(|r| r.execution_time_ms)
                .filter(|ms| *ms != 0.0),
        );

        Self {
            concurrency,
            duration_secs,
            total_requests: total,
            successful_requests: success,
            failed_requests: total - success,
            success_rate,
            throughput,
            response_band: (success > 0).then(|| ResponseBand::from_mean_ms(latency.mean_ms)),
            latency,
            avg_data_size,
            avg_execution_time_ms,
            sample_counts: successes.first().map(|r| r.counts),
            reliability_band: ReliabilityBand::from_success_rate(success_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RequestId;

    fn ok(id: u64, ms: f64, size: usize, exec: f64) -> RequestRecord {
        RequestRecord::success(RequestId::Sequence(id), ms, size, DashboardCounts::default(), exec)
    }

    fn err(id: u64, ms: f64) -> RequestRecord {
        RequestRecord::http_error(RequestId::Sequence(id), ms, 500, 0, "HTTP 500")
    }

    #[test]
    fn test_three_successes() {
        let records = vec![ok(0, 100.0, 10, 0.0), ok(1, 200.0, 20, 0.0), ok(2, 300.0, 30, 0.0)];
        let summary = Summary::from_records(&records, Duration::from_secs(3), 3);

        assert_eq!(summary.latency.mean_ms, 200.0);
        assert_eq!(summary.latency.median_ms, 200.0);
        assert_eq!(summary.latency.min_ms, 100.0);
        assert_eq!(summary.latency.max_ms, 300.0);
        assert_eq!(summary.success_rate, 100.0);
        assert_eq!(summary.throughput, 1.0);
        assert_eq!(summary.avg_data_size, 20.0);
        assert_eq!(summary.response_band, Some(ResponseBand::Excellent));
        assert_eq!(summary.reliability_band, ReliabilityBand::Excellent);
    }

    #[test]
    fn test_empty_run() {
        let summary = Summary::from_records(&[], Duration::from_secs(10), 5);
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.throughput, 0.0);
        assert_eq!(summary.latency, LatencySummary::default());
        assert_eq!(summary.response_band, None);
        assert_eq!(summary.reliability_band, ReliabilityBand::Poor);
        assert!(summary.sample_counts.is_none());
    }

    #[test]
    fn test_errors_excluded_from_latency() {
        let records = vec![ok(0, 100.0, 10, 0.0), err(1, 5000.0), err(2, 1.0), ok(3, 300.0, 10, 0.0)];
        let summary = Summary::from_records(&records, Duration::from_secs(2), 2);
        assert_eq!(summary.total_requests, 4);
        assert_eq!(summary.failed_requests, 2);
        assert_eq!(summary.success_rate, 50.0);
        assert_eq!(summary.throughput, 2.0);
        assert_eq!(summary.latency.count, 2);
        assert_eq!(summary.latency.max_ms, 300.0);
        assert_eq!(summary.latency.median_ms, 200.0);
    }

    #[test]
    fn test_execution_time_mean_skips_zero() {
        let records = vec![ok(0, 1.0, 1, 0.0), ok(1, 1.0, 1, 40.0), ok(2, 1.0, 1, 60.0)];
        let summary = Summary::from_records(&records, Duration::from_secs(1), 1);
        assert_eq!(summary.avg_execution_time_ms, 50.0);
    }

    #[test]
    fn test_percentile_clamps_upper_index() {
        // floor(1.0 * 10) == len, must clamp to the last element
        let sorted: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(percentile(&sorted, 1.0), 10.0);
        assert_eq!(percentile(&sorted, 0.99), 10.0);
        assert_eq!(percentile(&sorted, 0.90), 10.0);
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&[42.0], 0.99), 42.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_percentiles_are_ordered() {
        for len in 1..=250usize {
            let samples: Vec<f64> = (0..len).map(|i| ((i * 7919) % 1000) as f64).collect();
            let summary = LatencySummary::from_samples(&samples);
            assert!(summary.p90_ms <= summary.p95_ms, "len {}", len);
            assert!(summary.p95_ms <= summary.p99_ms, "len {}", len);
            assert!(summary.p99_ms <= summary.max_ms, "len {}", len);
            assert!(summary.min_ms <= summary.median_ms, "len {}", len);
        }
    }

    #[test]
    fn test_median_even_length() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[7.0]), 7.0);
    }

    #[test]
    fn test_bands() {
        assert_eq!(ResponseBand::from_mean_ms(499.9), ResponseBand::Excellent);
        assert_eq!(ResponseBand::from_mean_ms(500.0), ResponseBand::Good);
        assert_eq!(ResponseBand::from_mean_ms(1500.0), ResponseBand::Acceptable);
        assert_eq!(ResponseBand::from_mean_ms(2000.0), ResponseBand::Poor);

        assert_eq!(ReliabilityBand::from_success_rate(95.1), ReliabilityBand::Excellent);
        assert_eq!(ReliabilityBand::from_success_rate(95.0), ReliabilityBand::Good);
        assert_eq!(ReliabilityBand::from_success_rate(90.0), ReliabilityBand::Poor);
    }

    #[test]
    fn test_sample_counts_from_first_success() {
        let counts = DashboardCounts {
            users: 1,
            books: 2,
            transactions: 3,
        };
        let records = vec![
            err(0, 1.0),
            RequestRecord::success(RequestId::Sequence(1), 1.0, 1, counts, 0.0),
        ];
        let summary = Summary::from_records(&records, Duration::from_secs(1), 1);
        assert_eq!(summary.sample_counts, Some(counts));
    }
}
