// Per-request result records
//
// Every dispatched request yields exactly one RequestRecord, including
// transport failures. Records are built once and never modified.

use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Identity of a request within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum RequestId {
    /// Measured request, numbered from 0
    Sequence(u64),
    /// Warmup request, numbered from 1
    Warmup(u32),
}

impl RequestId {
    pub fn is_warmup(&self) -> bool {
        matches!(self, RequestId::Warmup(_))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Sequence(n) => write!(f, "{}", n),
            RequestId::Warmup(n) => write!(f, "warmup-{}", n),
        }
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.to_string()
    }
}

/// Classification of a completed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "Success",
            Outcome::Error => "Error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Totals embedded in a dashboard payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub users: u64,
    pub books: u64,
    pub transactions: u64,
}

/// One completed request attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    pub id: RequestId,
    /// Wall-clock completion time
    pub timestamp: DateTime<Local>,
    /// Client-side elapsed time from send to full body receipt
    pub response_time_ms: f64,
    pub outcome: Outcome,
    /// 0 when no response was received
    pub status_code: u16,
    /// Raw response body length in bytes
    pub data_size: usize,
    /// Empty for successful requests
    pub error_message: String,
    /// Zero unless the request succeeded
    pub counts: DashboardCounts,
    /// Server-reported execution time, 0 when absent
    pub execution_time_ms: f64,
}

impl RequestRecord {
    /// Successful dashboard fetch
    pub fn success(
        id: RequestId,
        response_time_ms: f64,
        data_size: usize,
        counts: DashboardCounts,
        execution_time_ms: f64,
    ) -> Self {
        Self {
            id,
            timestamp: Local::now(),
            response_time_ms,
            outcome: Outcome::Success,
            status_code: 200,
            data_size,
            error_message: String::new(),
            counts,
            execution_time_ms,
        }
    }

    /// A response arrived but did not qualify as a dashboard payload
    pub fn http_error(
        id: RequestId,
        response_time_ms: f64,
        status_code: u16,
        data_size: usize,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            timestamp: Local::now(),
            response_time_ms,
            outcome: Outcome::Error,
            status_code,
            data_size,
            error_message: error_message.into(),
            counts: DashboardCounts::default(),
            execution_time_ms: 0.0,
        }
    }

    /// The request failed in transport, timing out or while decoding
    ///
    /// `status_code` is 0 when the failure happened before any response.
    pub fn transport_error(
        id: RequestId,
        response_time_ms: f64,
        status_code: u16,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            timestamp: Local::now(),
            response_time_ms,
            outcome: Outcome::Error,
            status_code,
            data_size: 0,
            error_message: error_message.into(),
            counts: DashboardCounts::default(),
            execution_time_ms: 0.0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}
