// Dashboard request driver
//
// Issues one authenticated dashboard request, times it, and turns whatever
// happens into exactly one RequestRecord.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::client::{ApiClient, BearerToken};
use crate::record::{DashboardCounts, RequestId, RequestRecord};
use crate::scheduler::RequestProbe;

/// Top-level key that marks a dashboard payload
pub const DASHBOARD_KEY: &str = "dashboard";

const USERS_POINTER: &str = "/dashboard/userAnalytics/totalUsers";
const BOOKS_POINTER: &str = "/dashboard/bookAnalytics/totalBooks";
const TRANSACTIONS_POINTER: &str = "/dashboard/transactionAnalytics/totalTransactions";
const EXECUTION_TIME_POINTER: &str = "/metadata/executionTimeMs";

/// Probe that hits the real dashboard endpoint
pub struct DashboardProbe {
    client: Arc<ApiClient>,
    token: BearerToken,
}

impl DashboardProbe {
    pub fn new(client: Arc<ApiClient>, token: BearerToken) -> Self {
        Self { client, token }
    }

    /// Perform one request. Never fails: errors become Error records.
    pub async fn fetch(&self, id: RequestId) -> RequestRecord {
        let _slot = self.client.acquire_slot().await;
        let start = Instant::now();

        let response = match self.client.get_dashboard(&self.token).await {
            Ok(response) => response,
            Err(e) => {
                let record =
                    RequestRecord::transport_error(id, elapsed_ms(start), 0, self.describe(&e));
                tracing::warn!(request = %id, error = %record.error_message, "Request failed");
                return record;
            }
        };

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                let record =
                    RequestRecord::transport_error(id, elapsed_ms(start), status, self.describe(&e));
                tracing::warn!(request = %id, error = %record.error_message, "Reading response failed");
                return record;
            }
        };

        let record = classify(id, elapsed_ms(start), status, &body);
        tracing::debug!(
            request = %id,
            status,
            outcome = %record.outcome,
            elapsed_ms = record.response_time_ms,
            "Request completed"
        );
        record
    }

    fn describe(&self, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            format!(
                "timed out after {}s: {}",
                self.client.request_timeout().as_secs_f64(),
                e
            )
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else {
            e.to_string()
        }
    }
}

impl RequestProbe for DashboardProbe {
    async fn execute(&self, id: RequestId) -> RequestRecord {
        self.fetch(id).await
    }
}

/// Classify a fully received response
pub fn classify(id: RequestId, response_time_ms: f64, status: u16, body: &[u8]) -> RequestRecord {
    if status != 200 {
        return RequestRecord::http_error(
            id,
            response_time_ms,
            status,
            body.len(),
            format!("HTTP {}", status),
        );
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return RequestRecord::transport_error(
                id,
                response_time_ms,
                status,
                format!("invalid JSON body: {}", e),
            )
        }
    };

    if value.get(DASHBOARD_KEY).is_none() {
        return RequestRecord::http_error(
            id,
            response_time_ms,
            status,
            body.len(),
            "HTTP 200: response has no dashboard payload",
        );
    }

    RequestRecord::success(
        id,
        response_time_ms,
        body.len(),
        extract_counts(&value),
        extract_execution_time(&value),
    )
}

/// Pull the three totals out of a dashboard body, 0 for anything missing
pub fn extract_counts(body: &Value) -> DashboardCounts {
    let count = |pointer: &str| body.pointer(pointer).and_then(Value::as_u64).unwrap_or(0);
    DashboardCounts {
        users: count(USERS_POINTER),
        books: count(BOOKS_POINTER),
        transactions: count(TRANSACTIONS_POINTER),
    }
}

pub fn extract_execution_time(body: &Value) -> f64 {
    body.pointer(EXECUTION_TIME_POINTER)
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
