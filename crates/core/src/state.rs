// Run-scoped state
//
// One RunState per load test. The token is written once after login and
// records are only ever appended, by the single task driving the batches.

use crate::client::BearerToken;
use crate::config::LoadTestConfig;
use crate::record::RequestRecord;

#[derive(Debug)]
pub struct RunState {
    config: LoadTestConfig,
    token: Option<BearerToken>,
    records: Vec<RequestRecord>,
    warmup: Vec<RequestRecord>,
}

impl RunState {
    pub fn new(config: LoadTestConfig) -> Self {
        Self {
            config,
            token: None,
            records: Vec::new(),
            warmup: Vec::new(),
        }
    }

    pub fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    /// Store the bearer token. Returns false if a token was already set.
    pub fn set_token(&mut self, token: BearerToken) -> bool {
        if self.token.is_some() {
            return false;
        }
        self.token = Some(token);
        true
    }

    pub fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    /// Append measured records, returning the new total
    pub fn extend_records(&mut self, batch: impl IntoIterator<Item = RequestRecord>) -> usize {
        self.records.extend(batch);
        self.records.len()
    }

    pub fn push_warmup(&mut self, record: RequestRecord) {
        self.warmup.push(record);
    }

    /// Measured records in dispatch order; warmup excluded
    pub fn records(&self) -> &[RequestRecord] {
        &self.records
    }

    pub fn warmup_records(&self) -> &[RequestRecord] {
        &self.warmup
    }

    pub fn success_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn error_count(&self) -> usize {
        self.records.len() - self.success_count()
    }

    /// Mean response time over successful measured records, 0 if none
    pub fn mean_success_ms(&self) -> f64 {
        let (sum, n) = self
            .records
            .iter()
            .filter(|r| r.is_success())
            .fold((0.0, 0usize), |(sum, n), r| (sum + r.response_time_ms, n + 1));
        if n == 0 {
            0.0
        } else {
            sum / n as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DashboardCounts, RequestId};

    fn ok(id: u64, ms: f64) -> RequestRecord {
        RequestRecord::success(RequestId::Sequence(id), ms, 10, DashboardCounts::default(), 0.0)
    }

    #[test]
    fn test_token_is_set_once() {
        let mut state = RunState::new(LoadTestConfig::default());
        assert!(state.token().is_none());
        assert!(state.set_token(BearerToken::new("first")));
        assert!(!state.set_token(BearerToken::new("second")));
        assert_eq!(state.token().map(|t| t.as_str()), Some("first"));
    }

    #[test]
    fn test_running_counts() {
        let mut state = RunState::new(LoadTestConfig::default());
        let total = state.extend_records(vec![
            ok(0, 100.0),
            ok(1, 300.0),
            RequestRecord::http_error(RequestId::Sequence(2), 5.0, 500, 0, "HTTP 500"),
        ]);
        assert_eq!(total, 3);
        assert_eq!(state.success_count(), 2);
        assert_eq!(state.error_count(), 1);
        assert_eq!(state.mean_success_ms(), 200.0);
    }

    #[test]
    fn test_warmup_kept_apart() {
        let mut state = RunState::new(LoadTestConfig::default());
        state.push_warmup(RequestRecord::success(
            RequestId::Warmup(1),
            50.0,
            10,
            DashboardCounts::default(),
            0.0,
        ));
        assert!(state.records().is_empty());
        assert_eq!(state.warmup_records().len(), 1);
        assert_eq!(state.mean_success_ms(), 0.0);
    }
}
