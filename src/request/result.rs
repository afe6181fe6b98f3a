use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::RequestFailure;
use crate::request::concurrency::DispatchPolicy;
use crate::request::request_item::{HttpMethod, RequestConfig};
use crate::utils::format_timestamp;

/// Wall-clock time spent on one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elapsed {
    Measured(Duration),
    /// The slot never produced a measurement (rejected task).
    NotAvailable,
}

impl Elapsed {
    pub fn as_millis(&self) -> Option<u128> {
        match self {
            Elapsed::Measured(d) => Some(d.as_millis()),
            Elapsed::NotAvailable => None,
        }
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Elapsed::Measured(d) => write!(f, "{}ms", d.as_millis()),
            Elapsed::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Elapsed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of one slot. Built only through the constructors below so that
/// `success` never coexists with an error and a failure never carries data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResult {
    pub request_id: usize,
    pub method: HttpMethod,
    pub endpoint: String,
    pub success: bool,
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub duration: Elapsed,
    pub timestamp: String,
    pub request_body: Option<Value>,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl RequestResult {
    fn base(request_id: usize, config: &RequestConfig, duration: Elapsed) -> Self {
        Self {
            request_id,
            method: config.method,
            endpoint: config.endpoint.clone(),
            success: false,
            status: None,
            status_text: None,
            duration,
            timestamp: format_timestamp(std::time::SystemTime::now()),
            request_body: config.body.clone(),
            data: None,
            error: None,
        }
    }

    pub(crate) fn succeeded(
        request_id: usize,
        config: &RequestConfig,
        status: u16,
        status_text: String,
        data: Value,
        elapsed: Duration,
    ) -> Self {
        Self {
            success: true,
            status: Some(status),
            status_text: Some(status_text),
            data: Some(data),
            ..Self::base(request_id, config, Elapsed::Measured(elapsed))
        }
    }

    /// A failed slot. Any failure that got a response back keeps the status line.
    pub(crate) fn failed(
        request_id: usize,
        config: &RequestConfig,
        failure: &RequestFailure,
        elapsed: Elapsed,
    ) -> Self {
        let (status, status_text) = match failure {
            RequestFailure::HttpStatus { status, status_text }
            | RequestFailure::ReadBody { status, status_text, .. } => {
                (Some(*status), Some(status_text.clone()))
            }
            _ => (None, None),
        };
        Self {
            status,
            status_text,
            error: Some(failure.to_string()),
            ..Self::base(request_id, config, elapsed)
        }
    }

    pub fn duration_ms(&self) -> Option<u128> {
        self.duration.as_millis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage in `0.0..=100.0`.
    pub success_rate: f64,
}

impl BatchSummary {
    pub fn from_results(results: &[RequestResult]) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        let success_rate = if total == 0 { 0.0 } else { successful as f64 / total as f64 * 100.0 };
        Self { total, successful, failed: total - successful, success_rate }
    }

    /// e.g. `"66.7%"`
    pub fn success_rate_label(&self) -> String {
        format!("{:.1}%", self.success_rate)
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} succeeded, {} failed ({})",
            self.successful,
            self.total,
            self.failed,
            self.success_rate_label()
        )
    }
}

/// Everything one dispatch call produced.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub policy: DispatchPolicy,
    pub results: Vec<RequestResult>,
    pub summary: BatchSummary,
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub(crate) fn new(policy: DispatchPolicy, results: Vec<RequestResult>, elapsed: Duration) -> Self {
        let summary = BatchSummary::from_results(&results);
        Self { policy, results, summary, elapsed }
    }

    pub fn successful(&self) -> impl Iterator<Item = &RequestResult> {
        self.results.iter().filter(|r| r.success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &RequestResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
