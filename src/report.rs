use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use serde_json::Value;

use crate::error::ReportError;
use crate::request::{BatchOutcome, BatchSummary, RequestResult};
use crate::utils::{file_safe_timestamp, format_timestamp};

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub timestamp: String,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub success_rate: String,
}

impl ReportMetadata {
    pub fn from_results(results: &[RequestResult]) -> Self {
        let summary = BatchSummary::from_results(results);
        Self {
            timestamp: format_timestamp(SystemTime::now()),
            total_requests: summary.total,
            successful_requests: summary.successful,
            failed_requests: summary.failed,
            success_rate: summary.success_rate_label(),
        }
    }
}

/// On-disk layout of a saved batch.
#[derive(Debug, Clone, Serialize)]
pub struct SavedReport<'a> {
    pub metadata: ReportMetadata,
    pub results: &'a [RequestResult],
}

/// Response-time figures over the successful requests, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub average_ms: f64,
    pub min_ms: u128,
    pub max_ms: u128,
    pub median_ms: u128,
    /// Slowest request of the batch, failures included.
    pub slowest_ms: u128,
}

impl PerformanceStats {
    pub fn from_results(results: &[RequestResult]) -> Self {
        let mut durations: Vec<u128> = results
            .iter()
            .filter(|r| r.success)
            .filter_map(RequestResult::duration_ms)
            .collect();
        durations.sort_unstable();

        let slowest_ms = results.iter().filter_map(RequestResult::duration_ms).max().unwrap_or(0);
        if durations.is_empty() {
            return Self { slowest_ms, ..Self::default() };
        }

        let sum: u128 = durations.iter().sum();
        Self {
            average_ms: sum as f64 / durations.len() as f64,
            min_ms: durations[0],
            max_ms: durations[durations.len() - 1],
            median_ms: durations[durations.len() / 2],
            slowest_ms,
        }
    }
}

impl fmt::Display for PerformanceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Average response time: {:.1}ms", self.average_ms)?;
        writeln!(f, "Min/median/max response time: {}ms / {}ms / {}ms", self.min_ms, self.median_ms, self.max_ms)?;
        write!(f, "Slowest request: {}ms", self.slowest_ms)
    }
}

fn default_file_name() -> PathBuf {
    PathBuf::from(format!("api-results-{}.json", file_safe_timestamp(SystemTime::now())))
}

/// Write `results` as pretty JSON with a metadata header. Returns the path written.
pub fn save_results(results: &[RequestResult], path: Option<&Path>) -> Result<PathBuf, ReportError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_file_name);
    let report = SavedReport { metadata: ReportMetadata::from_results(results), results };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&path, json).map_err(|source| ReportError::Write { path: path.clone(), source })?;
    tracing::info!(path = %path.display(), total = results.len(), "results saved");
    Ok(path)
}

fn preview(data: &Value) -> String {
    let text = match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

/// Compact per-request view with the response data cut to a preview.
pub fn compact_view(result: &RequestResult) -> Value {
    serde_json::json!({
        "requestId": result.request_id,
        "success": result.success,
        "status": result.status,
        "duration": result.duration.to_string(),
        "timestamp": result.timestamp,
        "dataPreview": result.data.as_ref().map(preview),
        "error": result.error,
    })
}

fn indent(text: &str, pad: &str) -> String {
    text.lines().map(|line| format!("{}{}", pad, line)).collect::<Vec<_>>().join("\n")
}

pub fn print_summary(outcome: &BatchOutcome) {
    let summary = &outcome.summary;
    println!("\nRESULTS SUMMARY ({}):", outcome.policy);
    println!("{}", "=".repeat(50));
    println!("Total execution time: {}ms", outcome.elapsed.as_millis());
    println!("Successful requests: {}/{}", summary.successful, summary.total);
    println!("Failed requests: {}/{}", summary.failed, summary.total);
    println!("Success rate: {}", summary.success_rate_label());
    println!("{}\n", PerformanceStats::from_results(&outcome.results));

    for result in &outcome.results {
        println!("Request {}:", result.request_id);
        println!("  Status: {}", if result.success { "Success" } else { "Failed" });
        match result.status {
            Some(status) => println!("  HTTP Status: {}", status),
            None => println!("  HTTP Status: N/A"),
        }
        println!("  Duration: {}", result.duration);
        println!("  Timestamp: {}", result.timestamp);
        if let (true, Some(data)) = (result.success, &result.data) {
            let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
            println!("  Response Data:\n{}", indent(&pretty, "    "));
        } else if let Some(error) = &result.error {
            println!("  Error: {}", error);
        }
        println!();
    }
}

/// Pretty-print every result, in full or as a compact preview.
pub fn print_results(results: &[RequestResult], full: bool) {
    println!("\nPRETTIFIED RESULTS:");
    println!("{}", "=".repeat(80));
    for result in results {
        println!("\nREQUEST {} DETAILS:", result.request_id);
        println!("{}", "-".repeat(40));
        let view = if full {
            serde_json::to_value(result).unwrap_or(Value::Null)
        } else {
            compact_view(result)
        };
        let text = serde_json::to_string_pretty(&view).unwrap_or_else(|_| view.to_string());
        println!("{}", text);
    }
    println!("\n{}", "=".repeat(80));
}
