use std::path::PathBuf;

use thiserror::Error;

/// Invalid dispatch arguments. Always surfaced before any request is sent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Request count must be a positive integer, got {count}.")]
    InvalidCount { count: i64 },
    #[error("Request count must be a positive integer, got '{value}'.")]
    NotANumber { value: String },
    #[error("Override list was empty.")]
    EmptyOverrideList,
    #[error("Slot {slot} has no endpoint configured.")]
    MissingEndpoint { slot: usize },
    #[error("Slot {slot} has an invalid endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        slot: usize,
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Payloads must be a non-empty array.")]
    EmptyPayloads,
    #[error("Payload at index {index} must be a valid JSON object.")]
    PayloadNotObject { index: usize },
    #[error("Unsupported HTTP method '{value}'. Use GET, POST, PUT, PATCH or DELETE.")]
    UnsupportedMethod { value: String },
}

/// Why a single request did not succeed. Rendered into `RequestResult::error`,
/// never raised past the executor.
#[derive(Debug, Error)]
pub enum RequestFailure {
    #[error("{source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("{message}")]
    Connection { message: String },
    #[error("HTTP {status}: {status_text}")]
    HttpStatus { status: u16, status_text: String },
    #[error("Failed to read response body: {source}")]
    ReadBody {
        status: u16,
        status_text: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Task rejected: {reason}")]
    Rejected { reason: String },
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Config error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
    #[error("Request {request_id} was rejected before producing a result: {source}")]
    SlotRejected {
        request_id: usize,
        #[source]
        source: tokio::task::JoinError,
    },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to serialize results: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("Failed to write results to '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Top-level error of the command-line tool.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{source}")]
    Dispatch {
        #[from]
        source: DispatchError,
    },
    #[error("{source}")]
    Config {
        #[from]
        source: ConfigError,
    },
    #[error("{source}")]
    Report {
        #[from]
        source: ReportError,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[from]
        source: reqwest::Error,
    },
    #[error("Failed to read payloads '{path}': {source}")]
    ReadPayloads {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse payloads '{path}': {source}")]
    ParsePayloads {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type AppResult<T> = Result<T, AppError>;
