use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use reqwest::header::HeaderMap;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where log events go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugTarget {
    Console,
    File(PathBuf),
}

impl DebugTarget {
    /// `"console"` or empty means stderr; a directory gets a `debug.log` inside it.
    pub fn parse(target: &str) -> Self {
        if target.is_empty() || target.eq_ignore_ascii_case("console") {
            return DebugTarget::Console;
        }
        let path = Path::new(target);
        if path.is_dir() {
            DebugTarget::File(path.join("debug.log"))
        } else {
            DebugTarget::File(path.to_path_buf())
        }
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    std::env::var("RUSTY_FANOUT_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| {
                if verbose {
                    EnvFilter::new("debug")
                } else {
                    EnvFilter::new("info")
                }
            },
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        )
}

pub fn init_logging(verbose: bool, target: &DebugTarget) {
    let builder = FmtSubscriber::builder().with_env_filter(env_filter(verbose));

    let result = match target {
        DebugTarget::Console => {
            tracing::subscriber::set_global_default(builder.with_writer(std::io::stderr).finish())
        }
        DebugTarget::File(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => tracing::subscriber::set_global_default(
                builder.with_ansi(false).with_writer(Mutex::new(file)).finish(),
            ),
            Err(err) => {
                eprintln!("Failed to open log file '{}': {}", path.display(), err);
                tracing::subscriber::set_global_default(builder.with_writer(std::io::stderr).finish())
            }
        },
    };

    if let Err(err) = result {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

/// Per-response debug event. Only rendered when debug is enabled.
pub fn debug_log(method: &str, request_id: usize, url: &str, status: u16, headers: &HeaderMap, body: &str) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let headers: Vec<String> = headers
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v.to_str().unwrap_or("<binary>")))
        .collect();
    tracing::debug!(
        request_id,
        method,
        url,
        status,
        headers = ?headers,
        body,
        "response received"
    );
}
