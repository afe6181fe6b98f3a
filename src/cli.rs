use std::path::{Path, PathBuf};

use clap::Parser;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::debug::{init_logging, DebugTarget};
use crate::error::{AppError, AppResult, ConfigError};
use crate::payload::{generate_variations, payload_overrides};
use crate::report::{print_results, print_summary, save_results};
use crate::request::{set_defaults, ConfigOverride, Dispatcher, HttpMethod, OverrideSpec};

const DEFAULT_COUNT: usize = 5;

#[derive(Debug, Parser, Clone)]
#[clap(version, about = "Fire N concurrent HTTP requests and summarize the outcomes.")]
pub struct FanoutArgs {
    /// Number of concurrent requests (defaults to the payload count, or 5)
    #[arg(value_parser = parse_count)]
    pub count: Option<usize>,

    /// Target URL
    #[arg(long, short = 'e', env = "RUSTY_FANOUT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// HTTP method
    #[arg(long, short = 'X', value_enum)]
    pub method: Option<HttpMethod>,

    /// Bearer token; blank means no Authorization header
    #[arg(long, short = 't', env = "RUSTY_FANOUT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// JSON body shared by every request (POST/PUT/PATCH only)
    #[arg(long, short = 'd', value_parser = parse_json)]
    pub body: Option<Value>,

    /// JSON file holding an array of objects, one body per request
    #[arg(long)]
    pub payloads: Option<PathBuf>,

    /// JSON file holding one object; each request gets a numbered variation of it
    #[arg(long, conflicts_with = "payloads")]
    pub variations: Option<PathBuf>,

    /// Keep going when a request task is rejected instead of failing the batch
    #[arg(long)]
    pub settled: bool,

    /// Save results as JSON (default name: api-results-<timestamp>.json)
    #[arg(long, short = 's', num_args = 0..=1)]
    pub save: Option<Option<PathBuf>>,

    /// Print every result as JSON
    #[arg(long, short = 'p')]
    pub pretty: bool,

    /// With --pretty, truncate response data to a preview
    #[arg(long, requires = "pretty")]
    pub compact: bool,

    /// Debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Log destination: "console" or a file/directory path
    #[arg(long = "log-target", default_value = "console")]
    pub log_target: String,
}

pub(crate) fn parse_count(s: &str) -> Result<usize, ConfigError> {
    let count: i64 = s
        .trim()
        .parse()
        .map_err(|_| ConfigError::NotANumber { value: s.to_owned() })?;
    if count < 1 {
        return Err(ConfigError::InvalidCount { count });
    }
    usize::try_from(count).map_err(|_| ConfigError::InvalidCount { count })
}

pub(crate) fn parse_json(s: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(s)
}

impl FanoutArgs {
    /// The batch-wide layer described by the flags.
    pub fn batch_layer(&self) -> ConfigOverride {
        ConfigOverride {
            endpoint: self.endpoint.clone(),
            method: self.method,
            token: self.token.clone(),
            body: self.body.clone(),
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let text = std::fs::read_to_string(path).map_err(|source| AppError::ReadPayloads {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| AppError::ParsePayloads {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve how many requests to send and what each slot overrides.
///
/// Per-slot bodies are sent with `-X` when given and POST otherwise.
pub fn plan(args: &FanoutArgs) -> AppResult<(usize, OverrideSpec)> {
    let slot_layer = ConfigOverride::new().method(args.method.unwrap_or(HttpMethod::Post));

    if let Some(path) = &args.payloads {
        let payloads: Vec<Value> = read_json(path)?;
        let count = args.count.unwrap_or(payloads.len());
        return Ok((count, payload_overrides(payloads, &slot_layer)?));
    }

    if let Some(path) = &args.variations {
        let base: Value = read_json(path)?;
        let count = args.count.unwrap_or(DEFAULT_COUNT);
        let payloads = generate_variations::<fn(Value, usize) -> Value>(&base, count, None);
        return Ok((count, payload_overrides(payloads, &slot_layer)?));
    }

    Ok((args.count.unwrap_or(DEFAULT_COUNT), OverrideSpec::default()))
}

pub async fn run(args: FanoutArgs) -> AppResult<()> {
    init_logging(args.verbose, &DebugTarget::parse(&args.log_target));

    let (count, spec) = plan(&args)?;
    set_defaults(&args.batch_layer());

    let dispatcher = Dispatcher::new()?;
    let outcome = if args.settled {
        dispatcher.dispatch_settled(count, spec).await?
    } else {
        dispatcher.dispatch(count, spec).await?
    };

    print_summary(&outcome);

    if let Some(target) = &args.save {
        let path = save_results(&outcome.results, target.as_deref())?;
        println!("Results saved to: {}", path.display());
    }

    if args.pretty {
        print_results(&outcome.results, !args.compact);
    }

    println!("\nAll {} requests completed!", count);
    Ok(())
}
