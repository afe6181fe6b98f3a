//! Fire a batch of concurrent HTTP requests and get exactly one normalized
//! result per request back, in request order.
//!
//! ```no_run
//! use rusty_fanout::{ConfigOverride, Dispatcher, HttpMethod};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::new()?;
//! let outcome = dispatcher
//!     .dispatch(3, ConfigOverride::new().method(HttpMethod::Get).endpoint("https://api.example/ok"))
//!     .await?;
//! println!("{}", outcome.summary);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod debug;
pub mod error;
pub mod payload;
pub mod report;
pub mod request;
pub mod utils;

pub use error::{AppError, ConfigError, DispatchError, ReportError, RequestFailure};
pub use request::{
    defaults, execute_single_request, init_defaults, resolve_configs, set_defaults, BatchOutcome,
    BatchSummary, ConfigOverride, DispatchPolicy, Dispatcher, Elapsed, HttpMethod, OverrideSpec,
    RequestConfig, RequestResult, ReqwestTransport, Transport, TransportResponse,
};
