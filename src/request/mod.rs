// request/mod.rs

pub mod request_item;
pub mod executor;
pub mod concurrency;
pub mod config;
pub mod result;

// 重新导出，方便上层直接使用
pub use request_item::{ConfigOverride, HttpMethod, RequestConfig};
pub use executor::{execute_single_request, parse_body, ReqwestTransport, Transport, TransportResponse};
pub use concurrency::{execute_settled, execute_with_join_all, DispatchPolicy, Dispatcher};
pub use config::{defaults, init_defaults, resolve_configs, set_defaults, OverrideSpec};
pub use result::{BatchOutcome, BatchSummary, Elapsed, RequestResult};
