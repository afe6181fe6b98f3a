pub mod time;

pub use time::{file_safe_timestamp, format_timestamp};
