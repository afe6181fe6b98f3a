use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-05-01T12:00:00.123Z`.
pub fn format_timestamp(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Same as [`format_timestamp`] with `:` and `.` replaced so it can go in a file name.
pub fn file_safe_timestamp(time: SystemTime) -> String {
    format_timestamp(time).replace([':', '.'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn formats_iso8601_utc() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_millis(1_500);
        assert_eq!(format_timestamp(time), "1970-01-01T00:00:01.500Z");
        assert_eq!(file_safe_timestamp(time), "1970-01-01T00-00-01-500Z");
    }
}
