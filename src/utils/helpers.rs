/// Formatting helpers

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

/// Format an uptime as "Hh Mm Ss"; hours are not folded into days
pub fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    format!("{}h {}m {}s", hours, minutes, secs)
}

/// ISO-8601 UTC timestamp with millisecond precision
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
