//! Duration literals used by event rotations (`#@ duration: 1h30m`).

use chrono::TimeDelta;
use tracing::debug;

/// Length assumed for an event whose rotation has no usable `duration`.
pub const DEFAULT_EVENT_DURATION_MINS: i64 = 60;

/// Longest accepted event; anything longer is treated as a typo.
pub const MAX_EVENT_DURATION_DAYS: i64 = 30;

/// Parse durations like "45m", "1h", "1h30m", "90s".
fn parse_duration(s: &str) -> Option<TimeDelta> {
    let mut total_secs: i64 = 0;
    let mut num_buf = String::new();
    let mut has_unit = false;

    for ch in s.trim().chars() {
        if ch.is_ascii_digit() {
            num_buf.push(ch);
        } else {
            let n: i64 = num_buf.parse().ok()?;
            num_buf.clear();
            let unit = match ch {
                'd' => 86400,
                'h' => 3600,
                'm' => 60,
                's' => 1,
                _ => return None,
            };
            total_secs = total_secs.checked_add(n.checked_mul(unit)?)?;
            has_unit = true;
        }
    }

    if !num_buf.is_empty() {
        // Trailing digits with no unit
        return None;
    }

    if has_unit && total_secs > 0 && total_secs <= MAX_EVENT_DURATION_DAYS * 86400 {
        TimeDelta::try_seconds(total_secs)
    } else {
        None
    }
}

/// Event length from rotation metadata, one hour when missing or invalid.
pub fn event_duration(literal: Option<&str>) -> TimeDelta {
    let default = TimeDelta::minutes(DEFAULT_EVENT_DURATION_MINS);
    match literal {
        None => default,
        Some(raw) => parse_duration(raw).unwrap_or_else(|| {
            debug!(duration = raw, "invalid event duration, using default");
            default
        }),
    }
}
