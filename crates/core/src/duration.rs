// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human duration strings (`"30s"`, `"10m"`, `"7d"`) and schedule expressions.

use std::time::Duration;
use thiserror::Error;

const DAY_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration string")]
    Empty,
    #[error("invalid number in duration: {0}")]
    InvalidNumber(String),
    #[error("unknown duration suffix: {0}")]
    UnknownSuffix(String),
}

/// Parse a duration string like "30s", "5m", "1h", "7d" into a Duration.
///
/// A bare number is seconds; `"0"` is a valid zero duration.
pub fn parse_duration(s: &str) -> Result<Duration, DurationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }

    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str.parse().map_err(|_| DurationError::InvalidNumber(s.to_string()))?;

    let multiplier = match suffix.trim() {
        "ms" => return Ok(Duration::from_millis(num)),
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => DAY_SECS,
        other => return Err(DurationError::UnknownSuffix(other.to_string())),
    };

    Ok(Duration::from_secs(num.saturating_mul(multiplier)))
}

/// Whole days in a duration, rounded down.
pub fn whole_days(d: Duration) -> u64 {
    d.as_secs() / DAY_SECS
}

/// Render a `rate(...)` schedule expression for a duration.
///
/// Uses the largest unit that divides the duration evenly, matching the
/// provider's singular/plural grammar (`rate(1 day)`, `rate(7 days)`).
/// Returns `None` for sub-minute durations, which the scheduler cannot express.
pub fn rate_expression(d: Duration) -> Option<String> {
    let secs = d.as_secs();
    if secs < 60 {
        return None;
    }
    let (n, unit) = if secs % DAY_SECS == 0 {
        (secs / DAY_SECS, "day")
    } else if secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else {
        (secs / 60, "minute")
    };
    let plural = if n == 1 { "" } else { "s" };
    Some(format!("rate({n} {unit}{plural})"))
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
