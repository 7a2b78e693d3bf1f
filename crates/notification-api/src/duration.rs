//! # Duration Parsing
//!
//! Parses the compact duration notation used by `interval` and `timeout`:
//! one or more `<digits>[.<digits>]<unit>` segments, e.g. `30s`, `1.5s` or
//! `1m30s`. Intervals accept `ms`, `s`, `m` and `h`; timeouts stop at `m`.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

/// Pattern accepted by `interval` fields
pub const INTERVAL_PATTERN: &str = r"^([0-9]+(\.[0-9]+)?(ms|s|m|h))+$";

/// Pattern accepted by `timeout` fields
pub const TIMEOUT_PATTERN: &str = r"^([0-9]+(\.[0-9]+)?(ms|s|m))+$";

/// Request timeout assumed when a Provider does not set one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

// Largest span representable by the API server's duration type.
const MAX_NANOS: u64 = i64::MAX.unsigned_abs();

// Digits beyond this add nothing measurable at nanosecond precision.
const MAX_FRACTION_DIGITS: usize = 18;

#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static INTERVAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(INTERVAL_PATTERN).expect("interval pattern compiles"));

#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static TIMEOUT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TIMEOUT_PATTERN).expect("timeout pattern compiles"));

/// Grammar a duration literal is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationFormat {
    /// Reconcile interval: units `ms`, `s`, `m`, `h`
    Interval,

    /// Per-request timeout: units `ms`, `s`, `m`; must be positive
    Timeout,
}

impl DurationFormat {
    /// Regular expression literal for this grammar
    pub const fn pattern(self) -> &'static str {
        match self {
            DurationFormat::Interval => INTERVAL_PATTERN,
            DurationFormat::Timeout => TIMEOUT_PATTERN,
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            DurationFormat::Interval => &INTERVAL_REGEX,
            DurationFormat::Timeout => &TIMEOUT_REGEX,
        }
    }

    fn requires_positive(self) -> bool {
        matches!(self, DurationFormat::Timeout)
    }
}

/// Reasons a duration literal is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    /// Literal does not match the grammar
    #[error("'{value}' does not match {pattern}")]
    Malformed {
        /// Offending literal
        value: String,
        /// Expected pattern
        pattern: &'static str,
    },

    /// Literal is well-formed but exceeds the representable range
    #[error("'{value}' overflows the maximum duration")]
    Overflow {
        /// Offending literal
        value: String,
    },

    /// Literal parses to a zero span where a positive one is required
    #[error("'{value}' must be greater than zero")]
    NotPositive {
        /// Offending literal
        value: String,
    },
}

/// Parse a duration literal according to `format`
///
/// Each segment contributes `number * unit`; segments are summed. A
/// fractional part is scaled to the unit, so `1.5s` is 1500ms.
pub fn parse_duration(value: &str, format: DurationFormat) -> Result<Duration, DurationError> {
    if !format.regex().is_match(value) {
        return Err(DurationError::Malformed {
            value: value.to_string(),
            pattern: format.pattern(),
        });
    }

    let overflow = || DurationError::Overflow {
        value: value.to_string(),
    };

    let mut total: u64 = 0;
    let mut rest = value;
    while !rest.is_empty() {
        let (whole, tail) = split_digits(rest);
        let (fraction, tail) = match tail.strip_prefix('.') {
            Some(after_dot) => split_digits(after_dot),
            None => ("", tail),
        };
        let (unit, tail) = split_unit(tail).ok_or_else(|| DurationError::Malformed {
            value: value.to_string(),
            pattern: format.pattern(),
        })?;

        let mut segment = whole
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_mul(unit))
            .ok_or_else(overflow)?;

        if !fraction.is_empty() {
            let digits = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
            let numerator: u128 = digits.parse().map_err(|_parse| overflow())?;
            let scale = digits.bytes().fold(1_u128, |acc, _| acc * 10);
            let nanos = u64::try_from(numerator * u128::from(unit) / scale).map_err(|_range| overflow())?;
            segment = segment.checked_add(nanos).ok_or_else(overflow)?;
        }

        total = total.checked_add(segment).ok_or_else(overflow)?;
        rest = tail;
    }

    if total > MAX_NANOS {
        return Err(overflow());
    }
    if total == 0 && format.requires_positive() {
        return Err(DurationError::NotPositive {
            value: value.to_string(),
        });
    }

    Ok(Duration::from_nanos(total))
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

// Returns the unit length in nanoseconds and the remaining input.
fn split_unit(s: &str) -> Option<(u64, &str)> {
    const MILLISECOND: u64 = 1_000_000;
    const SECOND: u64 = 1_000 * MILLISECOND;

    // "ms" must be tried before "m".
    if let Some(rest) = s.strip_prefix("ms") {
        Some((MILLISECOND, rest))
    } else if let Some(rest) = s.strip_prefix('s') {
        Some((SECOND, rest))
    } else if let Some(rest) = s.strip_prefix('m') {
        Some((60 * SECOND, rest))
    } else if let Some(rest) = s.strip_prefix('h') {
        Some((3_600 * SECOND, rest))
    } else {
        None
    }
}
