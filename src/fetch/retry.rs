//! Retry-after extraction for rate-limited responses.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Rate-limit header carrying a duration such as `1m13.6s`.
pub const RATELIMIT_RETRY_AFTER: &str = "x-ratelimit-retryafter";

/// Longest delay honoured before a retry.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60 * 60);

/// Delay requested by a 429 response.
///
/// `X-Ratelimit-Retryafter` wins over the standard `Retry-After` (seconds).
/// An absent or unparsable value means retry immediately.
pub fn retry_after(headers: &HeaderMap) -> Duration {
    let delay = header_str(headers, RATELIMIT_RETRY_AFTER)
        .and_then(parse_duration)
        .or_else(|| {
            header_str(headers, RETRY_AFTER.as_str())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
        })
        .unwrap_or(Duration::ZERO);

    delay.min(MAX_RETRY_DELAY)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parse a duration written as a sequence of decimal numbers with units,
/// e.g. `300ms`, `1.5h` or `2h45m`.
///
/// Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare `0`
/// is accepted. Negative durations are rejected.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let mut rest = input.trim();
    if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }
    if rest == "0" {
        return Some(Duration::ZERO);
    }
    if rest.is_empty() {
        return None;
    }

    let mut total = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let value: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        rest = &rest[unit_len..];

        total += value * nanos_per_unit;
    }

    if !total.is_finite() || total > u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(total as u64))
}
