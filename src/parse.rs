//! Parsing and formatting of human-readable sizes, durations and number
//! ranges.

use std::ops::RangeInclusive;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

const HOUR: u64 = 3600;
const DAY: u64 = 24 * HOUR;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 12 * MONTH;

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([0-9]+)\s*(?:([KMGTPE])(B|iB)?|B)?\s*$").expect("valid size regex")
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[0-9]+\s*[hdmy]\s*)+$").expect("valid duration regex")
});

static DURATION_TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9]+)\s*([hdmy])").expect("valid duration term regex"));

/// Errors from parsing user input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("'{0}' is not a valid file size")]
    Size(String),

    #[error("'{0}' is too large")]
    SizeOverflow(String),

    #[error("'{0}' is not a valid time duration")]
    Duration(String),

    #[error("'{0}' is not a valid number range: number ranges must only contain positive integers")]
    Range(String),
}

/// Parse a file size such as `500`, `10M`, `10MB` or `3GiB`.
///
/// Prefixes `K` through `E` are case-insensitive. A bare prefix or an `iB`
/// suffix is binary (1024); a `B` suffix after a prefix is metric (1000).
/// A plain number, optionally followed by `B`, is a byte count.
pub fn parse_size(input: &str) -> Result<u64, ParseError> {
    let caps = SIZE_RE
        .captures(input)
        .ok_or_else(|| ParseError::Size(input.to_string()))?;

    let coefficient: u64 = caps[1]
        .parse()
        .map_err(|_| ParseError::SizeOverflow(input.to_string()))?;

    let Some(prefix) = caps.get(2) else {
        return Ok(coefficient);
    };

    let exponent = match prefix.as_str().to_ascii_lowercase().as_str() {
        "k" => 1,
        "m" => 2,
        "g" => 3,
        "t" => 4,
        "p" => 5,
        "e" => 6,
        _ => return Err(ParseError::Size(input.to_string())),
    };
    let base: u64 = match caps.get(3).map(|m| m.as_str()) {
        Some("B") | Some("b") => 1000,
        _ => 1024,
    };

    base.checked_pow(exponent)
        .and_then(|multiplier| coefficient.checked_mul(multiplier))
        .ok_or_else(|| ParseError::SizeOverflow(input.to_string()))
}

/// Parse a duration made of `<n>h`, `<n>d`, `<n>m` and `<n>y` terms, such as
/// `1y6m` or `12h`. Terms are added up; a month is 30 days and a year is 12
/// months.
pub fn parse_duration(input: &str) -> Result<Duration, ParseError> {
    if !DURATION_RE.is_match(input) {
        return Err(ParseError::Duration(input.to_string()));
    }

    let mut total: u64 = 0;
    for caps in DURATION_TERM_RE.captures_iter(input) {
        let unit = match caps[2].to_ascii_lowercase().as_str() {
            "h" => HOUR,
            "d" => DAY,
            "m" => MONTH,
            _ => YEAR,
        };
        total = caps[1]
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_mul(unit))
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| ParseError::Duration(input.to_string()))?;
    }
    Ok(Duration::from_secs(total))
}

/// Parse a comma separated list of numbers and ranges, such as `1-9,15,17-20`.
///
/// Blank input yields no ranges.
pub fn parse_number_ranges(input: &str) -> Result<Vec<RangeInclusive<usize>>, ParseError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let invalid = || ParseError::Range(input.to_string());
    input
        .split(',')
        .map(|part| {
            let mut bounds = part.split('-').map(|n| n.trim().parse::<usize>());
            let start = bounds.next().ok_or_else(invalid)?.map_err(|_| invalid())?;
            let end = match bounds.next() {
                Some(end) => end.map_err(|_| invalid())?,
                None => start,
            };
            if bounds.next().is_some() || end < start {
                return Err(invalid());
            }
            Ok(start..=end)
        })
        .collect()
}

/// Format a byte count with binary units.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("10K"), Ok(10 * 1024));
        assert_eq!(parse_size("10KiB"), Ok(10 * 1024));
        assert_eq!(parse_size("10KB"), Ok(10_000));
        assert_eq!(parse_size("10kb"), Ok(10_000));
        assert_eq!(parse_size("3 gib"), Ok(3 * 1024 * 1024 * 1024));
        assert_eq!(parse_size("2T"), Ok(2 * 1024u64.pow(4)));
        assert_eq!(parse_size("1EB"), Ok(1000u64.pow(6)));
    }

    #[test]
    fn test_parse_size_plain_bytes() {
        assert_eq!(parse_size("512"), Ok(512));
        assert_eq!(parse_size("512B"), Ok(512));
        assert_eq!(parse_size(" 0 "), Ok(0));
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        for input in ["", "K", "10X", "1.5G", "-3M", "10 M B", "10MiBs"] {
            assert_eq!(parse_size(input), Err(ParseError::Size(input.to_string())), "{input}");
        }
        assert_eq!(
            parse_size("16E"),
            Err(ParseError::SizeOverflow("16E".to_string()))
        );
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("0h"), Ok(Duration::ZERO));
        assert_eq!(parse_duration("12h"), Ok(Duration::from_secs(12 * HOUR)));
        assert_eq!(parse_duration("2d"), Ok(Duration::from_secs(2 * DAY)));
        assert_eq!(parse_duration("1M"), Ok(Duration::from_secs(30 * DAY)));
        assert_eq!(parse_duration("1y"), Ok(Duration::from_secs(360 * DAY)));
        assert_eq!(
            parse_duration("1y 6m 2d"),
            Ok(Duration::from_secs(YEAR + 6 * MONTH + 2 * DAY))
        );
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for input in ["", "10", "h", "3w", "1d junk"] {
            assert!(parse_duration(input).is_err(), "{input}");
        }
    }

    #[test]
    fn test_parse_number_ranges() {
        assert_eq!(
            parse_number_ranges("1-9,15, 17 - 20"),
            Ok(vec![1..=9, 15..=15, 17..=20])
        );
        assert_eq!(parse_number_ranges("   "), Ok(Vec::new()));
        for input in ["a", "1-", "1-2-3", "5-3", "1,,2", "-1"] {
            assert!(parse_number_ranges(input).is_err(), "{input}");
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1536), "1.50 KiB");
    }
}
