//! Uptime from `/proc/uptime` and `sysctl kern.boottime`.
//!
//! Both parsers take the observation time as context so they stay pure.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{non_empty, Fields};
use crate::error::ParseError;
use crate::model::UptimeSnapshot;

const PROC_UPTIME: &str = "/proc/uptime";
const KERN_BOOTTIME: &str = "sysctl kern.boottime";

/// `{ sec = 1762527162, usec = 610941 } Fri Nov  7 ...`; `usec` must not match.
static BOOT_SECONDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsec\s*=\s*(\d+)").expect("valid boottime pattern"));

/// Parses `/proc/uptime` ("350735.47 234388.90"): uptime seconds, then idle seconds.
///
/// Fractional seconds are floored.
pub fn parse_proc_uptime(content: &str, now: DateTime<Utc>) -> Result<UptimeSnapshot, ParseError> {
    let content = non_empty(content, PROC_UPTIME)?;
    let fields = Fields::split(PROC_UPTIME, content);
    fields.expect_at_least(2, "idle")?;

    let raw = fields.text(0).unwrap_or_default();
    let seconds: f64 = fields.required(0, "uptime")?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ParseError::malformed(PROC_UPTIME, "uptime", raw));
    }

    Ok(UptimeSnapshot::from_seconds(seconds.floor() as u64, now))
}

/// Parses `sysctl kern.boottime`, extracting `sec = N` by pattern.
pub fn parse_kern_boottime(
    content: &str,
    now: DateTime<Utc>,
) -> Result<UptimeSnapshot, ParseError> {
    let content = non_empty(content, KERN_BOOTTIME)?;

    let captured = BOOT_SECONDS
        .captures(content)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ParseError::missing(KERN_BOOTTIME, "sec"))?
        .as_str();
    let boot_seconds: i64 = captured
        .parse()
        .map_err(|_| ParseError::malformed(KERN_BOOTTIME, "sec", captured))?;
    if boot_seconds <= 0 {
        return Err(ParseError::malformed(KERN_BOOTTIME, "sec", captured));
    }

    let boot_time = Utc
        .timestamp_opt(boot_seconds, 0)
        .single()
        .ok_or_else(|| ParseError::malformed(KERN_BOOTTIME, "sec", captured))?;
    let total_seconds = now.timestamp() - boot_seconds;
    if total_seconds < 0 {
        // Boot time in the future
        return Err(ParseError::malformed(KERN_BOOTTIME, "sec", captured));
    }

    Ok(UptimeSnapshot {
        total_seconds: total_seconds as u64,
        boot_time,
        timestamp: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_762_600_000, 0).single().expect("valid timestamp")
    }

    // -------------------------------------------------------------------------
    // /proc/uptime
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_proc_uptime_floors_seconds() {
        let up = parse_proc_uptime("350735.97 234388.90\n", now()).expect("parse");
        assert_eq!(up.total_seconds, 350735);
        assert_eq!(up.timestamp, now());
        assert_eq!(up.boot_time.timestamp(), 1_762_600_000 - 350735);
    }

    #[test]
    fn test_parse_proc_uptime_rejects_negative() {
        let err = parse_proc_uptime("-5.00 1.00\n", now()).unwrap_err();
        assert_eq!(err, ParseError::malformed(PROC_UPTIME, "uptime", "-5.00"));
    }

    #[test]
    fn test_parse_proc_uptime_needs_two_fields() {
        let err = parse_proc_uptime("12.5\n", now()).unwrap_err();
        assert_eq!(err, ParseError::missing(PROC_UPTIME, "idle"));
    }

    #[test]
    fn test_parse_proc_uptime_malformed() {
        let err = parse_proc_uptime("abc 1.0\n", now()).unwrap_err();
        assert_eq!(err, ParseError::malformed(PROC_UPTIME, "uptime", "abc"));
    }

    // -------------------------------------------------------------------------
    // kern.boottime
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_kern_boottime() {
        let text = "kern.boottime: { sec = 1762527162, usec = 610941 } Fri Nov  7 15:52:42 2025\n";
        let up = parse_kern_boottime(text, now()).expect("parse");
        assert_eq!(up.boot_time.timestamp(), 1_762_527_162);
        assert_eq!(up.total_seconds, 1_762_600_000 - 1_762_527_162);
    }

    #[test]
    fn test_parse_kern_boottime_without_name() {
        let up = parse_kern_boottime("{ sec = 1762599000, usec = 0 }", now()).expect("parse");
        assert_eq!(up.total_seconds, 1000);
    }

    #[test]
    fn test_parse_kern_boottime_in_future() {
        let err = parse_kern_boottime("{ sec = 1900000000, usec = 0 }", now()).unwrap_err();
        assert!(matches!(err, ParseError::MalformedField { .. }));
    }

    #[test]
    fn test_parse_kern_boottime_zero_and_missing() {
        let err = parse_kern_boottime("{ sec = 0, usec = 0 }", now()).unwrap_err();
        assert!(matches!(err, ParseError::MalformedField { .. }));

        let err = parse_kern_boottime("kern.boottime: unknown", now()).unwrap_err();
        assert_eq!(err, ParseError::missing(KERN_BOOTTIME, "sec"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_proc_uptime("", now()).unwrap_err(), ParseError::empty(PROC_UPTIME));
        assert_eq!(parse_kern_boottime("\n", now()).unwrap_err(), ParseError::empty(KERN_BOOTTIME));
    }
}
