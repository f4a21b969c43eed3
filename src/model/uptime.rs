use chrono::{DateTime, Utc};
use serde::Serialize;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_DAY: u64 = 86400;

/// Time since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UptimeSnapshot {
    pub total_seconds: u64,
    pub boot_time: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

impl UptimeSnapshot {
    /// Builds a snapshot observed at `timestamp`, deriving the boot time.
    pub fn from_seconds(total_seconds: u64, timestamp: DateTime<Utc>) -> Self {
        let boot_time = i64::try_from(total_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|elapsed| timestamp.checked_sub_signed(elapsed))
            .unwrap_or(timestamp);
        Self {
            total_seconds,
            boot_time,
            timestamp,
        }
    }

    pub fn days(&self) -> u64 {
        self.total_seconds / SECONDS_PER_DAY
    }

    /// Hours past the last whole day.
    pub fn hours(&self) -> u64 {
        (self.total_seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR
    }

    /// Minutes past the last whole hour.
    pub fn minutes(&self) -> u64 {
        (self.total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE
    }

    pub fn total_hours(&self) -> f64 {
        self.total_seconds as f64 / SECONDS_PER_HOUR as f64
    }

    pub fn total_minutes(&self) -> f64 {
        self.total_seconds as f64 / SECONDS_PER_MINUTE as f64
    }

    /// Formats as "2 days, 3 hours, 1 minute", skipping zero components.
    pub fn human_readable(&self) -> String {
        let mut parts = Vec::new();
        for (value, unit) in [
            (self.days(), "day"),
            (self.hours(), "hour"),
            (self.minutes(), "minute"),
        ] {
            if value > 0 {
                let suffix = if value == 1 { "" } else { "s" };
                parts.push(format!("{} {}{}", value, unit, suffix));
            }
        }
        if parts.is_empty() {
            return "0 minutes".to_string();
        }
        parts.join(", ")
    }
}
