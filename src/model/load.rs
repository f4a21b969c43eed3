use serde::Serialize;

use crate::derived::normalized_load;

/// System load averages for 1, 5, and 15 minute intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadAverageSnapshot {
    pub one_minute: f64,
    pub five_minutes: f64,
    pub fifteen_minutes: f64,
}

impl LoadAverageSnapshot {
    /// Divides every window by the number of cores.
    pub fn normalized(&self, core_count: usize) -> NormalizedLoadAverage {
        NormalizedLoadAverage {
            one_minute: normalized_load(self.one_minute, core_count),
            five_minutes: normalized_load(self.five_minutes, core_count),
            fifteen_minutes: normalized_load(self.fifteen_minutes, core_count),
            core_count,
        }
    }
}

/// Load per core; 1.0 means the system runs at full capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NormalizedLoadAverage {
    pub one_minute: f64,
    pub five_minutes: f64,
    pub fifteen_minutes: f64,
    pub core_count: usize,
}

impl NormalizedLoadAverage {
    pub fn one_minute_percentage(&self) -> f64 {
        self.one_minute * 100.0
    }

    pub fn five_minutes_percentage(&self) -> f64 {
        self.five_minutes * 100.0
    }

    pub fn fifteen_minutes_percentage(&self) -> f64 {
        self.fifteen_minutes * 100.0
    }
}
