//! CPU tick counters, snapshots and deltas.

use serde::Serialize;

use crate::derived;

/// Cumulative CPU time counters since boot, in clock ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// Calculate total CPU time (all fields).
    pub fn total(&self) -> u64 {
        self.busy().saturating_add(self.idle_total())
    }

    /// Time spent doing work: total minus idle and iowait.
    pub fn busy(&self) -> u64 {
        [self.nice, self.system, self.irq, self.softirq, self.steal]
            .iter()
            .fold(self.user, |acc, v| acc.saturating_add(*v))
    }

    /// Calculate non-active time (idle + iowait).
    pub fn idle_total(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    /// Field-wise `self - earlier`, or `None` if any counter went backwards.
    pub fn checked_sub(&self, earlier: &CpuTimes) -> Option<CpuTimes> {
        Some(CpuTimes {
            user: self.user.checked_sub(earlier.user)?,
            nice: self.nice.checked_sub(earlier.nice)?,
            system: self.system.checked_sub(earlier.system)?,
            idle: self.idle.checked_sub(earlier.idle)?,
            iowait: self.iowait.checked_sub(earlier.iowait)?,
            irq: self.irq.checked_sub(earlier.irq)?,
            softirq: self.softirq.checked_sub(earlier.softirq)?,
            steal: self.steal.checked_sub(earlier.steal)?,
        })
    }

    /// Field-wise sum, used when aggregating process groups.
    pub fn saturating_add(&self, other: &CpuTimes) -> CpuTimes {
        CpuTimes {
            user: self.user.saturating_add(other.user),
            nice: self.nice.saturating_add(other.nice),
            system: self.system.saturating_add(other.system),
            idle: self.idle.saturating_add(other.idle),
            iowait: self.iowait.saturating_add(other.iowait),
            irq: self.irq.saturating_add(other.irq),
            softirq: self.softirq.saturating_add(other.softirq),
            steal: self.steal.saturating_add(other.steal),
        }
    }

    /// Busy share of total time since boot, in percent.
    pub fn busy_percentage(&self) -> f64 {
        derived::usage_percentage(self)
    }
}

/// Counters of a single core, tagged with the index the OS reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuCoreTimes {
    pub core_index: usize,
    pub times: CpuTimes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuSnapshot {
    pub total: CpuTimes,
    pub per_core: Vec<CpuCoreTimes>,
}

impl CpuSnapshot {
    pub fn core_count(&self) -> usize {
        self.per_core.len()
    }

    pub fn find_core(&self, core_index: usize) -> Option<&CpuCoreTimes> {
        derived::find_core(&self.per_core, core_index)
    }

    /// Cores whose lifetime busy percentage is at least `threshold`.
    pub fn find_busy_cores(&self, threshold: f64) -> Vec<&CpuCoreTimes> {
        self.per_core
            .iter()
            .filter(|c| c.times.total() > 0 && c.times.busy_percentage() >= threshold)
            .collect()
    }

    /// Cores whose lifetime idle percentage is at least `threshold`.
    pub fn find_idle_cores(&self, threshold: f64) -> Vec<&CpuCoreTimes> {
        self.per_core
            .iter()
            .filter(|c| {
                c.times.total() > 0
                    && derived::percentage(c.times.idle, c.times.total()) >= threshold
            })
            .collect()
    }

    pub fn busiest_core(&self) -> Option<&CpuCoreTimes> {
        derived::busiest_by(&self.per_core, |c| c.times.busy_percentage())
    }

    pub fn idlest_core(&self) -> Option<&CpuCoreTimes> {
        derived::idlest_by(&self.per_core, |c| c.times.busy_percentage())
    }
}

/// Tick differences of one core between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CpuCoreDelta {
    pub core_index: usize,
    pub delta: CpuTimes,
}

impl CpuCoreDelta {
    pub fn usage_percentage(&self) -> f64 {
        derived::usage_percentage(&self.delta)
    }

    pub fn idle_percentage(&self) -> f64 {
        derived::percentage(self.delta.idle, self.delta.total())
    }

    pub fn user_percentage(&self) -> f64 {
        derived::percentage(self.delta.user, self.delta.total())
    }

    pub fn system_percentage(&self) -> f64 {
        derived::percentage(self.delta.system, self.delta.total())
    }
}

/// Difference of two CPU snapshots taken `duration_seconds` apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuDelta {
    pub total_delta: CpuTimes,
    pub per_core_delta: Vec<CpuCoreDelta>,
    pub duration_seconds: f64,
}

impl CpuDelta {
    /// Computes `end - start`.
    ///
    /// Returns `None` when the snapshots have different core layouts or any
    /// counter decreased (counter reset, e.g. after a reboot).
    pub fn between(start: &CpuSnapshot, end: &CpuSnapshot, duration_seconds: f64) -> Option<Self> {
        if start.per_core.len() != end.per_core.len() {
            return None;
        }

        let total_delta = end.total.checked_sub(&start.total)?;
        let mut per_core_delta = Vec::with_capacity(end.per_core.len());
        for (a, b) in start.per_core.iter().zip(end.per_core.iter()) {
            if a.core_index != b.core_index {
                return None;
            }
            per_core_delta.push(CpuCoreDelta {
                core_index: b.core_index,
                delta: b.times.checked_sub(&a.times)?,
            });
        }

        Some(CpuDelta {
            total_delta,
            per_core_delta,
            duration_seconds,
        })
    }

    fn share(&self, part: u64) -> f64 {
        if self.duration_seconds <= 0.0 {
            return 0.0;
        }
        derived::percentage(part, self.total_delta.total())
    }

    pub fn usage_percentage(&self) -> f64 {
        self.share(self.total_delta.busy())
    }

    /// Usage divided by the number of cores.
    pub fn normalized_usage_percentage(&self) -> f64 {
        if self.per_core_delta.is_empty() {
            return 0.0;
        }
        self.usage_percentage() / self.per_core_delta.len() as f64
    }

    pub fn user_percentage(&self) -> f64 {
        self.share(self.total_delta.user)
    }

    pub fn system_percentage(&self) -> f64 {
        self.share(self.total_delta.system)
    }

    pub fn idle_percentage(&self) -> f64 {
        self.share(self.total_delta.idle)
    }

    pub fn iowait_percentage(&self) -> f64 {
        self.share(self.total_delta.iowait)
    }

    pub fn core_usage_percentage(&self, core_index: usize) -> Option<f64> {
        self.per_core_delta
            .iter()
            .find(|c| c.core_index == core_index)
            .map(CpuCoreDelta::usage_percentage)
    }

    pub fn busiest_core(&self) -> Option<&CpuCoreDelta> {
        derived::busiest_by(&self.per_core_delta, CpuCoreDelta::usage_percentage)
    }

    pub fn idlest_core(&self) -> Option<&CpuCoreDelta> {
        derived::idlest_by(&self.per_core_delta, CpuCoreDelta::usage_percentage)
    }
}
