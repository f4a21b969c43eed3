//! Per-process resource usage, process groups and deltas between samples.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::cpu::CpuTimes;

/// Resources held by one process, or by a whole group when aggregated.
///
/// Only `user` and `system` of `cpu_times` are populated for processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessResourceUsage {
    pub cpu_times: CpuTimes,
    pub rss_bytes: u64,
    pub vms_bytes: u64,
    pub thread_count: u64,
    pub open_file_descriptors: u64,
    pub process_count: u64,
}

impl ProcessResourceUsage {
    /// Field-wise sum of two usages, including the process count.
    pub fn combine(&self, other: &ProcessResourceUsage) -> ProcessResourceUsage {
        ProcessResourceUsage {
            cpu_times: self.cpu_times.saturating_add(&other.cpu_times),
            rss_bytes: self.rss_bytes.saturating_add(other.rss_bytes),
            vms_bytes: self.vms_bytes.saturating_add(other.vms_bytes),
            thread_count: self.thread_count.saturating_add(other.thread_count),
            open_file_descriptors: self
                .open_file_descriptors
                .saturating_add(other.open_file_descriptors),
            process_count: self.process_count.saturating_add(other.process_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub parent_pid: u32,
    pub resources: ProcessResourceUsage,
    pub timestamp: DateTime<Utc>,
}

/// A root process and every live descendant found at scan time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessGroupSnapshot {
    pub root_pid: u32,
    pub root: ProcessSnapshot,
    /// Sorted by pid.
    pub children: Vec<ProcessSnapshot>,
    /// Descendants that were enumerated but exited before they could be read.
    pub omitted_children: usize,
    pub timestamp: DateTime<Utc>,
}

impl ProcessGroupSnapshot {
    pub fn total_process_count(&self) -> usize {
        1 + self.children.len()
    }

    /// Resources of the root and all children added together.
    pub fn total_resources(&self) -> ProcessResourceUsage {
        self.children
            .iter()
            .fold(self.root.resources, |acc, child| acc.combine(&child.resources))
    }

    pub fn child_pids(&self) -> Vec<u32> {
        self.children.iter().map(|c| c.pid).collect()
    }
}

/// Change of one process between two samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessDelta {
    pub pid: u32,
    pub cpu_delta: CpuTimes,
    pub memory_delta_bytes: i64,
    pub duration_seconds: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Clock ticks per second the CPU counters are expressed in.
    pub clock_ticks_per_second: f64,
}

impl ProcessDelta {
    /// Computes `end - start` for the same process, timed by the snapshot timestamps.
    ///
    /// Returns `None` for different pids, a non-positive duration or a
    /// counter that went backwards (pid reuse).
    pub fn between(
        start: &ProcessSnapshot,
        end: &ProcessSnapshot,
        clock_ticks_per_second: f64,
    ) -> Option<Self> {
        if start.pid != end.pid {
            return None;
        }
        let duration = end.timestamp.signed_duration_since(start.timestamp);
        let duration_seconds = duration.num_microseconds()? as f64 / 1_000_000.0;
        if duration_seconds <= 0.0 {
            return None;
        }

        let cpu_delta = end.resources.cpu_times.checked_sub(&start.resources.cpu_times)?;
        let memory_delta_bytes =
            signed_difference(end.resources.rss_bytes, start.resources.rss_bytes);

        Some(ProcessDelta {
            pid: end.pid,
            cpu_delta,
            memory_delta_bytes,
            duration_seconds,
            start_time: start.timestamp,
            end_time: end.timestamp,
            clock_ticks_per_second,
        })
    }

    /// CPU seconds used per wall-clock second, in percent.
    ///
    /// Exceeds 100 for processes running on several cores at once.
    pub fn cpu_usage_percentage(&self) -> f64 {
        if self.duration_seconds <= 0.0 || self.clock_ticks_per_second <= 0.0 {
            return 0.0;
        }
        let cpu_seconds = self.cpu_delta.total() as f64 / self.clock_ticks_per_second;
        cpu_seconds / self.duration_seconds * 100.0
    }
}

/// `end - start` as a signed value, clamped to the `i64` range.
fn signed_difference(end: u64, start: u64) -> i64 {
    let diff = i128::from(end) - i128::from(start);
    i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
}
