//! Snapshot commands, one per metric domain.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use serde::Serialize;

use hostmetrics::{CpuDelta, LoadAverageSnapshot, MountPoint, NormalizedLoadAverage, SourceSet};

use super::print_output;
use crate::cli::OutputFormat;

#[derive(Serialize)]
struct CoreUsage {
    core_index: usize,
    usage_percentage: f64,
}

/// Usage over a sampling interval, flattened for printing.
#[derive(Serialize)]
struct CpuUsageReport {
    duration_seconds: f64,
    core_count: usize,
    usage_percentage: f64,
    normalized_usage_percentage: f64,
    user_percentage: f64,
    system_percentage: f64,
    idle_percentage: f64,
    iowait_percentage: f64,
    busiest_core: Option<usize>,
    idlest_core: Option<usize>,
    per_core: Vec<CoreUsage>,
}

impl From<&CpuDelta> for CpuUsageReport {
    fn from(delta: &CpuDelta) -> Self {
        Self {
            duration_seconds: delta.duration_seconds,
            core_count: delta.per_core_delta.len(),
            usage_percentage: delta.usage_percentage(),
            normalized_usage_percentage: delta.normalized_usage_percentage(),
            user_percentage: delta.user_percentage(),
            system_percentage: delta.system_percentage(),
            idle_percentage: delta.idle_percentage(),
            iowait_percentage: delta.iowait_percentage(),
            busiest_core: delta.busiest_core().map(|c| c.core_index),
            idlest_core: delta.idlest_core().map(|c| c.core_index),
            per_core: delta
                .per_core_delta
                .iter()
                .map(|c| CoreUsage {
                    core_index: c.core_index,
                    usage_percentage: c.usage_percentage(),
                })
                .collect(),
        }
    }
}

pub fn command_cpu(
    sources: &SourceSet,
    sample_ms: Option<u64>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let start = sources.cpu.read()?;
    let Some(ms) = sample_ms else {
        return print_output(&start, format);
    };

    let started = Instant::now();
    thread::sleep(Duration::from_millis(ms));
    let end = sources.cpu.read()?;
    let delta = CpuDelta::between(&start, &end, started.elapsed().as_secs_f64())
        .ok_or_else(|| {
            anyhow!("CPU counters went backwards or core layout changed while sampling")
        })?;
    print_output(&CpuUsageReport::from(&delta), format)
}

pub fn command_memory(sources: &SourceSet, format: OutputFormat) -> anyhow::Result<()> {
    print_output(&sources.memory.read()?, format)
}

#[derive(Serialize)]
struct LoadReport {
    load: LoadAverageSnapshot,
    normalized: Option<NormalizedLoadAverage>,
}

pub fn command_load(sources: &SourceSet, format: OutputFormat) -> anyhow::Result<()> {
    let load = sources.load.read()?;
    // Without a core count the raw values are still useful
    let normalized = sources
        .cpu
        .read()
        .ok()
        .map(|cpu| cpu.core_count())
        .filter(|cores| *cores > 0)
        .map(|cores| load.normalized(cores));
    print_output(&LoadReport { load, normalized }, format)
}

pub fn command_uptime(sources: &SourceSet, format: OutputFormat) -> anyhow::Result<()> {
    let uptime = sources.uptime.read()?;
    tracing::debug!("up {}", uptime.human_readable());
    print_output(&uptime, format)
}

pub fn command_network(sources: &SourceSet, format: OutputFormat) -> anyhow::Result<()> {
    print_output(&sources.network.read()?, format)
}

pub fn command_storage(
    sources: &SourceSet,
    path: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let storage = sources.storage.read()?;
    match path {
        None => print_output(&storage, format),
        Some(path) => {
            let mount: &MountPoint = storage
                .find_mount_point(path)
                .with_context(|| format!("no mount point holds {}", path))?;
            print_output(mount, format)
        }
    }
}

pub fn command_process(
    sources: &SourceSet,
    pid: Option<u32>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let pid = pid.unwrap_or_else(std::process::id);
    let snapshot = sources
        .process
        .read(pid)
        .with_context(|| format!("failed to read process {}", pid))?;
    print_output(&snapshot, format)
}

pub fn command_group(sources: &SourceSet, pid: u32, format: OutputFormat) -> anyhow::Result<()> {
    let group = sources
        .process
        .read_group(pid)
        .with_context(|| format!("failed to read process group {}", pid))?;
    print_output(&group, format)
}

pub fn command_environment(sources: &SourceSet, format: OutputFormat) -> anyhow::Result<()> {
    print_output(&sources.environment.read()?, format)
}
