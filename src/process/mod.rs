//! Per-process metrics and process-group discovery.
//!
//! This module provides:
//! - `sysconf`: clock tick rate and page size from the kernel
//! - `scanner`: process table enumeration over an acquirer
//! - `tree`: parent to children index and descendant walk
//!
//! [`ProcessSource`] ties them together. Only procfs hosts are supported;
//! elsewhere every call fails with `UnsupportedPlatform`.

pub mod scanner;
pub mod sysconf;
pub mod tree;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, trace};

use crate::acquire::Acquire;
use crate::error::Result;
use crate::model::{OsFamily, ProcessDelta, ProcessGroupSnapshot, ProcessSnapshot};
use crate::parsers::process::parse_pid_stat;
use crate::platform::unsupported;
use crate::sources::SourceContext;

pub use scanner::{collect_proc_entries, count_open_fds, scan_parent_pids, ProcEntry};
pub use sysconf::{CLK_TCK, PAGE_SIZE};
pub use tree::ProcessTree;

const DOMAIN: &str = "process";

#[derive(Debug, Clone)]
struct ProcReader {
    proc_root: PathBuf,
    page_size: u64,
}

pub struct ProcessSource {
    platform: OsFamily,
    reader: Option<ProcReader>,
    clock_ticks_per_second: f64,
    acquirer: Arc<dyn Acquire>,
}

impl ProcessSource {
    pub fn new(ctx: &SourceContext, platform: OsFamily, acquirer: Arc<dyn Acquire>) -> Self {
        let reader = (platform == OsFamily::Linux).then(|| ProcReader {
            proc_root: ctx.proc_root.clone(),
            page_size: ctx.page_size,
        });
        Self {
            platform,
            reader,
            clock_ticks_per_second: ctx.clock_ticks_per_second,
            acquirer,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.reader.is_some()
    }

    pub fn clock_ticks_per_second(&self) -> f64 {
        self.clock_ticks_per_second
    }

    fn reader(&self) -> Result<&ProcReader> {
        self.reader
            .as_ref()
            .ok_or_else(|| unsupported(DOMAIN, self.platform))
    }

    /// Reads one process from `/proc/[pid]/stat` and its fd directory.
    pub fn read(&self, pid: u32) -> Result<ProcessSnapshot> {
        let reader = self.reader()?;
        let acq = self.acquirer.as_ref();
        let proc_path = reader.proc_root.join(pid.to_string());

        let content = acq.read_file(&proc_path.join("stat"))?;
        let stat = parse_pid_stat(&content, reader.page_size)?;

        let mut resources = stat.usage;
        resources.open_file_descriptors = count_open_fds(acq, &proc_path).unwrap_or_else(|err| {
            trace!(pid, error = %err, "fd directory unreadable");
            0
        });

        Ok(ProcessSnapshot {
            pid: stat.pid,
            parent_pid: stat.parent_pid,
            resources,
            timestamp: Utc::now(),
        })
    }

    /// Reads `root_pid` and every live descendant.
    ///
    /// The root must be readable. Descendants that exit between the table
    /// scan and their own read are counted in `omitted_children`.
    pub fn read_group(&self, root_pid: u32) -> Result<ProcessGroupSnapshot> {
        let reader = self.reader()?;
        let root = self.read(root_pid)?;

        let pairs = scan_parent_pids(self.acquirer.as_ref(), &reader.proc_root)?;
        let tree = ProcessTree::from_pairs(pairs);
        let descendants = tree.descendants(root_pid);

        let mut children = Vec::with_capacity(descendants.len());
        let mut omitted_children = 0;
        for pid in descendants {
            match self.read(pid) {
                Ok(child) => children.push(child),
                Err(err) => {
                    trace!(pid, error = %err, "descendant vanished");
                    omitted_children += 1;
                }
            }
        }
        children.sort_unstable_by_key(|c| c.pid);

        if omitted_children > 0 {
            debug!(root_pid, omitted_children, "process group read omitted children");
        }

        Ok(ProcessGroupSnapshot {
            root_pid,
            root,
            children,
            omitted_children,
            timestamp: Utc::now(),
        })
    }

    /// Delta between two reads of the same process, at this host's tick rate.
    pub fn delta(&self, start: &ProcessSnapshot, end: &ProcessSnapshot) -> Option<ProcessDelta> {
        ProcessDelta::between(start, end, self.clock_ticks_per_second)
    }
}
