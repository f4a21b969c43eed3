//! Process table scanning over an acquirer.
//!
//! Scans the proc root for numeric entries and reads each process's own
//! `stat` file. Processes can exit at any moment, so a failed read during a
//! scan is skipped rather than reported.

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::acquire::Acquire;
use crate::error::{AcquisitionError, Result};
use crate::parsers::process::parse_parent_pid;

/// Process entry representing a directory in the proc filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Lists the numeric entries of `proc_root`, ascending by pid.
pub fn collect_proc_entries(acquirer: &dyn Acquire, proc_root: &Path) -> Result<Vec<ProcEntry>> {
    let mut out: Vec<ProcEntry> = acquirer
        .list_dir(proc_root)?
        .into_iter()
        .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|name| {
            let pid = name.parse().ok()?;
            Some(ProcEntry {
                pid,
                proc_path: proc_root.join(name),
            })
        })
        .collect();
    out.sort_unstable_by_key(|e| e.pid);
    Ok(out)
}

/// Reads `(pid, ppid)` for every live process in one pass.
///
/// Listing the proc root is the only fatal step.
pub fn scan_parent_pids(acquirer: &dyn Acquire, proc_root: &Path) -> Result<Vec<(u32, u32)>> {
    let entries = collect_proc_entries(acquirer, proc_root)?;
    let mut pairs = Vec::with_capacity(entries.len());
    for entry in entries {
        let content = match acquirer.read_file(&entry.proc_path.join("stat")) {
            Ok(c) => c,
            Err(err) => {
                trace!(pid = entry.pid, error = %err, "skipping process");
                continue;
            }
        };
        match parse_parent_pid(&content) {
            Ok(pair) => pairs.push(pair),
            Err(err) => trace!(pid = entry.pid, error = %err, "skipping unparsable stat"),
        }
    }
    Ok(pairs)
}

/// Counts the entries of `/proc/[pid]/fd`.
///
/// Reading another user's descriptors needs privileges; a denied listing
/// counts as 0 rather than failing the process read.
pub fn count_open_fds(
    acquirer: &dyn Acquire,
    proc_path: &Path,
) -> std::result::Result<u64, AcquisitionError> {
    match acquirer.list_dir(&proc_path.join("fd")) {
        Ok(entries) => Ok(entries.len() as u64),
        Err(AcquisitionError::PermissionDenied { .. }) => Ok(0),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::MockAcquirer;

    fn stat(pid: u32, ppid: u32) -> String {
        format!("{pid} (proc {pid}) S {ppid} 1 1 0 -1 0 0 0 0 0 1 1 0 0 20 0 1 0 0 4096 10 0")
    }

    #[test]
    fn test_collect_proc_entries_only_numeric() {
        let root = Path::new("/proc");
        let mut acq = MockAcquirer::new();
        acq.add_process(root, 10, &stat(10, 1), 0)
            .add_process(root, 2, &stat(2, 1), 0)
            .add_file("/proc/stat", "cpu 1 2 3 4")
            .add_dir("/proc/self");

        let entries = collect_proc_entries(&acq, root).expect("scan");
        let pids: Vec<u32> = entries.iter().map(|e| e.pid).collect();
        assert_eq!(pids, vec![2, 10]);
        assert_eq!(entries[0].proc_path, PathBuf::from("/proc/2"));
    }

    #[test]
    fn test_scan_skips_vanished_and_garbled() {
        let root = Path::new("/proc");
        let mut acq = MockAcquirer::new();
        acq.add_process(root, 1, &stat(1, 0), 0)
            .add_process(root, 2, &stat(2, 1), 0)
            .add_process(root, 3, "garbage", 0)
            // Directory listed but stat gone: exited mid-scan
            .add_dir("/proc/4");

        let pairs = scan_parent_pids(&acq, root).expect("scan");
        assert_eq!(pairs, vec![(1, 0), (2, 1)]);
    }

    #[test]
    fn test_scan_fails_without_proc_root() {
        assert!(scan_parent_pids(&MockAcquirer::new(), Path::new("/proc")).is_err());
    }

    #[test]
    fn test_count_open_fds() {
        let root = Path::new("/proc");
        let mut acq = MockAcquirer::new();
        acq.add_process(root, 5, &stat(5, 1), 3)
            .add_process(root, 6, &stat(6, 1), 0)
            .deny("/proc/6/fd");

        assert_eq!(count_open_fds(&acq, Path::new("/proc/5")), Ok(3));
        assert_eq!(count_open_fds(&acq, Path::new("/proc/6")), Ok(0));
        assert!(count_open_fds(&acq, Path::new("/proc/7")).is_err());
    }
}
