//! Per-process counters from `/proc/[pid]/stat`.
//!
//! The command name sits in parentheses and may itself contain spaces or
//! parentheses, so fields are split only after the LAST `)`.

use super::{non_empty, scaled, Fields};
use crate::error::ParseError;
use crate::model::{CpuTimes, ProcessResourceUsage};

const PID_STAT: &str = "/proc/[pid]/stat";

// Indices into the fields following the name (state is index 0).
const PPID: usize = 1;
const UTIME: usize = 11;
const STIME: usize = 12;
const NUM_THREADS: usize = 17;
const VSIZE: usize = 20;
const RSS_PAGES: usize = 21;

/// Parsed `/proc/[pid]/stat` record.
///
/// `usage.open_file_descriptors` is left at 0; descriptors are counted from
/// `/proc/[pid]/fd` by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidStat {
    pub pid: u32,
    pub parent_pid: u32,
    pub name: String,
    pub usage: ProcessResourceUsage,
}

fn split_name(content: &str) -> Result<(&str, &str, &str), ParseError> {
    let open = content
        .find('(')
        .ok_or_else(|| ParseError::missing(PID_STAT, "comm"))?;
    let close = content
        .rfind(')')
        .filter(|c| *c > open)
        .ok_or_else(|| ParseError::missing(PID_STAT, "comm"))?;
    Ok((&content[..open], &content[open + 1..close], &content[close + 1..]))
}

/// Parses one stat line; RSS pages are converted with `page_size`.
pub fn parse_pid_stat(content: &str, page_size: u64) -> Result<PidStat, ParseError> {
    let content = non_empty(content, PID_STAT)?.trim();
    let (head, name, rest) = split_name(content)?;

    let pid_raw = head.trim();
    let pid: u32 = pid_raw
        .parse()
        .map_err(|_| ParseError::malformed(PID_STAT, "pid", pid_raw))?;

    let fields = Fields::split(PID_STAT, rest);
    fields.expect_at_least(RSS_PAGES + 1, "rss")?;

    let rss_pages: u64 = fields.required(RSS_PAGES, "rss")?;

    Ok(PidStat {
        pid,
        parent_pid: fields.required(PPID, "ppid")?,
        name: name.to_string(),
        usage: ProcessResourceUsage {
            cpu_times: CpuTimes {
                user: fields.required(UTIME, "utime")?,
                system: fields.required(STIME, "stime")?,
                ..CpuTimes::default()
            },
            rss_bytes: scaled(rss_pages, page_size, PID_STAT, "rss")?,
            vms_bytes: fields.optional(VSIZE),
            thread_count: fields.optional(NUM_THREADS),
            open_file_descriptors: 0,
            process_count: 1,
        },
    })
}

/// Extracts `(pid, ppid)` only; used by the process-table scan where the
/// rest of the record is not needed.
pub fn parse_parent_pid(content: &str) -> Result<(u32, u32), ParseError> {
    let content = non_empty(content, PID_STAT)?.trim();
    let (head, _, rest) = split_name(content)?;
    let pid_raw = head.trim();
    let pid = pid_raw
        .parse()
        .map_err(|_| ParseError::malformed(PID_STAT, "pid", pid_raw))?;
    let ppid = Fields::split(PID_STAT, rest).required(PPID, "ppid")?;
    Ok((pid, ppid))
}
