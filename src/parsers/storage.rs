//! Mounted filesystems and disk I/O.
//!
//! Linux: `df -k`, `df -i`, `/proc/mounts`, `/proc/diskstats`.
//! macOS: `df -ki` and `iostat -Id <devices>`.

use ahash::AHashMap as HashMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{data_lines, non_empty, scaled, Fields};
use crate::error::ParseError;
use crate::model::{DiskIOStats, FileSystemType, MountPoint};

const DF_K: &str = "df -k";
const DF_I: &str = "df -i";
const DF_KI: &str = "df -ki";
const PROC_MOUNTS: &str = "/proc/mounts";
const PROC_DISKSTATS: &str = "/proc/diskstats";
const IOSTAT: &str = "iostat";

/// Bytes per sector in `/proc/diskstats`, independent of the device.
const SECTOR_SIZE: u64 = 512;

/// Linux `df -k` / `df -i` row: device, 3 counters, percentage, mount path.
///
/// Device and mount path may contain spaces, so the row is anchored on the
/// numeric columns and the mount path runs to the end of the line.
static DF_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<device>\S.*?)\s+(?P<c1>\d+)\s+(?P<c2>\d+)\s+(?P<c3>\d+)\s+(?:\d+%|-)",
        r"\s+(?P<mount>/.*)$",
    ))
    .expect("valid df pattern")
});

/// macOS `df -ki` row: the Linux layout plus iused, ifree and %iused.
static DF_KI_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<device>\S.*?)\s+(?P<c1>\d+)\s+(?P<c2>\d+)\s+(?P<c3>\d+)\s+(?:\d+%|-)",
        r"\s+(?P<iused>\d+)\s+(?P<ifree>\d+)\s+(?:\d+%|-)\s+(?P<mount>/.*)$",
    ))
    .expect("valid df -ki pattern")
});

/// Numeric capture of a matched `df` row.
fn counter(
    caps: &Captures<'_>,
    name: &str,
    format: &str,
    field: &str,
) -> Result<u64, ParseError> {
    let raw = text(caps, name);
    raw.parse()
        .map_err(|_| ParseError::malformed(format, field, raw))
}

fn text<'a>(caps: &Captures<'a>, name: &str) -> &'a str {
    caps.name(name).map_or("", |m| m.as_str())
}

/// Inode counts of one mount, keyed by mount path in [`parse_df_inodes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InodeUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

fn at_least_one_row(content: &str, format: &str) -> Result<(), ParseError> {
    if content.trim().lines().count() < 2 {
        return Err(ParseError::missing(format, "filesystem"));
    }
    Ok(())
}

/// Parses Linux `df -k`: Filesystem 1K-blocks Used Available Use% Mounted on.
///
/// `df` does not report the filesystem type; it reads as `Other` until
/// merged with [`parse_proc_mounts`]. Inode counts start at 0.
pub fn parse_df(content: &str) -> Result<Vec<MountPoint>, ParseError> {
    let content = non_empty(content, DF_K)?;
    at_least_one_row(content, DF_K)?;

    let mut mounts = Vec::new();
    for line in data_lines(content, 1) {
        let Some(caps) = DF_ROW.captures(line) else {
            continue; // Skip malformed lines
        };
        let total = counter(&caps, "c1", DF_K, "1K-blocks")?;
        let used = counter(&caps, "c2", DF_K, "Used")?;
        let available = counter(&caps, "c3", DF_K, "Available")?;
        mounts.push(MountPoint {
            device: text(&caps, "device").to_string(),
            mount_point: text(&caps, "mount").to_string(),
            fs_type: FileSystemType::Other,
            total_bytes: scaled(total, 1024, DF_K, "1K-blocks")?,
            used_bytes: scaled(used, 1024, DF_K, "Used")?,
            available_bytes: scaled(available, 1024, DF_K, "Available")?,
            total_inodes: 0,
            used_inodes: 0,
            free_inodes: 0,
        });
    }

    Ok(mounts)
}

/// Parses Linux `df -i`: Filesystem Inodes IUsed IFree IUse% Mounted on.
pub fn parse_df_inodes(content: &str) -> Result<HashMap<String, InodeUsage>, ParseError> {
    let content = non_empty(content, DF_I)?;
    at_least_one_row(content, DF_I)?;

    let mut inodes = HashMap::new();
    for line in data_lines(content, 1) {
        // Filesystems without inodes print "-" and are skipped
        let Some(caps) = DF_ROW.captures(line) else {
            continue;
        };
        inodes.insert(
            text(&caps, "mount").to_string(),
            InodeUsage {
                total: counter(&caps, "c1", DF_I, "Inodes")?,
                used: counter(&caps, "c2", DF_I, "IUsed")?,
                free: counter(&caps, "c3", DF_I, "IFree")?,
            },
        );
    }

    Ok(inodes)
}

/// Copies inode counts onto the mounts with the same mount path.
pub fn merge_inodes(mounts: &mut [MountPoint], inodes: &HashMap<String, InodeUsage>) {
    for mount in mounts.iter_mut() {
        if let Some(usage) = inodes.get(&mount.mount_point) {
            mount.total_inodes = usage.total;
            mount.used_inodes = usage.used;
            mount.free_inodes = usage.free;
        }
    }
}

/// Parses `/proc/mounts` into mount path to filesystem type.
///
/// When a path is mounted over, the last entry is the visible one.
pub fn parse_proc_mounts(content: &str) -> Result<HashMap<String, FileSystemType>, ParseError> {
    let content = non_empty(content, PROC_MOUNTS)?;

    let mut types = HashMap::new();
    for line in content.lines() {
        let fields = Fields::split(PROC_MOUNTS, line);
        if fields.len() < 3 {
            continue;
        }
        types.insert(
            fields.text(1).unwrap_or_default().to_string(),
            FileSystemType::from_type_name(fields.text(2).unwrap_or_default()),
        );
    }

    Ok(types)
}

pub fn merge_fs_types(mounts: &mut [MountPoint], types: &HashMap<String, FileSystemType>) {
    for mount in mounts.iter_mut() {
        if let Some(fs_type) = types.get(&mount.mount_point) {
            mount.fs_type = *fs_type;
        }
    }
}

/// Parses macOS `df -ki`:
/// Filesystem 1024-blocks Used Available Capacity iused ifree %iused Mounted on.
///
/// The type is guessed from the device name.
pub fn parse_df_macos(content: &str) -> Result<Vec<MountPoint>, ParseError> {
    let content = non_empty(content, DF_KI)?;
    at_least_one_row(content, DF_KI)?;

    let mut mounts = Vec::new();
    for line in data_lines(content, 1) {
        let Some(caps) = DF_KI_ROW.captures(line) else {
            continue; // Skip malformed lines
        };
        let device = text(&caps, "device");
        let total = counter(&caps, "c1", DF_KI, "1024-blocks")?;
        let used = counter(&caps, "c2", DF_KI, "Used")?;
        let available = counter(&caps, "c3", DF_KI, "Available")?;
        let used_inodes = counter(&caps, "iused", DF_KI, "iused")?;
        let free_inodes = counter(&caps, "ifree", DF_KI, "ifree")?;
        mounts.push(MountPoint {
            device: device.to_string(),
            mount_point: text(&caps, "mount").to_string(),
            fs_type: FileSystemType::from_device_name(device),
            total_bytes: scaled(total, 1024, DF_KI, "1024-blocks")?,
            used_bytes: scaled(used, 1024, DF_KI, "Used")?,
            available_bytes: scaled(available, 1024, DF_KI, "Available")?,
            total_inodes: used_inodes.saturating_add(free_inodes),
            used_inodes,
            free_inodes,
        });
    }

    Ok(mounts)
}

/// Parses `/proc/diskstats`. Sector counts are converted to bytes.
///
/// Loop and ram devices are skipped.
pub fn parse_diskstats(content: &str) -> Result<Vec<DiskIOStats>, ParseError> {
    let content = non_empty(content, PROC_DISKSTATS)?;

    let mut disks = Vec::new();
    for line in content.lines() {
        let fields = Fields::split(PROC_DISKSTATS, line);
        if fields.len() < 14 {
            continue; // Skip malformed lines
        }
        let device = fields.text(2).unwrap_or_default();
        if device.starts_with("loop") || device.starts_with("ram") {
            continue;
        }

        disks.push(DiskIOStats {
            device: device.to_string(),
            reads_completed: fields.optional(3),
            read_bytes: scaled(fields.optional(5), SECTOR_SIZE, PROC_DISKSTATS, "sectors read")?,
            writes_completed: fields.optional(7),
            write_bytes: scaled(
                fields.optional(9),
                SECTOR_SIZE,
                PROC_DISKSTATS,
                "sectors written",
            )?,
            io_time_ms: fields.optional(12),
            weighted_io_time_ms: fields.optional(13),
        });
    }

    Ok(disks)
}

/// Parses `iostat -Id <devices>`: disk names on line 0, figures on line 2.
///
/// iostat only reports rates, so counters are zero; the result lists the
/// devices that exist. A device without its 3 figures ends the list.
pub fn parse_iostat(content: &str) -> Result<Vec<DiskIOStats>, ParseError> {
    let content = non_empty(content, IOSTAT)?;
    let lines: Vec<&str> = content.trim().lines().collect();
    if lines.len() < 3 {
        return Err(ParseError::missing(IOSTAT, "data line"));
    }

    let names = Fields::split(IOSTAT, lines[0]);
    let data = Fields::split(IOSTAT, lines[2]);
    const FIELDS_PER_DISK: usize = 3;

    let mut disks = Vec::new();
    for (idx, name) in names.tokens().iter().enumerate() {
        if data.len() < (idx + 1) * FIELDS_PER_DISK {
            break; // Not enough data
        }
        disks.push(DiskIOStats::empty(*name));
    }

    Ok(disks)
}
