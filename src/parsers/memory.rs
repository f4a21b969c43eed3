//! Memory usage from `/proc/meminfo` and macOS `vm_stat`.

use ahash::AHashMap as HashMap;

use super::{data_lines, non_empty, scaled};
use crate::error::ParseError;
use crate::model::MemorySnapshot;

const PROC_MEMINFO: &str = "/proc/meminfo";
const VM_STAT: &str = "vm_stat";
const HW_MEMSIZE: &str = "sysctl hw.memsize";
const VM_PAGESIZE: &str = "sysctl vm.pagesize";

/// Splits `Key:   value [unit]` lines into a map of key to the first value token.
fn key_values(content: &str) -> HashMap<&str, &str> {
    let mut map = HashMap::new();
    for line in content.lines() {
        if let Some((key, rest)) = line.split_once(':') {
            if let Some(value) = rest.split_whitespace().next() {
                map.insert(key.trim(), value.trim_end_matches('.'));
            }
        }
    }
    map
}

/// Parses `/proc/meminfo`. Values are KiB and are converted to bytes.
///
/// `MemTotal` is mandatory. `MemAvailable` appeared in Linux 3.14; older
/// kernels get it estimated as free + buffers + cached.
pub fn parse_meminfo(content: &str) -> Result<MemorySnapshot, ParseError> {
    let content = non_empty(content, PROC_MEMINFO)?;
    let values = key_values(content);

    let kib = |key: &str| -> Result<u64, ParseError> {
        let raw = values.get(key).copied().unwrap_or("0");
        let parsed = raw.parse::<u64>().unwrap_or(0);
        scaled(parsed, 1024, PROC_MEMINFO, key)
    };

    let total_raw = values
        .get("MemTotal")
        .copied()
        .ok_or_else(|| ParseError::missing(PROC_MEMINFO, "MemTotal"))?;
    let total_kib: u64 = total_raw
        .parse()
        .map_err(|_| ParseError::malformed(PROC_MEMINFO, "MemTotal", total_raw))?;
    let total_bytes = scaled(total_kib, 1024, PROC_MEMINFO, "MemTotal")?;

    let free_bytes = kib("MemFree")?;
    let buffers_bytes = kib("Buffers")?;
    let cached_bytes = kib("Cached")?;
    let available_bytes = if values.contains_key("MemAvailable") {
        kib("MemAvailable")?
    } else {
        free_bytes
            .saturating_add(buffers_bytes)
            .saturating_add(cached_bytes)
            .min(total_bytes)
    };

    let swap_total_bytes = kib("SwapTotal")?;
    let swap_free_bytes = kib("SwapFree")?;

    Ok(MemorySnapshot {
        total_bytes,
        free_bytes,
        available_bytes,
        used_bytes: total_bytes.saturating_sub(available_bytes),
        buffers_bytes,
        cached_bytes,
        swap_total_bytes,
        swap_free_bytes,
        swap_used_bytes: swap_total_bytes.saturating_sub(swap_free_bytes),
    })
}

/// Parses `sysctl -n hw.memsize` (bytes).
pub fn parse_hw_memsize(content: &str) -> Result<u64, ParseError> {
    let raw = non_empty(content, HW_MEMSIZE)?.trim();
    raw.parse()
        .map_err(|_| ParseError::malformed(HW_MEMSIZE, "hw.memsize", raw))
}

/// Parses `sysctl -n vm.pagesize`; zero is rejected.
pub fn parse_page_size(content: &str) -> Result<u64, ParseError> {
    let raw = non_empty(content, VM_PAGESIZE)?.trim();
    match raw.parse::<u64>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ParseError::malformed(VM_PAGESIZE, "vm.pagesize", raw)),
    }
}

/// Reads the page size from the `vm_stat` header
/// ("Mach Virtual Memory Statistics: (page size of 16384 bytes)").
pub fn vm_stat_header_page_size(content: &str) -> Option<u64> {
    let header = content.lines().next()?;
    let (_, rest) = header.split_once("page size of")?;
    rest.split_whitespace().next()?.parse().ok().filter(|s| *s > 0)
}

/// Parses `vm_stat` page counts with the given page size and total memory.
///
/// used = active + wired + compressed pages, available = free + inactive +
/// speculative pages. Free, active, inactive and wired counts are mandatory.
pub fn parse_vm_stat(
    content: &str,
    page_size: u64,
    total_bytes: u64,
) -> Result<MemorySnapshot, ParseError> {
    let content = non_empty(content, VM_STAT)?;
    // The first line is the header, counters follow as "Pages free: 123."
    let body = data_lines(content, 1).collect::<Vec<_>>().join("\n");
    let values = key_values(&body);

    let pages = |key: &str, mandatory: bool| -> Result<u64, ParseError> {
        match values.get(key) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(count) => scaled(count, page_size, VM_STAT, key),
                Err(_) if mandatory => Err(ParseError::malformed(VM_STAT, key, raw)),
                Err(_) => Ok(0),
            },
            None if mandatory => Err(ParseError::missing(VM_STAT, key)),
            None => Ok(0),
        }
    };

    let free = pages("Pages free", true)?;
    let active = pages("Pages active", true)?;
    let inactive = pages("Pages inactive", true)?;
    let wired = pages("Pages wired down", true)?;
    let speculative = pages("Pages speculative", false)?;
    let compressed = pages("Pages occupied by compressor", false)?;
    let purgeable = pages("Pages purgeable", false)?;

    let used_bytes = active.saturating_add(wired).saturating_add(compressed);
    let available_bytes = free.saturating_add(inactive).saturating_add(speculative);

    Ok(MemorySnapshot {
        total_bytes,
        free_bytes: free,
        available_bytes,
        used_bytes,
        buffers_bytes: 0,
        cached_bytes: purgeable,
        swap_total_bytes: 0,
        swap_free_bytes: 0,
        swap_used_bytes: 0,
    })
}
