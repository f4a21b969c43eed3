//! Load averages from `/proc/loadavg` and `sysctl -n vm.loadavg`.

use super::{non_empty, strip_decoration, Fields};
use crate::error::ParseError;
use crate::model::LoadAverageSnapshot;

const PROC_LOADAVG: &str = "/proc/loadavg";
const SYSCTL_LOADAVG: &str = "sysctl vm.loadavg";

fn parse_windows(body: &str, format: &str) -> Result<LoadAverageSnapshot, ParseError> {
    let fields = Fields::split(format, body);
    Ok(LoadAverageSnapshot {
        one_minute: fields.required(0, "1min")?,
        five_minutes: fields.required(1, "5min")?,
        fifteen_minutes: fields.required(2, "15min")?,
    })
}

/// Parses `/proc/loadavg`.
///
/// Format: "0.00 0.01 0.05 1/234 5678"; only the three windows are used.
pub fn parse_proc_loadavg(content: &str) -> Result<LoadAverageSnapshot, ParseError> {
    let content = non_empty(content, PROC_LOADAVG)?;
    parse_windows(content, PROC_LOADAVG)
}

/// Parses `sysctl -n vm.loadavg`, with or without the `{ }` decoration.
pub fn parse_sysctl_loadavg(content: &str) -> Result<LoadAverageSnapshot, ParseError> {
    let body = strip_decoration(non_empty(content, SYSCTL_LOADAVG)?);
    parse_windows(body, SYSCTL_LOADAVG)
}
