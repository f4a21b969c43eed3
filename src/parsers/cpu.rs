//! CPU tick counters from `/proc/stat`, FreeBSD `kern.cp_time(s)` and the
//! macOS `kern.cp_time(s)` layout.

use super::{data_lines, non_empty, strip_decoration, Fields};
use crate::error::ParseError;
use crate::model::{CpuCoreTimes, CpuSnapshot, CpuTimes};

const PROC_STAT: &str = "/proc/stat";
const CP_TIMES: &str = "sysctl kern.cp_times";
const CP_TIME: &str = "sysctl kern.cp_time";

/// Counters per core in FreeBSD `kern.cp_time(s)`: user nice sys intr idle.
const BSD_STATES: usize = 5;

/// Counters in macOS `kern.cp_time(s)`: user nice sys idle.
const MACOS_STATES: usize = 4;

/// Parses one `cpu`/`cpuN` line of `/proc/stat`.
///
/// user, nice, system and idle are mandatory. iowait, irq, softirq and steal
/// were added in later kernels and default to 0.
fn parse_stat_line(fields: &Fields<'_>) -> Result<CpuTimes, ParseError> {
    Ok(CpuTimes {
        user: fields.required(1, "user")?,
        nice: fields.required(2, "nice")?,
        system: fields.required(3, "system")?,
        idle: fields.required(4, "idle")?,
        iowait: fields.optional(5),
        irq: fields.optional(6),
        softirq: fields.optional(7),
        steal: fields.optional(8),
    })
}

/// Parses `/proc/stat`. The aggregate `cpu` line is mandatory; per-core
/// lines are kept in file order with the index the kernel reported.
pub fn parse_proc_stat(content: &str) -> Result<CpuSnapshot, ParseError> {
    let content = non_empty(content, PROC_STAT)?;

    let mut total = None;
    let mut per_core = Vec::new();

    for line in content.lines() {
        let fields = Fields::split(PROC_STAT, line);
        let Some(label) = fields.text(0) else {
            continue;
        };

        if label == "cpu" {
            total = Some(parse_stat_line(&fields)?);
        } else if let Some(index) = label.strip_prefix("cpu") {
            let core_index = index
                .parse::<usize>()
                .map_err(|_| ParseError::malformed(PROC_STAT, "cpu label", label))?;
            per_core.push(CpuCoreTimes {
                core_index,
                times: parse_stat_line(&fields)?,
            });
        }
    }

    let total = total.ok_or_else(|| ParseError::missing(PROC_STAT, "cpu"))?;
    Ok(CpuSnapshot { total, per_core })
}

fn bsd_times(values: &[u64]) -> CpuTimes {
    CpuTimes {
        user: values[0],
        nice: values[1],
        system: values[2],
        irq: values[3],
        idle: values[4],
        ..CpuTimes::default()
    }
}

/// `sysctl kern.cp_time` without -n prefixes the name.
fn strip_name(body: &str) -> &str {
    match body.split_once(':') {
        Some((_, rest)) => rest,
        None => body,
    }
}

fn parse_counters(content: &str, format: &str) -> Result<Vec<u64>, ParseError> {
    let body = strip_name(strip_decoration(non_empty(content, format)?));
    let fields = Fields::split(format, body);
    (0..fields.len())
        .map(|idx| fields.required::<u64>(idx, "tick counter"))
        .collect()
}

/// Parses `sysctl -n kern.cp_times`: 5 counters per core, cores back to back.
pub fn parse_cp_times(content: &str) -> Result<CpuSnapshot, ParseError> {
    let values = parse_counters(content, CP_TIMES)?;
    if values.len() < BSD_STATES {
        return Err(ParseError::missing(CP_TIMES, "idle"));
    }
    if values.len() % BSD_STATES != 0 {
        return Err(ParseError::malformed(
            CP_TIMES,
            "counter count",
            &values.len().to_string(),
        ));
    }

    let per_core: Vec<CpuCoreTimes> = values
        .chunks(BSD_STATES)
        .enumerate()
        .map(|(core_index, chunk)| CpuCoreTimes {
            core_index,
            times: bsd_times(chunk),
        })
        .collect();
    let total = per_core
        .iter()
        .fold(CpuTimes::default(), |acc, c| acc.saturating_add(&c.times));

    Ok(CpuSnapshot { total, per_core })
}

/// Parses `sysctl -n kern.cp_time`: aggregate counters only.
pub fn parse_cp_time(content: &str) -> Result<CpuSnapshot, ParseError> {
    let values = parse_counters(content, CP_TIME)?;
    if values.len() < BSD_STATES {
        return Err(ParseError::missing(CP_TIME, "idle"));
    }
    Ok(CpuSnapshot {
        total: bsd_times(&values[..BSD_STATES]),
        per_core: Vec::new(),
    })
}

fn macos_times(fields: &Fields<'_>) -> Result<CpuTimes, ParseError> {
    Ok(CpuTimes {
        user: fields.required(0, "user")?,
        nice: fields.required(1, "nice")?,
        system: fields.required(2, "system")?,
        idle: fields.required(3, "idle")?,
        ..CpuTimes::default()
    })
}

/// Parses macOS `sysctl -n kern.cp_time`: user nice system idle.
pub fn parse_macos_cp_time(content: &str) -> Result<CpuSnapshot, ParseError> {
    let body = strip_name(strip_decoration(non_empty(content, CP_TIME)?));
    let fields = Fields::split(CP_TIME, body);
    Ok(CpuSnapshot {
        total: macos_times(&fields)?,
        per_core: Vec::new(),
    })
}

/// Parses macOS `kern.cp_time` together with `kern.cp_times`, which holds one
/// line of 4 counters per core.
pub fn parse_macos_snapshot(cp_time: &str, cp_times: &str) -> Result<CpuSnapshot, ParseError> {
    let total = parse_macos_cp_time(cp_time)?.total;
    let body = non_empty(cp_times, CP_TIMES)?;

    let per_core = data_lines(body, 0)
        .map(strip_decoration)
        .enumerate()
        .map(|(core_index, line)| {
            let fields = Fields::split(CP_TIMES, line);
            fields.expect_at_least(MACOS_STATES, "idle")?;
            Ok(CpuCoreTimes {
                core_index,
                times: macos_times(&fields)?,
            })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    Ok(CpuSnapshot { total, per_core })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "\
cpu  74608 2520 38618 354369 4540 0 1420 0 0 0
cpu0 37304 1260 19309 177184 2270 0 710 0 0 0
cpu1 37304 1260 19309 177185 2270 0 710 0 0 0
intr 1462898 0 0 0
ctxt 2808546
btime 1700000000
processes 31264
";

    // -------------------------------------------------------------------------
    // /proc/stat
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_proc_stat_aggregate() {
        let snapshot = parse_proc_stat(STAT).expect("parse");
        assert_eq!(snapshot.total.user, 74608);
        assert_eq!(snapshot.total.nice, 2520);
        assert_eq!(snapshot.total.system, 38618);
        assert_eq!(snapshot.total.idle, 354369);
        assert_eq!(snapshot.total.iowait, 4540);
        assert_eq!(snapshot.total.softirq, 1420);
        // 74608 + 2520 + 38618 + 354369 + 4540 + 0 + 1420 + 0
        assert_eq!(snapshot.total.total(), 476_075);
    }

    #[test]
    fn test_parse_proc_stat_cores_in_order() {
        let snapshot = parse_proc_stat(STAT).expect("parse");
        assert_eq!(snapshot.core_count(), 2);
        assert_eq!(snapshot.per_core[0].core_index, 0);
        assert_eq!(snapshot.per_core[1].core_index, 1);
        assert_eq!(snapshot.per_core[1].times.idle, 177185);
    }

    #[test]
    fn test_parse_proc_stat_old_kernel_defaults_optional_fields() {
        let snapshot = parse_proc_stat("cpu 10 20 30 40\n").expect("parse");
        assert_eq!(snapshot.total.iowait, 0);
        assert_eq!(snapshot.total.steal, 0);
        assert_eq!(snapshot.total.total(), 100);
        assert!(snapshot.per_core.is_empty());
    }

    #[test]
    fn test_parse_proc_stat_missing_aggregate() {
        let err = parse_proc_stat("cpu0 1 2 3 4\nintr 5\n").unwrap_err();
        assert_eq!(err, ParseError::missing(PROC_STAT, "cpu"));
    }

    #[test]
    fn test_parse_proc_stat_malformed_mandatory() {
        let err = parse_proc_stat("cpu 1 2 x 4\n").unwrap_err();
        assert_eq!(err, ParseError::malformed(PROC_STAT, "system", "x"));

        let err = parse_proc_stat("cpu 1 2\n").unwrap_err();
        assert_eq!(err, ParseError::missing(PROC_STAT, "system"));
    }

    #[test]
    fn test_parse_proc_stat_malformed_optional_is_zero() {
        let snapshot = parse_proc_stat("cpu 1 2 3 4 oops 6\n").expect("parse");
        assert_eq!(snapshot.total.iowait, 0);
        assert_eq!(snapshot.total.irq, 6);
    }

    #[test]
    fn test_parse_proc_stat_empty() {
        assert_eq!(parse_proc_stat("").unwrap_err(), ParseError::empty(PROC_STAT));
        assert_eq!(parse_proc_stat("  \n ").unwrap_err(), ParseError::empty(PROC_STAT));
    }

    // -------------------------------------------------------------------------
    // kern.cp_times / kern.cp_time
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_cp_times_per_core() {
        let snapshot = parse_cp_times("100 1 50 2 900 200 2 60 3 800\n").expect("parse");
        assert_eq!(snapshot.core_count(), 2);
        assert_eq!(snapshot.per_core[1].times.user, 200);
        assert_eq!(snapshot.per_core[1].times.irq, 3);
        assert_eq!(snapshot.per_core[1].times.idle, 800);
        assert_eq!(snapshot.total.user, 300);
        assert_eq!(snapshot.total.idle, 1700);
    }

    #[test]
    fn test_parse_cp_times_rejects_partial_core() {
        let err = parse_cp_times("1 2 3 4 5 6 7\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedField { .. }));
    }

    #[test]
    fn test_parse_cp_time_with_name_prefix() {
        let snapshot = parse_cp_time("kern.cp_time: 10 0 5 1 84\n").expect("parse");
        assert_eq!(snapshot.total.user, 10);
        assert_eq!(snapshot.total.idle, 84);
        assert_eq!(snapshot.total.total(), 100);
        assert!(snapshot.per_core.is_empty());
    }

    #[test]
    fn test_parse_cp_time_rejects_macos_layout() {
        let err = parse_cp_time("74608 2520 38618 354369").unwrap_err();
        assert_eq!(err, ParseError::missing(CP_TIME, "idle"));
    }

    // -------------------------------------------------------------------------
    // macOS kern.cp_time / kern.cp_times
    // -------------------------------------------------------------------------

    const MACOS_CP_TIMES: &str = "\
18652 630 9654 88592
18651 631 9655 88593
18652 629 9654 88592
18653 630 9655 88592
";

    #[test]
    fn test_parse_macos_snapshot_aggregate() {
        let snapshot =
            parse_macos_snapshot("74608 2520 38618 354369\n", MACOS_CP_TIMES).expect("parse");
        assert_eq!(snapshot.total.user, 74608);
        assert_eq!(snapshot.total.nice, 2520);
        assert_eq!(snapshot.total.system, 38618);
        assert_eq!(snapshot.total.idle, 354369);
        assert_eq!(snapshot.total.iowait, 0);
        assert_eq!(snapshot.total.irq, 0);
        assert_eq!(snapshot.total.total(), 74608 + 2520 + 38618 + 354369);
    }

    #[test]
    fn test_parse_macos_snapshot_per_core() {
        let snapshot =
            parse_macos_snapshot("74608 2520 38618 354369", MACOS_CP_TIMES).expect("parse");
        assert_eq!(snapshot.core_count(), 4);
        assert_eq!(snapshot.per_core[0].core_index, 0);
        assert_eq!(snapshot.per_core[0].times.user, 18652);
        assert_eq!(snapshot.per_core[0].times.nice, 630);
        assert_eq!(snapshot.per_core[1].times.idle, 88593);
        assert_eq!(snapshot.per_core[3].core_index, 3);
    }

    #[test]
    fn test_parse_macos_cp_time_with_name_prefix() {
        let snapshot = parse_macos_cp_time("kern.cp_time: 100 50 75 200\n").expect("parse");
        assert_eq!(snapshot.total.idle, 200);
        assert_eq!(snapshot.total.softirq, 0);
        assert_eq!(snapshot.total.steal, 0);
        assert!(snapshot.per_core.is_empty());
    }

    #[test]
    fn test_parse_macos_snapshot_failures() {
        assert_eq!(
            parse_macos_snapshot("", "100 50 75 200").unwrap_err(),
            ParseError::empty(CP_TIME)
        );
        assert_eq!(
            parse_macos_snapshot("invalid", "100 50 75 200").unwrap_err(),
            ParseError::malformed(CP_TIME, "user", "invalid")
        );
        assert_eq!(
            parse_macos_snapshot("100 50", "100 50 75 200").unwrap_err(),
            ParseError::missing(CP_TIME, "system")
        );
        assert_eq!(
            parse_macos_snapshot("100 50 75 200", "").unwrap_err(),
            ParseError::empty(CP_TIMES)
        );
        assert!(parse_macos_snapshot("100 50 75 200", "invalid core data").is_err());
    }

    #[test]
    fn test_bsd_parsers_empty() {
        assert_eq!(parse_cp_times("").unwrap_err(), ParseError::empty(CP_TIMES));
        assert_eq!(parse_cp_time("\n").unwrap_err(), ParseError::empty(CP_TIME));
    }
}
