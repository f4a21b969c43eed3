//! CPU tick counters.
//!
//! Linux reads `/proc/stat`. macOS and FreeBSD try the per-core
//! `kern.cp_times` first and fall back to the aggregate `kern.cp_time`. macOS
//! reports 4 counters per row, FreeBSD 5.

use crate::chain::pipeline;
use crate::model::{CpuSnapshot, OsFamily};
use crate::parsers::cpu::{
    parse_cp_time, parse_cp_times, parse_macos_cp_time, parse_macos_snapshot, parse_proc_stat,
};
use crate::platform::PlatformRegistry;

use super::{read_path, run, SourceContext};

pub fn registry(ctx: &SourceContext) -> PlatformRegistry<CpuSnapshot> {
    let stat = ctx.proc("stat");

    let proc_stat = pipeline("linux.proc_stat", move |acq| {
        Ok(parse_proc_stat(&read_path(acq, &stat)?)?)
    });

    PlatformRegistry::new("cpu")
        .register(OsFamily::Linux, vec![proc_stat])
        .register(
            OsFamily::MacOs,
            vec![
                pipeline("macos.sysctl_cp_times", |acq| {
                    let cp_time = run(acq, "sysctl", &["-n", "kern.cp_time"])?;
                    let cp_times = run(acq, "sysctl", &["-n", "kern.cp_times"])?;
                    Ok(parse_macos_snapshot(&cp_time, &cp_times)?)
                }),
                pipeline("macos.sysctl_cp_time", |acq| {
                    Ok(parse_macos_cp_time(&run(acq, "sysctl", &["-n", "kern.cp_time"])?)?)
                }),
            ],
        )
        .register(
            OsFamily::FreeBsd,
            vec![
                pipeline("freebsd.sysctl_cp_times", |acq| {
                    Ok(parse_cp_times(&run(acq, "sysctl", &["-n", "kern.cp_times"])?)?)
                }),
                pipeline("freebsd.sysctl_cp_time", |acq| {
                    Ok(parse_cp_time(&run(acq, "sysctl", &["-n", "kern.cp_time"])?)?)
                }),
            ],
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::{Acquire, MockAcquirer};
    use crate::error::{AcquisitionError, MetricsError};
    use std::path::Path;

    fn ctx() -> SourceContext {
        SourceContext {
            proc_root: "/proc".into(),
            ..SourceContext::default()
        }
    }

    fn read(platform: OsFamily, acq: &dyn Acquire) -> crate::error::Result<CpuSnapshot> {
        let chain = registry(&ctx()).resolve(platform).expect("registered");
        Ok(chain.read(acq)?)
    }

    #[test]
    fn test_linux_reads_proc_stat() {
        let mut acq = MockAcquirer::new();
        acq.add_file(
            Path::new("/proc/stat"),
            "cpu  74608 2520 38618 354369 4540 0 1420 0 0 0\ncpu0 100 0 50 800 0 0 0 0\n",
        );
        let snap = read(OsFamily::Linux, &acq).expect("read");
        assert_eq!(snap.total.user, 74608);
        assert_eq!(snap.total.total(), 476_075);
        assert_eq!(snap.core_count(), 1);
    }

    #[test]
    fn test_freebsd_falls_back_to_aggregate() {
        let mut acq = MockAcquirer::new();
        acq.fail_command(
            "sysctl -n kern.cp_times",
            AcquisitionError::ExecutionFailed {
                target: "sysctl -n kern.cp_times".to_string(),
                reason: "unknown oid".to_string(),
            },
        );
        acq.add_command("sysctl -n kern.cp_time", "100 0 50 10 840\n");
        let snap = read(OsFamily::FreeBsd, &acq).expect("read");
        assert_eq!(snap.total.user, 100);
        assert_eq!(snap.total.irq, 10);
        assert_eq!(snap.total.idle, 840);
        assert!(snap.per_core.is_empty());
    }

    #[test]
    fn test_macos_reads_four_counter_layout() {
        let mut acq = MockAcquirer::new();
        acq.add_command("sysctl -n kern.cp_time", "74608 2520 38618 354369\n");
        acq.add_command(
            "sysctl -n kern.cp_times",
            "18652 630 9654 88592\n18651 631 9655 88593\n",
        );
        let snap = read(OsFamily::MacOs, &acq).expect("read");
        assert_eq!(snap.total.system, 38618);
        assert_eq!(snap.total.idle, 354369);
        assert_eq!(snap.total.irq, 0);
        assert_eq!(snap.core_count(), 2);
        assert_eq!(snap.per_core[1].times.idle, 88593);
    }

    #[test]
    fn test_macos_falls_back_to_aggregate() {
        let mut acq = MockAcquirer::new();
        acq.add_command("sysctl -n kern.cp_time", "100 50 75 200\n");
        let snap = read(OsFamily::MacOs, &acq).expect("read");
        assert_eq!(snap.total.idle, 200);
        assert_eq!(snap.total.total(), 425);
        assert!(snap.per_core.is_empty());
    }

    #[test]
    fn test_macos_failure_is_aggregated() {
        let err = read(OsFamily::MacOs, &MockAcquirer::new()).unwrap_err();
        match err {
            MetricsError::Aggregate(agg) => {
                assert_eq!(agg.domain, "cpu");
                assert_eq!(agg.attempts.len(), 2);
                assert_eq!(agg.attempts[0].pipeline, "macos.sysctl_cp_times");
                assert_eq!(agg.attempts[1].pipeline, "macos.sysctl_cp_time");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
