//! System uptime and boot time.

use chrono::Utc;

use crate::chain::{pipeline, Pipeline};
use crate::model::{OsFamily, UptimeSnapshot};
use crate::parsers::uptime::{parse_kern_boottime, parse_proc_uptime};
use crate::platform::PlatformRegistry;

use super::{read_path, run, SourceContext};

fn boottime(id: &str) -> Box<dyn Pipeline<UptimeSnapshot>> {
    pipeline(id, |acq| {
        let raw = run(acq, "sysctl", &["kern.boottime"])?;
        Ok(parse_kern_boottime(&raw, Utc::now())?)
    })
}

pub fn registry(ctx: &SourceContext) -> PlatformRegistry<UptimeSnapshot> {
    let uptime = ctx.proc("uptime");

    PlatformRegistry::new("uptime")
        .register(
            OsFamily::Linux,
            vec![pipeline("linux.proc_uptime", move |acq| {
                let raw = read_path(acq, &uptime)?;
                Ok(parse_proc_uptime(&raw, Utc::now())?)
            })],
        )
        .register(OsFamily::MacOs, vec![boottime("macos.sysctl_boottime")])
        .register(OsFamily::FreeBsd, vec![boottime("freebsd.sysctl_boottime")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::MockAcquirer;

    #[test]
    fn test_linux_uptime() {
        let mut acq = MockAcquirer::new();
        acq.add_file("/proc/uptime", "93784.20 1000.00\n");
        let chain = registry(&SourceContext::default())
            .resolve(OsFamily::Linux)
            .expect("registered");
        let up = chain.read(&acq).expect("read");
        assert_eq!(up.total_seconds, 93784);
        assert_eq!(up.days(), 1);
        assert_eq!(up.hours(), 2);
    }

    #[test]
    fn test_macos_boottime() {
        let boot = Utc::now().timestamp() - 3600;
        let mut acq = MockAcquirer::new();
        acq.add_command(
            "sysctl kern.boottime",
            format!("kern.boottime: {{ sec = {}, usec = 0 }} Thu Jan  1 00:00:00 2026\n", boot),
        );
        let chain = registry(&SourceContext::default())
            .resolve(OsFamily::MacOs)
            .expect("registered");
        let up = chain.read(&acq).expect("read");
        assert_eq!(up.boot_time.timestamp(), boot);
        assert!(up.total_seconds >= 3600);
    }
}
