//! Load averages.

use crate::chain::{pipeline, Pipeline};
use crate::model::{LoadAverageSnapshot, OsFamily};
use crate::parsers::load::{parse_proc_loadavg, parse_sysctl_loadavg};
use crate::platform::PlatformRegistry;

use super::{read_path, run, SourceContext};

fn sysctl(id: &str) -> Box<dyn Pipeline<LoadAverageSnapshot>> {
    pipeline(id, |acq| {
        Ok(parse_sysctl_loadavg(&run(acq, "sysctl", &["-n", "vm.loadavg"])?)?)
    })
}

pub fn registry(ctx: &SourceContext) -> PlatformRegistry<LoadAverageSnapshot> {
    let loadavg = ctx.proc("loadavg");

    PlatformRegistry::new("load")
        .register(
            OsFamily::Linux,
            vec![pipeline("linux.proc_loadavg", move |acq| {
                Ok(parse_proc_loadavg(&read_path(acq, &loadavg)?)?)
            })],
        )
        .register(OsFamily::MacOs, vec![sysctl("macos.sysctl_loadavg")])
        .register(OsFamily::FreeBsd, vec![sysctl("freebsd.sysctl_loadavg")])
}
