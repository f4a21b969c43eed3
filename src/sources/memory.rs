//! Physical memory and swap.

use crate::chain::pipeline;
use crate::error::ParseError;
use crate::model::{MemorySnapshot, OsFamily};
use crate::parsers::memory::{
    parse_hw_memsize, parse_meminfo, parse_page_size, parse_vm_stat, vm_stat_header_page_size,
};
use crate::platform::PlatformRegistry;

use super::{optional, read_path, run, SourceContext};

pub fn registry(ctx: &SourceContext) -> PlatformRegistry<MemorySnapshot> {
    let meminfo = ctx.proc("meminfo");

    PlatformRegistry::new("memory")
        .register(
            OsFamily::Linux,
            vec![pipeline("linux.proc_meminfo", move |acq| {
                Ok(parse_meminfo(&read_path(acq, &meminfo)?)?)
            })],
        )
        .register(
            OsFamily::MacOs,
            vec![pipeline("macos.vm_stat", |acq| {
                let vm_stat = run(acq, "vm_stat", &[])?;
                let total_bytes = parse_hw_memsize(&run(acq, "sysctl", &["-n", "hw.memsize"])?)?;

                // vm.pagesize first, then the vm_stat header; 4 KiB and 16 KiB
                // pages both exist, so there is no safe constant.
                let page_size = optional("memory", "sysctl vm.pagesize", || {
                    Ok(parse_page_size(&run(acq, "sysctl", &["-n", "vm.pagesize"])?)?)
                })
                .or_else(|| vm_stat_header_page_size(&vm_stat))
                .ok_or_else(|| ParseError::missing("vm_stat", "page size"))?;

                Ok(parse_vm_stat(&vm_stat, page_size, total_bytes)?)
            })],
        )
}
