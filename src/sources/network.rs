//! Network interfaces and connection counts.
//!
//! Linux reads `/proc/net/dev` (mandatory), then best-effort socket tables
//! and per-interface sysfs attributes. macOS runs `netstat -ib`, with
//! `netstat -an` as the optional connection sub-read.

use crate::acquire::Acquire;
use crate::chain::pipeline;
use crate::model::{NetworkInterface, NetworkSnapshot, OsFamily};
use crate::parsers::network::{
    parse_netstat_connections, parse_netstat_interfaces, parse_proc_net_dev, parse_proc_net_sockets,
};
use crate::platform::PlatformRegistry;

use super::{optional, read_path, run, SourceContext};

pub fn registry(ctx: &SourceContext) -> PlatformRegistry<NetworkSnapshot> {
    let dev = ctx.proc("net/dev");
    let tcp = ctx.proc("net/tcp");
    let udp = ctx.proc("net/udp");
    let class_net = ctx.sys("class/net");

    let linux = pipeline("linux.proc_net", move |acq| {
        let mut interfaces = parse_proc_net_dev(&read_path(acq, &dev)?)?;
        for iface in interfaces.iter_mut() {
            enrich_from_sysfs(acq, &class_net.join(&iface.name), iface);
        }
        let connections = optional("network", "socket tables", || {
            let tcp = read_path(acq, &tcp)?;
            let udp = read_path(acq, &udp)?;
            Ok(parse_proc_net_sockets(&tcp, &udp)?)
        });
        Ok(NetworkSnapshot {
            interfaces,
            connections,
        })
    });

    let macos = pipeline("macos.netstat", |acq| {
        let interfaces = parse_netstat_interfaces(&run(acq, "netstat", &["-ib"])?)?;
        let connections = optional("network", "netstat -an", || {
            Ok(parse_netstat_connections(&run(acq, "netstat", &["-an"])?)?)
        });
        Ok(NetworkSnapshot {
            interfaces,
            connections,
        })
    });

    PlatformRegistry::new("network")
        .register(OsFamily::Linux, vec![linux])
        .register(OsFamily::MacOs, vec![macos])
}

/// Fills MAC, MTU and link state from `/sys/class/net/<name>` when readable.
fn enrich_from_sysfs(acq: &dyn Acquire, dir: &std::path::Path, iface: &mut NetworkInterface) {
    if let Ok(address) = acq.read_file(&dir.join("address")) {
        iface.mac_address = address.trim().to_string();
    }
    if let Some(mtu) = acq
        .read_file(&dir.join("mtu"))
        .ok()
        .and_then(|m| m.trim().parse().ok())
    {
        iface.mtu = mtu;
    }
    if let Ok(state) = acq.read_file(&dir.join("operstate")) {
        // "unknown" is reported by loopback and some virtual links that do pass traffic
        iface.is_up = matches!(state.trim(), "up" | "unknown");
    }
}
