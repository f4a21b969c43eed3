//! Network interfaces and socket states.
//!
//! Linux: `/proc/net/dev`, `/proc/net/tcp`, `/proc/net/udp`.
//! macOS: `netstat -ib` and `netstat -an`.

use ahash::AHashSet as HashSet;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{data_lines, non_empty, Fields};
use crate::error::ParseError;
use crate::model::{
    NetworkConnectionStats, NetworkInterface, NetworkInterfaceStats, NetworkInterfaceType,
};

const PROC_NET_DEV: &str = "/proc/net/dev";
const PROC_NET_TCP: &str = "/proc/net/tcp";
const NETSTAT_IB: &str = "netstat -ib";
const NETSTAT_AN: &str = "netstat -an";

/// Receive and transmit columns of `/proc/net/dev`, 8 each.
const NET_DEV_COLUMNS: usize = 16;
/// Name Mtu Network Address Ipkts Ierrs Ibytes Opkts Oerrs Obytes Coll
const NETSTAT_IB_COLUMNS: usize = 11;

// Hex socket states of /proc/net/tcp (include/net/tcp_states.h)
const TCP_ESTABLISHED: &str = "01";
const TCP_TIME_WAIT: &str = "06";
const TCP_LISTEN: &str = "0A";

static MAC_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{1,2}(:[0-9a-f]{1,2}){5}$").expect("valid MAC pattern")
});

/// Parses `/proc/net/dev`, skipping the two header lines.
///
/// Rows with fewer than 16 counters are skipped. Interfaces listed here are
/// considered up; MAC and MTU are not available from this file.
pub fn parse_proc_net_dev(content: &str) -> Result<Vec<NetworkInterface>, ParseError> {
    let content = non_empty(content, PROC_NET_DEV)?;
    if content.trim().lines().count() < 3 {
        return Err(ParseError::missing(PROC_NET_DEV, "interface"));
    }

    let mut interfaces = Vec::new();
    for line in data_lines(content, 2) {
        // Split by ':' to separate interface name from stats
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        let fields = Fields::split(PROC_NET_DEV, counters);
        if fields.len() < NET_DEV_COLUMNS {
            continue;
        }

        let name = name.trim();
        interfaces.push(NetworkInterface {
            name: name.to_string(),
            interface_type: NetworkInterfaceType::from_name(name),
            stats: NetworkInterfaceStats {
                bytes_received: fields.optional(0),
                packets_received: fields.optional(1),
                errors_received: fields.optional(2),
                drops_received: fields.optional(3),
                bytes_sent: fields.optional(8),
                packets_sent: fields.optional(9),
                errors_sent: fields.optional(10),
                drops_sent: fields.optional(11),
            },
            mac_address: String::new(),
            mtu: 0,
            is_up: true,
        });
    }

    Ok(interfaces)
}

/// Counts socket states from `/proc/net/tcp` and `/proc/net/udp`.
///
/// Every UDP socket counts as listening since UDP has no connection state.
pub fn parse_proc_net_sockets(tcp: &str, udp: &str) -> Result<NetworkConnectionStats, ParseError> {
    let tcp = non_empty(tcp, PROC_NET_TCP)?;
    let mut stats = NetworkConnectionStats::default();

    for line in data_lines(tcp, 1) {
        let fields = Fields::split(PROC_NET_TCP, line);
        match fields.text(3).map(str::to_ascii_uppercase).as_deref() {
            Some(TCP_ESTABLISHED) => stats.tcp_established += 1,
            Some(TCP_LISTEN) => stats.tcp_listening += 1,
            Some(TCP_TIME_WAIT) => stats.tcp_time_wait += 1,
            _ => {}
        }
    }

    // /proc/net/udp may legitimately hold the header only.
    stats.udp_listening = data_lines(udp, 1).count() as u64;
    stats.total_connections =
        stats.tcp_established + stats.tcp_listening + stats.tcp_time_wait + stats.udp_listening;
    Ok(stats)
}

/// Parses `netstat -ib`, skipping the header line.
///
/// macOS repeats an interface once per address; the first row (the link
/// row carrying the MAC) wins. A link address that is not a MAC reads as empty.
pub fn parse_netstat_interfaces(content: &str) -> Result<Vec<NetworkInterface>, ParseError> {
    let content = non_empty(content, NETSTAT_IB)?;
    if content.trim().lines().count() < 2 {
        return Err(ParseError::missing(NETSTAT_IB, "interface"));
    }

    let mut seen = HashSet::new();
    let mut interfaces = Vec::new();
    for line in data_lines(content, 1) {
        let fields = Fields::split(NETSTAT_IB, line);
        if fields.len() < NETSTAT_IB_COLUMNS {
            continue;
        }
        let name = fields.text(0).unwrap_or_default();
        if !seen.insert(name.to_string()) {
            continue;
        }

        let address = fields.text(3).unwrap_or_default();
        let mac_address = if MAC_ADDRESS.is_match(address) {
            address.to_string()
        } else {
            String::new()
        };

        interfaces.push(NetworkInterface {
            name: name.to_string(),
            interface_type: NetworkInterfaceType::from_name(name),
            stats: NetworkInterfaceStats {
                packets_received: fields.optional(4),
                errors_received: fields.optional(5),
                bytes_received: fields.optional(6),
                packets_sent: fields.optional(7),
                errors_sent: fields.optional(8),
                bytes_sent: fields.optional(9),
                drops_received: 0,
                drops_sent: 0,
            },
            mac_address,
            mtu: fields.optional(1),
            is_up: true,
        });
    }

    Ok(interfaces)
}

/// Counts socket states from `netstat -an`.
pub fn parse_netstat_connections(content: &str) -> Result<NetworkConnectionStats, ParseError> {
    let content = non_empty(content, NETSTAT_AN)?;
    let mut stats = NetworkConnectionStats::default();

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with("Active") || line.starts_with("Proto") {
            continue;
        }
        let fields = Fields::split(NETSTAT_AN, line);
        if fields.len() < 5 {
            continue;
        }
        let proto = fields.text(0).unwrap_or_default();
        if proto.starts_with("tcp") {
            match fields.text(5).unwrap_or_default() {
                "ESTABLISHED" => stats.tcp_established += 1,
                "LISTEN" => stats.tcp_listening += 1,
                "TIME_WAIT" => stats.tcp_time_wait += 1,
                _ => {}
            }
        } else if proto.starts_with("udp") {
            stats.udp_listening += 1;
        }
    }

    stats.total_connections =
        stats.tcp_established + stats.tcp_listening + stats.tcp_time_wait + stats.udp_listening;
    Ok(stats)
}
