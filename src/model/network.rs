//! Network interfaces, their counters and socket state totals.

use serde::Serialize;

use crate::derived;

/// Interface kind, guessed from the interface name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkInterfaceType {
    Loopback,
    Ethernet,
    Wifi,
    Bridge,
    Vlan,
    Tun,
    Tap,
    Vpn,
    Cellular,
    Bluetooth,
    Other,
}

impl NetworkInterfaceType {
    /// Classifies an interface by its name prefix (`lo`, `eth0`, `wlan0`, `en0`, ...).
    pub fn from_name(name: &str) -> Self {
        const PREFIXES: &[(&str, NetworkInterfaceType)] = &[
            ("lo", NetworkInterfaceType::Loopback),
            ("eth", NetworkInterfaceType::Ethernet),
            ("en", NetworkInterfaceType::Ethernet),
            ("wl", NetworkInterfaceType::Wifi),
            ("wi", NetworkInterfaceType::Wifi),
            ("br", NetworkInterfaceType::Bridge),
            ("vlan", NetworkInterfaceType::Vlan),
            ("tun", NetworkInterfaceType::Tun),
            ("utun", NetworkInterfaceType::Tun),
            ("tap", NetworkInterfaceType::Tap),
            ("vpn", NetworkInterfaceType::Vpn),
            ("wg", NetworkInterfaceType::Vpn),
            ("ppp", NetworkInterfaceType::Cellular),
            ("wwan", NetworkInterfaceType::Cellular),
            ("bt", NetworkInterfaceType::Bluetooth),
        ];

        let name = name.trim().to_ascii_lowercase();
        PREFIXES
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|(_, kind)| *kind)
            .unwrap_or(NetworkInterfaceType::Other)
    }
}

/// Cumulative counters of one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkInterfaceStats {
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub packets_received: u64,
    pub packets_sent: u64,
    pub errors_received: u64,
    pub errors_sent: u64,
    pub drops_received: u64,
    pub drops_sent: u64,
}

impl NetworkInterfaceStats {
    pub fn total_bytes(&self) -> u64 {
        self.bytes_received.saturating_add(self.bytes_sent)
    }

    pub fn total_packets(&self) -> u64 {
        self.packets_received.saturating_add(self.packets_sent)
    }

    pub fn total_errors(&self) -> u64 {
        self.errors_received.saturating_add(self.errors_sent)
    }

    pub fn total_drops(&self) -> u64 {
        self.drops_received.saturating_add(self.drops_sent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInterface {
    pub name: String,
    pub interface_type: NetworkInterfaceType,
    pub stats: NetworkInterfaceStats,
    /// Empty when the platform does not report a hardware address.
    pub mac_address: String,
    pub mtu: u32,
    pub is_up: bool,
}

/// Socket counts by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkConnectionStats {
    pub tcp_established: u64,
    pub tcp_listening: u64,
    pub tcp_time_wait: u64,
    pub udp_listening: u64,
    pub total_connections: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSnapshot {
    pub interfaces: Vec<NetworkInterface>,
    pub connections: Option<NetworkConnectionStats>,
}

impl NetworkSnapshot {
    pub fn total_bytes_received(&self) -> u64 {
        self.interfaces
            .iter()
            .map(|i| i.stats.bytes_received)
            .fold(0, u64::saturating_add)
    }

    pub fn total_bytes_sent(&self) -> u64 {
        self.interfaces
            .iter()
            .map(|i| i.stats.bytes_sent)
            .fold(0, u64::saturating_add)
    }

    pub fn total_packets_received(&self) -> u64 {
        self.interfaces
            .iter()
            .map(|i| i.stats.packets_received)
            .fold(0, u64::saturating_add)
    }

    pub fn total_packets_sent(&self) -> u64 {
        self.interfaces
            .iter()
            .map(|i| i.stats.packets_sent)
            .fold(0, u64::saturating_add)
    }

    pub fn find_interface(&self, name: &str) -> Option<&NetworkInterface> {
        derived::find_interface(&self.interfaces, name)
    }

    pub fn find_by_type(&self, interface_type: NetworkInterfaceType) -> Vec<&NetworkInterface> {
        self.interfaces
            .iter()
            .filter(|i| i.interface_type == interface_type)
            .collect()
    }

    pub fn find_active_interfaces(&self) -> Vec<&NetworkInterface> {
        self.interfaces.iter().filter(|i| i.is_up).collect()
    }

    pub fn find_by_mac_address(&self, mac: &str) -> Option<&NetworkInterface> {
        derived::find_by_mac(&self.interfaces, mac)
    }
}
