//! Derived metrics: percentages, normalized load and lookups.
//!
//! Pure functions over snapshot values. Percentages return 0 when the
//! denominator is 0, and scans keep the first element on ties so results
//! follow the OS-reported ordering.

use crate::model::{CpuCoreTimes, CpuTimes, MountPoint, NetworkInterface};

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Busy share of a tick difference, in percent.
pub fn usage_percentage(delta: &CpuTimes) -> f64 {
    percentage(delta.busy(), delta.total())
}

/// Load per core; 1.0 means every core is fully used. 0 without cores.
pub fn normalized_load(load: f64, core_count: usize) -> f64 {
    if core_count == 0 {
        return 0.0;
    }
    load / core_count as f64
}

/// Element with the highest key; the first one wins ties.
pub fn busiest_by<T, F>(items: &[T], key: F) -> Option<&T>
where
    F: Fn(&T) -> f64,
{
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let value = key(item);
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((item, value)),
        }
    }
    best.map(|(item, _)| item)
}

/// Element with the lowest key; the first one wins ties.
pub fn idlest_by<T, F>(items: &[T], key: F) -> Option<&T>
where
    F: Fn(&T) -> f64,
{
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let value = key(item);
        match best {
            Some((_, current)) if value >= current => {}
            _ => best = Some((item, value)),
        }
    }
    best.map(|(item, _)| item)
}

pub fn find_core(cores: &[CpuCoreTimes], core_index: usize) -> Option<&CpuCoreTimes> {
    cores.iter().find(|c| c.core_index == core_index)
}

pub fn find_interface<'a>(
    interfaces: &'a [NetworkInterface],
    name: &str,
) -> Option<&'a NetworkInterface> {
    interfaces.iter().find(|i| i.name == name)
}

/// MAC lookup, case-insensitive. An empty query never matches.
pub fn find_by_mac<'a>(
    interfaces: &'a [NetworkInterface],
    mac: &str,
) -> Option<&'a NetworkInterface> {
    if mac.is_empty() {
        return None;
    }
    interfaces
        .iter()
        .find(|i| i.mac_address.eq_ignore_ascii_case(mac))
}

pub fn find_device<'a>(mounts: &'a [MountPoint], device: &str) -> Option<&'a MountPoint> {
    mounts.iter().find(|m| m.device == device)
}

/// The mount whose path is the longest string prefix of `path`.
///
/// Among equally long matches the first listed mount is returned.
pub fn find_mount_point<'a>(mounts: &'a [MountPoint], path: &str) -> Option<&'a MountPoint> {
    let mut best: Option<&MountPoint> = None;
    for mount in mounts.iter().filter(|m| path.starts_with(m.mount_point.as_str())) {
        match best {
            Some(current) if mount.mount_point.len() <= current.mount_point.len() => {}
            _ => best = Some(mount),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileSystemType;

    fn mount(path: &str) -> MountPoint {
        MountPoint {
            device: format!("dev{}", path.len()),
            mount_point: path.to_string(),
            fs_type: FileSystemType::Other,
            total_bytes: 0,
            used_bytes: 0,
            available_bytes: 0,
            total_inodes: 0,
            used_inodes: 0,
            free_inodes: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Percentages and load
    // -------------------------------------------------------------------------

    #[test]
    fn test_percentage_zero_denominator() {
        assert_eq!(percentage(10, 0), 0.0);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn test_usage_percentage() {
        let delta = CpuTimes {
            user: 30,
            system: 20,
            idle: 40,
            iowait: 10,
            ..CpuTimes::default()
        };
        assert_eq!(usage_percentage(&delta), 50.0);
        assert_eq!(usage_percentage(&CpuTimes::default()), 0.0);
    }

    #[test]
    fn test_normalized_load() {
        for cores in [1usize, 2, 4, 8, 64, 128] {
            assert_eq!(normalized_load(cores as f64, cores), 1.0);
        }
        assert_eq!(normalized_load(12.5, 0), 0.0);
        assert_eq!(normalized_load(0.0, 0), 0.0);
    }

    // -------------------------------------------------------------------------
    // Scans
    // -------------------------------------------------------------------------

    #[test]
    fn test_busiest_and_idlest_first_wins() {
        let cores = [(0, 10.0), (1, 90.0), (2, 90.0), (3, 5.0), (4, 5.0)];
        assert_eq!(busiest_by(&cores, |c| c.1).map(|c| c.0), Some(1));
        assert_eq!(idlest_by(&cores, |c| c.1).map(|c| c.0), Some(3));

        let empty: [f64; 0] = [];
        assert!(busiest_by(&empty, |v| *v).is_none());
        assert!(idlest_by(&empty, |v| *v).is_none());
    }

    // -------------------------------------------------------------------------
    // Mount lookup
    // -------------------------------------------------------------------------

    #[test]
    fn test_find_mount_point_longest_prefix_wins() {
        let mounts = vec![mount("/"), mount("/var"), mount("/var/lib/docker")];
        let found = |p: &str| find_mount_point(&mounts, p).map(|m| m.mount_point.clone());

        assert_eq!(found("/var/log"), Some("/var".to_string()));
        assert_eq!(found("/var/lib/docker/overlay2"), Some("/var/lib/docker".to_string()));
        assert_eq!(found("/home/user"), Some("/".to_string()));
        assert_eq!(found("relative"), None);
    }

    #[test]
    fn test_find_mount_point_order_independent() {
        let forward = vec![mount("/"), mount("/var")];
        let reverse = vec![mount("/var"), mount("/")];
        assert_eq!(
            find_mount_point(&forward, "/var/log").map(|m| m.mount_point.as_str()),
            find_mount_point(&reverse, "/var/log").map(|m| m.mount_point.as_str())
        );
    }
}
