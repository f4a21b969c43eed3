//! Mounted filesystems and block device I/O counters.

use serde::Serialize;

use crate::derived;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSystemType {
    Ext2,
    Ext3,
    Ext4,
    Xfs,
    Btrfs,
    Zfs,
    Ufs,
    Apfs,
    Hfs,
    #[serde(rename = "hfs+")]
    HfsPlus,
    Ntfs,
    Fat32,
    Exfat,
    Tmpfs,
    Devtmpfs,
    Nfs,
    Cifs,
    Fuse,
    Other,
}

impl FileSystemType {
    /// Maps a type name as found in `/proc/mounts` or `mount` output.
    pub fn from_type_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "ext2" => FileSystemType::Ext2,
            "ext3" => FileSystemType::Ext3,
            "ext4" => FileSystemType::Ext4,
            "xfs" => FileSystemType::Xfs,
            "btrfs" => FileSystemType::Btrfs,
            "zfs" => FileSystemType::Zfs,
            "ufs" | "ffs" => FileSystemType::Ufs,
            "apfs" => FileSystemType::Apfs,
            "hfs" => FileSystemType::Hfs,
            "hfs+" | "hfsplus" => FileSystemType::HfsPlus,
            "ntfs" => FileSystemType::Ntfs,
            "fat32" | "vfat" | "msdos" => FileSystemType::Fat32,
            "exfat" => FileSystemType::Exfat,
            "tmpfs" => FileSystemType::Tmpfs,
            "devtmpfs" => FileSystemType::Devtmpfs,
            "nfs" | "nfs4" => FileSystemType::Nfs,
            "cifs" | "smb" | "smbfs" => FileSystemType::Cifs,
            "fuse" | "fuseblk" => FileSystemType::Fuse,
            _ => FileSystemType::Other,
        }
    }

    /// Guesses the type from a macOS device name; `df` does not report it.
    pub fn from_device_name(device: &str) -> Self {
        if device.starts_with("/dev/disk") {
            return FileSystemType::Apfs;
        }
        let device = device.to_ascii_lowercase();
        if device.contains("apfs") {
            FileSystemType::Apfs
        } else if device.contains("hfs") {
            FileSystemType::HfsPlus
        } else if device.contains("ntfs") {
            FileSystemType::Ntfs
        } else if device.contains("exfat") {
            FileSystemType::Exfat
        } else if device.contains("fat") {
            FileSystemType::Fat32
        } else {
            FileSystemType::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountPoint {
    pub device: String,
    pub mount_point: String,
    pub fs_type: FileSystemType,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub total_inodes: u64,
    pub used_inodes: u64,
    pub free_inodes: u64,
}

impl MountPoint {
    pub fn used_percentage(&self) -> f64 {
        derived::percentage(self.used_bytes, self.total_bytes)
    }

    pub fn available_percentage(&self) -> f64 {
        derived::percentage(self.available_bytes, self.total_bytes)
    }

    pub fn inodes_used_percentage(&self) -> f64 {
        derived::percentage(self.used_inodes, self.total_inodes)
    }
}

/// Cumulative I/O counters of one block device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskIOStats {
    pub device: String,
    pub reads_completed: u64,
    pub read_bytes: u64,
    pub writes_completed: u64,
    pub write_bytes: u64,
    pub io_time_ms: u64,
    pub weighted_io_time_ms: u64,
}

impl DiskIOStats {
    /// Device known by name only, with zeroed counters.
    pub fn empty(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            reads_completed: 0,
            read_bytes: 0,
            writes_completed: 0,
            write_bytes: 0,
            io_time_ms: 0,
            weighted_io_time_ms: 0,
        }
    }

    pub fn total_operations(&self) -> u64 {
        self.reads_completed.saturating_add(self.writes_completed)
    }

    pub fn total_bytes(&self) -> u64 {
        self.read_bytes.saturating_add(self.write_bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageSnapshot {
    pub mount_points: Vec<MountPoint>,
    pub disk_io: Vec<DiskIOStats>,
}

impl StorageSnapshot {
    pub fn total_bytes(&self) -> u64 {
        self.mount_points
            .iter()
            .map(|m| m.total_bytes)
            .fold(0, u64::saturating_add)
    }

    pub fn used_bytes(&self) -> u64 {
        self.mount_points
            .iter()
            .map(|m| m.used_bytes)
            .fold(0, u64::saturating_add)
    }

    pub fn available_bytes(&self) -> u64 {
        self.mount_points
            .iter()
            .map(|m| m.available_bytes)
            .fold(0, u64::saturating_add)
    }

    pub fn used_percentage(&self) -> f64 {
        derived::percentage(self.used_bytes(), self.total_bytes())
    }

    /// The mount holding `path`: longest mount path that prefixes it.
    pub fn find_mount_point(&self, path: &str) -> Option<&MountPoint> {
        derived::find_mount_point(&self.mount_points, path)
    }

    pub fn find_device(&self, device: &str) -> Option<&MountPoint> {
        derived::find_device(&self.mount_points, device)
    }

    pub fn find_by_filesystem_type(&self, fs_type: FileSystemType) -> Vec<&MountPoint> {
        self.mount_points
            .iter()
            .filter(|m| m.fs_type == fs_type)
            .collect()
    }

    pub fn find_disk(&self, device: &str) -> Option<&DiskIOStats> {
        self.disk_io.iter().find(|d| d.device == device)
    }
}
