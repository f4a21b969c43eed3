//! Typed snapshots produced by the parsers.
//!
//! Every snapshot is a plain immutable value. Helper methods compute derived
//! quantities through [`crate::derived`] and never touch the host.

pub mod cpu;
pub mod environment;
pub mod load;
pub mod memory;
pub mod network;
pub mod process;
pub mod storage;
pub mod uptime;

pub use cpu::{CpuCoreDelta, CpuCoreTimes, CpuDelta, CpuSnapshot, CpuTimes};
pub use environment::{
    Architecture, ArchitectureKind, Cgroup, CgroupVersion, ContainerType, Containerization,
    EnvironmentSnapshot, Kernel, OperatingSystem, OsFamily, Virtualization, VirtualizationType,
};
pub use load::{LoadAverageSnapshot, NormalizedLoadAverage};
pub use memory::MemorySnapshot;
pub use network::{
    NetworkConnectionStats, NetworkInterface, NetworkInterfaceStats, NetworkInterfaceType,
    NetworkSnapshot,
};
pub use process::{ProcessDelta, ProcessGroupSnapshot, ProcessResourceUsage, ProcessSnapshot};
pub use storage::{DiskIOStats, FileSystemType, MountPoint, StorageSnapshot};
pub use uptime::UptimeSnapshot;
