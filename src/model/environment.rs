//! Host environment: operating system, kernel, virtualization and containers.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Linux,
    #[serde(alias = "darwin")]
    MacOs,
    FreeBsd,
    Windows,
    Unknown,
}

impl OsFamily {
    /// Maps `std::env::consts::OS` style names.
    pub fn from_os_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "linux" | "android" => OsFamily::Linux,
            "macos" | "darwin" => OsFamily::MacOs,
            "freebsd" => OsFamily::FreeBsd,
            "windows" => OsFamily::Windows,
            _ => OsFamily::Unknown,
        }
    }

    /// Family of the running process, fixed at compile time.
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OsFamily::Linux => "linux",
            OsFamily::MacOs => "macos",
            OsFamily::FreeBsd => "freebsd",
            OsFamily::Windows => "windows",
            OsFamily::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatingSystem {
    pub family: OsFamily,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Kernel {
    pub release: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchitectureKind {
    X86_64,
    Arm64,
    Arm,
    X86,
    Other,
}

impl ArchitectureKind {
    /// Maps `uname -m` output or a Rust target arch name.
    pub fn from_machine(machine: &str) -> Self {
        match machine.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" => ArchitectureKind::X86_64,
            "aarch64" | "arm64" => ArchitectureKind::Arm64,
            m if m.starts_with("armv") || m == "arm" => ArchitectureKind::Arm,
            "i386" | "i486" | "i586" | "i686" | "x86" => ArchitectureKind::X86,
            _ => ArchitectureKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Architecture {
    pub kind: ArchitectureKind,
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VirtualizationType {
    BareMetal,
    VirtualMachine,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Virtualization {
    pub kind: VirtualizationType,
    pub vendor: Option<String>,
    pub raw_identifier: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    None,
    Docker,
    Containerd,
    Crio,
    Podman,
    Lxc,
    Kubernetes,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Containerization {
    pub kind: ContainerType,
    pub runtime: Option<String>,
    pub inside_container: bool,
    pub raw_identifier: Option<String>,
}

impl Containerization {
    pub fn none() -> Self {
        Self {
            kind: ContainerType::None,
            runtime: None,
            inside_container: false,
            raw_identifier: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CgroupVersion {
    V1,
    V2,
    None,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cgroup {
    pub version: CgroupVersion,
    pub cpu_path: Option<String>,
    pub memory_path: Option<String>,
}

impl Cgroup {
    pub fn none() -> Self {
        Self {
            version: CgroupVersion::None,
            cpu_path: None,
            memory_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentSnapshot {
    pub os: OperatingSystem,
    pub kernel: Kernel,
    pub architecture: Architecture,
    pub virtualization: Virtualization,
    pub containerization: Containerization,
    pub cgroup: Cgroup,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_family_from_name() {
        assert_eq!(OsFamily::from_os_name("linux"), OsFamily::Linux);
        assert_eq!(OsFamily::from_os_name("Darwin"), OsFamily::MacOs);
        assert_eq!(OsFamily::from_os_name("freebsd"), OsFamily::FreeBsd);
        assert_eq!(OsFamily::from_os_name("plan9"), OsFamily::Unknown);
        assert_eq!(OsFamily::MacOs.to_string(), "macos");
    }

    #[test]
    fn test_architecture_from_machine() {
        assert_eq!(ArchitectureKind::from_machine("x86_64\n"), ArchitectureKind::X86_64);
        assert_eq!(ArchitectureKind::from_machine("arm64"), ArchitectureKind::Arm64);
        assert_eq!(ArchitectureKind::from_machine("aarch64"), ArchitectureKind::Arm64);
        assert_eq!(ArchitectureKind::from_machine("armv7l"), ArchitectureKind::Arm);
        assert_eq!(ArchitectureKind::from_machine("i686"), ArchitectureKind::X86);
        assert_eq!(ArchitectureKind::from_machine("riscv64"), ArchitectureKind::Other);
    }
}
