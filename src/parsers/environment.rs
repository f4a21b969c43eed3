//! Environment detection inputs: os-release, sw_vers, DMI, cgroup files.

use ahash::AHashMap as HashMap;

use super::{data_lines, non_empty};
use crate::error::ParseError;
use crate::model::{
    Cgroup, CgroupVersion, ContainerType, Containerization, Virtualization, VirtualizationType,
};

const OS_RELEASE: &str = "/etc/os-release";
const SW_VERS: &str = "sw_vers";
const PROC_CGROUP: &str = "/proc/self/cgroup";

/// Markers in `/proc/1/cgroup`, checked in order; the first hit wins.
const CGROUP_MARKERS: &[(&str, ContainerType)] = &[
    ("kubepods", ContainerType::Kubernetes),
    ("libpod", ContainerType::Podman),
    ("crio", ContainerType::Crio),
    ("docker", ContainerType::Docker),
    ("containerd", ContainerType::Containerd),
    ("lxc", ContainerType::Lxc),
];

/// DMI vendor or product substrings mapped to a hypervisor name.
const HYPERVISORS: &[(&str, &str)] = &[
    ("kvm", "KVM"),
    ("qemu", "QEMU"),
    ("vmware", "VMware"),
    ("virtualbox", "VirtualBox"),
    ("innotek", "VirtualBox"),
    ("xen", "Xen"),
    ("amazon ec2", "Amazon EC2"),
    ("google compute engine", "Google Compute Engine"),
    ("parallels", "Parallels"),
    ("bochs", "Bochs"),
    ("virtual machine", "Hyper-V"),
];

/// `(name, version)` from os-release. `NAME` is mandatory, `VERSION_ID` may be absent.
pub fn parse_os_release(content: &str) -> Result<(String, String), ParseError> {
    let content = non_empty(content, OS_RELEASE)?;
    let values: HashMap<&str, &str> = data_lines(content, 0)
        .filter(|l| !l.starts_with('#'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim().trim_matches(['"', '\''])))
        .collect();

    let name = values
        .get("NAME")
        .ok_or_else(|| ParseError::missing(OS_RELEASE, "NAME"))?;
    let version = values.get("VERSION_ID").copied().unwrap_or_default();
    Ok((name.to_string(), version.to_string()))
}

/// `(ProductName, ProductVersion)` from macOS `sw_vers`.
pub fn parse_sw_vers(content: &str) -> Result<(String, String), ParseError> {
    let content = non_empty(content, SW_VERS)?;
    let mut name = None;
    let mut version = None;
    for line in data_lines(content, 0) {
        match line.split_once(':') {
            Some(("ProductName", v)) => name = Some(v.trim()),
            Some(("ProductVersion", v)) => version = Some(v.trim()),
            _ => {}
        }
    }
    let name = name.ok_or_else(|| ParseError::missing(SW_VERS, "ProductName"))?;
    let version = version.ok_or_else(|| ParseError::missing(SW_VERS, "ProductVersion"))?;
    Ok((name.to_string(), version.to_string()))
}

/// Classifies from DMI strings and the cpuinfo `hypervisor` flag.
///
/// A known DMI vendor names the hypervisor; the flag alone only says "virtual".
/// Without any input the result is `Unknown`, not bare metal.
pub fn classify_virtualization(
    sys_vendor: Option<&str>,
    product_name: Option<&str>,
    cpuinfo: Option<&str>,
) -> Virtualization {
    let identifiers: Vec<&str> = [sys_vendor, product_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    for id in &identifiers {
        let lower = id.to_ascii_lowercase();
        if let Some((_, vendor)) = HYPERVISORS.iter().find(|(needle, _)| lower.contains(needle)) {
            return Virtualization {
                kind: VirtualizationType::VirtualMachine,
                vendor: Some(vendor.to_string()),
                raw_identifier: Some(id.to_string()),
            };
        }
    }

    let flagged = cpuinfo.map(cpuinfo_has_hypervisor_flag);
    match flagged {
        Some(true) => Virtualization {
            kind: VirtualizationType::VirtualMachine,
            vendor: None,
            raw_identifier: identifiers.first().map(|s| s.to_string()),
        },
        Some(false) => Virtualization {
            kind: VirtualizationType::BareMetal,
            vendor: None,
            raw_identifier: identifiers.first().map(|s| s.to_string()),
        },
        None if !identifiers.is_empty() => Virtualization {
            kind: VirtualizationType::BareMetal,
            vendor: None,
            raw_identifier: identifiers.first().map(|s| s.to_string()),
        },
        None => Virtualization {
            kind: VirtualizationType::Unknown,
            vendor: None,
            raw_identifier: None,
        },
    }
}

fn cpuinfo_has_hypervisor_flag(cpuinfo: &str) -> bool {
    cpuinfo
        .lines()
        .filter_map(|l| l.split_once(':'))
        .filter(|(k, _)| k.trim() == "flags")
        .any(|(_, v)| v.split_whitespace().any(|f| f == "hypervisor"))
}

/// Parses `sysctl -n kern.hv_vmm_present` ("1" inside a VM).
pub fn parse_hv_vmm_present(content: &str) -> Virtualization {
    let raw = content.trim();
    let kind = match raw {
        "1" => VirtualizationType::VirtualMachine,
        "0" => VirtualizationType::BareMetal,
        _ => VirtualizationType::Unknown,
    };
    Virtualization {
        kind,
        vendor: None,
        raw_identifier: (!raw.is_empty()).then(|| format!("kern.hv_vmm_present={}", raw)),
    }
}

/// Evidence gathered by the caller for container classification.
#[derive(Debug, Default, Clone)]
pub struct ContainerEvidence<'a> {
    pub dockerenv: bool,
    pub containerenv: bool,
    pub kubernetes_env: bool,
    pub init_cgroup: Option<&'a str>,
}

/// Classifies the container runtime.
///
/// The Kubernetes variable wins over everything, then marker files, then
/// `/proc/1/cgroup` path markers.
pub fn classify_container(evidence: &ContainerEvidence<'_>) -> Containerization {
    let cgroup_hit = evidence.init_cgroup.and_then(|content| {
        CGROUP_MARKERS
            .iter()
            .find(|(marker, _)| content.contains(marker))
            .map(|(marker, kind)| (*kind, *marker))
    });

    let found = if evidence.kubernetes_env {
        Some((ContainerType::Kubernetes, "KUBERNETES_SERVICE_HOST"))
    } else if evidence.dockerenv {
        Some((ContainerType::Docker, "/.dockerenv"))
    } else if evidence.containerenv {
        Some((ContainerType::Podman, "/run/.containerenv"))
    } else {
        cgroup_hit
    };

    match found {
        Some((kind, raw)) => Containerization {
            kind,
            runtime: runtime_name(kind).map(str::to_string),
            inside_container: true,
            raw_identifier: Some(raw.to_string()),
        },
        None => Containerization::none(),
    }
}

fn runtime_name(kind: ContainerType) -> Option<&'static str> {
    match kind {
        ContainerType::Docker => Some("docker"),
        ContainerType::Containerd | ContainerType::Kubernetes => Some("containerd"),
        ContainerType::Crio => Some("cri-o"),
        ContainerType::Podman => Some("podman"),
        ContainerType::Lxc => Some("lxc"),
        ContainerType::None | ContainerType::Other => None,
    }
}

/// Parses `/proc/self/cgroup`.
///
/// `v2_mounted` is true when `/sys/fs/cgroup/cgroup.controllers` exists. On v2
/// the unified `0::/path` entry serves both controllers; on v1 the `cpu` and
/// `memory` hierarchies are looked up by controller name.
pub fn parse_proc_cgroup(content: &str, v2_mounted: bool) -> Result<Cgroup, ParseError> {
    let content = non_empty(content, PROC_CGROUP)?;
    let mut unified = None;
    let mut cpu = None;
    let mut memory = None;

    for line in data_lines(content, 0) {
        let mut parts = line.splitn(3, ':');
        let (Some(id), Some(controllers), Some(path)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseError::malformed(PROC_CGROUP, "hierarchy", line));
        };
        if id == "0" && controllers.is_empty() {
            unified = Some(path);
            continue;
        }
        for controller in controllers.split(',') {
            match controller {
                "cpu" => cpu = Some(path),
                "memory" => memory = Some(path),
                _ => {}
            }
        }
    }

    if v2_mounted {
        let path = unified.ok_or_else(|| ParseError::missing(PROC_CGROUP, "0::"))?;
        return Ok(Cgroup {
            version: CgroupVersion::V2,
            cpu_path: Some(path.to_string()),
            memory_path: Some(path.to_string()),
        });
    }
    if cpu.is_none() && memory.is_none() {
        return Ok(Cgroup {
            version: CgroupVersion::Unknown,
            cpu_path: None,
            memory_path: unified.map(str::to_string),
        });
    }
    Ok(Cgroup {
        version: CgroupVersion::V1,
        cpu_path: cpu.map(str::to_string),
        memory_path: memory.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // OS identity
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_os_release() {
        let text = "# comment\nNAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nID=ubuntu\n";
        assert_eq!(
            parse_os_release(text),
            Ok(("Ubuntu".to_string(), "22.04".to_string()))
        );
        assert_eq!(
            parse_os_release("NAME=Arch Linux\nBUILD_ID=rolling\n"),
            Ok(("Arch Linux".to_string(), String::new()))
        );
        assert_eq!(
            parse_os_release("ID=x\n"),
            Err(ParseError::missing(OS_RELEASE, "NAME"))
        );
    }

    #[test]
    fn test_parse_sw_vers() {
        let text = "ProductName:\t\tmacOS\nProductVersion:\t\t14.5\nBuildVersion:\t\t23F79\n";
        assert_eq!(
            parse_sw_vers(text),
            Ok(("macOS".to_string(), "14.5".to_string()))
        );
        assert!(parse_sw_vers("BuildVersion: 1\n").is_err());
    }

    // -------------------------------------------------------------------------
    // Virtualization
    // -------------------------------------------------------------------------

    #[test]
    fn test_virtualization_from_dmi_vendor() {
        let v = classify_virtualization(
            Some("QEMU\n"),
            Some("Standard PC (Q35 + ICH9, 2009)"),
            None,
        );
        assert_eq!(v.kind, VirtualizationType::VirtualMachine);
        assert_eq!(v.vendor.as_deref(), Some("QEMU"));
        assert_eq!(v.raw_identifier.as_deref(), Some("QEMU"));

        let hv =
            classify_virtualization(Some("Microsoft Corporation"), Some("Virtual Machine"), None);
        assert_eq!(hv.vendor.as_deref(), Some("Hyper-V"));
    }

    #[test]
    fn test_virtualization_from_cpu_flag() {
        let cpuinfo = "processor\t: 0\nflags\t\t: fpu vme hypervisor sse\n";
        let v = classify_virtualization(Some("Dell Inc."), None, Some(cpuinfo));
        assert_eq!(v.kind, VirtualizationType::VirtualMachine);
        assert_eq!(v.vendor, None);

        let bare = classify_virtualization(Some("Dell Inc."), None, Some("flags\t: fpu sse\n"));
        assert_eq!(bare.kind, VirtualizationType::BareMetal);
    }

    #[test]
    fn test_virtualization_without_evidence() {
        assert_eq!(
            classify_virtualization(None, None, None).kind,
            VirtualizationType::Unknown
        );
    }

    #[test]
    fn test_parse_hv_vmm_present() {
        assert_eq!(parse_hv_vmm_present("1\n").kind, VirtualizationType::VirtualMachine);
        assert_eq!(parse_hv_vmm_present("0").kind, VirtualizationType::BareMetal);
        assert_eq!(parse_hv_vmm_present("").kind, VirtualizationType::Unknown);
    }

    // -------------------------------------------------------------------------
    // Containers and cgroups
    // -------------------------------------------------------------------------

    #[test]
    fn test_classify_container_precedence() {
        let k8s = ContainerEvidence {
            kubernetes_env: true,
            dockerenv: true,
            ..Default::default()
        };
        assert_eq!(classify_container(&k8s).kind, ContainerType::Kubernetes);

        let docker = ContainerEvidence {
            dockerenv: true,
            ..Default::default()
        };
        let c = classify_container(&docker);
        assert_eq!(c.kind, ContainerType::Docker);
        assert!(c.inside_container);
        assert_eq!(c.runtime.as_deref(), Some("docker"));
    }

    #[test]
    fn test_classify_container_from_cgroup() {
        let evidence = ContainerEvidence {
            init_cgroup: Some("12:pids:/kubepods/burstable/pod1234/abcd\n"),
            ..Default::default()
        };
        assert_eq!(classify_container(&evidence).kind, ContainerType::Kubernetes);

        let host = ContainerEvidence {
            init_cgroup: Some("0::/init.scope\n"),
            ..Default::default()
        };
        assert_eq!(classify_container(&host), Containerization::none());
    }

    #[test]
    fn test_parse_proc_cgroup_v2() {
        let cg = parse_proc_cgroup("0::/user.slice/session-1.scope\n", true).expect("parse");
        assert_eq!(cg.version, CgroupVersion::V2);
        assert_eq!(cg.cpu_path.as_deref(), Some("/user.slice/session-1.scope"));
        assert_eq!(cg.memory_path, cg.cpu_path);
    }

    #[test]
    fn test_parse_proc_cgroup_v1() {
        let text =
            "12:memory:/docker/abc\n4:cpu,cpuacct:/docker/abc\n1:name=systemd:/docker/abc\n0::/\n";
        let cg = parse_proc_cgroup(text, false).expect("parse");
        assert_eq!(cg.version, CgroupVersion::V1);
        assert_eq!(cg.cpu_path.as_deref(), Some("/docker/abc"));
        assert_eq!(cg.memory_path.as_deref(), Some("/docker/abc"));
    }

    #[test]
    fn test_parse_proc_cgroup_malformed() {
        assert!(parse_proc_cgroup("garbage\n", false).is_err());
        assert_eq!(
            parse_proc_cgroup("", true).unwrap_err(),
            ParseError::empty(PROC_CGROUP)
        );
    }
}
