//! Host environment detection.
//!
//! Only the kernel release (Linux) or `sw_vers` (macOS) is mandatory; every
//! other fact falls back to an `Unknown`/empty value when it cannot be read.

use std::path::Path;

use crate::acquire::Acquire;
use crate::chain::pipeline;
use crate::model::{
    Architecture, ArchitectureKind, Cgroup, CgroupVersion, Containerization, EnvironmentSnapshot,
    Kernel, OperatingSystem, OsFamily, Virtualization, VirtualizationType,
};
use crate::parsers::environment::{
    classify_container, classify_virtualization, parse_hv_vmm_present, parse_os_release,
    parse_proc_cgroup, parse_sw_vers, ContainerEvidence,
};
use crate::platform::PlatformRegistry;

use super::{optional, read_path, run, SourceContext};

const DOCKERENV: &str = "/.dockerenv";
const CONTAINERENV: &str = "/run/.containerenv";
const KUBERNETES_SERVICE_HOST: &str = "KUBERNETES_SERVICE_HOST";

fn architecture(acq: &dyn Acquire) -> Architecture {
    let raw = optional("environment", "uname -m", || Ok(run(acq, "uname", &["-m"])?))
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| std::env::consts::ARCH.to_string());
    Architecture {
        kind: ArchitectureKind::from_machine(&raw),
        raw,
    }
}

fn read_trimmed(acq: &dyn Acquire, path: &Path) -> Option<String> {
    acq.read_file(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn registry(ctx: &SourceContext) -> PlatformRegistry<EnvironmentSnapshot> {
    let ctx = ctx.clone();

    let linux = pipeline("linux.procfs", move |acq| {
        let release = read_path(acq, &ctx.proc("sys/kernel/osrelease"))?.trim().to_string();
        let kernel = Kernel {
            release,
            version: read_trimmed(acq, &ctx.proc("sys/kernel/version")).unwrap_or_default(),
        };

        let (name, version) = optional("environment", "os-release", || {
            Ok(parse_os_release(&read_path(acq, &ctx.etc("os-release"))?)?)
        })
        .unwrap_or_else(|| ("Linux".to_string(), String::new()));

        let sys_vendor = read_trimmed(acq, &ctx.sys("class/dmi/id/sys_vendor"));
        let product_name = read_trimmed(acq, &ctx.sys("class/dmi/id/product_name"));
        let cpuinfo = acq.read_file(&ctx.proc("cpuinfo")).ok();
        let virtualization = classify_virtualization(
            sys_vendor.as_deref(),
            product_name.as_deref(),
            cpuinfo.as_deref(),
        );

        let init_cgroup = acq.read_file(&ctx.proc("1/cgroup")).ok();
        let containerization = classify_container(&ContainerEvidence {
            dockerenv: acq.exists(Path::new(DOCKERENV)),
            containerenv: acq.exists(Path::new(CONTAINERENV)),
            kubernetes_env: acq.env_var(KUBERNETES_SERVICE_HOST).is_some(),
            init_cgroup: init_cgroup.as_deref(),
        });

        let v2_mounted = acq.exists(&ctx.sys("fs/cgroup/cgroup.controllers"));
        let cgroup = optional("environment", "/proc/self/cgroup", || {
            Ok(parse_proc_cgroup(&read_path(acq, &ctx.proc("self/cgroup"))?, v2_mounted)?)
        })
        .unwrap_or(Cgroup {
            version: CgroupVersion::Unknown,
            cpu_path: None,
            memory_path: None,
        });

        Ok(EnvironmentSnapshot {
            os: OperatingSystem {
                family: OsFamily::Linux,
                name,
                version,
            },
            kernel,
            architecture: architecture(acq),
            virtualization,
            containerization,
            cgroup,
        })
    });

    let macos = pipeline("macos.sw_vers", |acq| {
        let (name, version) = parse_sw_vers(&run(acq, "sw_vers", &[])?)?;
        let uname = |flag: &str| {
            optional("environment", "uname", || Ok(run(acq, "uname", &[flag])?))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let virtualization = optional("environment", "kern.hv_vmm_present", || {
            Ok(run(acq, "sysctl", &["-n", "kern.hv_vmm_present"])?)
        })
        .map(|raw| parse_hv_vmm_present(&raw))
        .unwrap_or(Virtualization {
            kind: VirtualizationType::Unknown,
            vendor: None,
            raw_identifier: None,
        });

        Ok(EnvironmentSnapshot {
            os: OperatingSystem {
                family: OsFamily::MacOs,
                name,
                version,
            },
            kernel: Kernel {
                release: uname("-r"),
                version: uname("-v"),
            },
            architecture: architecture(acq),
            virtualization,
            containerization: Containerization::none(),
            cgroup: Cgroup::none(),
        })
    });

    PlatformRegistry::new("environment")
        .register(OsFamily::Linux, vec![linux])
        .register(OsFamily::MacOs, vec![macos])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::MockAcquirer;
    use crate::model::ContainerType;

    fn read(platform: OsFamily, acq: &MockAcquirer) -> crate::error::Result<EnvironmentSnapshot> {
        let chain = registry(&SourceContext::default())
            .resolve(platform)
            .expect("registered");
        Ok(chain.read(acq)?)
    }

    #[test]
    fn test_linux_container_host() {
        let mut acq = MockAcquirer::new();
        acq.add_file("/proc/sys/kernel/osrelease", "6.1.0-18-amd64\n")
            .add_file("/etc/os-release", "NAME=\"Debian GNU/Linux\"\nVERSION_ID=\"12\"\n")
            .add_file("/sys/class/dmi/id/sys_vendor", "QEMU\n")
            .add_file("/proc/1/cgroup", "0::/system.slice/docker-abc.scope\n")
            .add_file("/proc/self/cgroup", "0::/system.slice/docker-abc.scope\n")
            .add_file("/sys/fs/cgroup/cgroup.controllers", "cpu memory\n")
            .add_command("uname -m", "x86_64\n");

        let env = read(OsFamily::Linux, &acq).expect("read");
        assert_eq!(env.os.name, "Debian GNU/Linux");
        assert_eq!(env.os.version, "12");
        assert_eq!(env.kernel.release, "6.1.0-18-amd64");
        assert_eq!(env.architecture.kind, ArchitectureKind::X86_64);
        assert_eq!(env.virtualization.kind, VirtualizationType::VirtualMachine);
        assert_eq!(env.containerization.kind, ContainerType::Docker);
        assert_eq!(env.cgroup.version, CgroupVersion::V2);
    }

    #[test]
    fn test_linux_minimal_host() {
        let mut acq = MockAcquirer::new();
        acq.add_file("/proc/sys/kernel/osrelease", "5.15.0\n");

        let env = read(OsFamily::Linux, &acq).expect("read");
        assert_eq!(env.os.name, "Linux");
        assert_eq!(env.virtualization.kind, VirtualizationType::Unknown);
        assert!(!env.containerization.inside_container);
        assert_eq!(env.cgroup.version, CgroupVersion::Unknown);
        assert_eq!(env.architecture.raw, std::env::consts::ARCH);
    }

    #[test]
    fn test_linux_kubernetes_variable() {
        let mut acq = MockAcquirer::new();
        acq.add_file("/proc/sys/kernel/osrelease", "5.15.0\n")
            .set_env("KUBERNETES_SERVICE_HOST", "10.0.0.1");
        let env = read(OsFamily::Linux, &acq).expect("read");
        assert_eq!(env.containerization.kind, ContainerType::Kubernetes);
    }

    #[test]
    fn test_linux_requires_kernel_release() {
        assert!(read(OsFamily::Linux, &MockAcquirer::new()).is_err());
    }

    #[test]
    fn test_macos() {
        let mut acq = MockAcquirer::new();
        acq.add_command("sw_vers", "ProductName:\tmacOS\nProductVersion:\t14.5\n")
            .add_command("uname -r", "23.5.0\n")
            .add_command("uname -m", "arm64\n")
            .add_command("sysctl -n kern.hv_vmm_present", "0\n");

        let env = read(OsFamily::MacOs, &acq).expect("read");
        assert_eq!(env.os.family, OsFamily::MacOs);
        assert_eq!(env.os.version, "14.5");
        assert_eq!(env.kernel.release, "23.5.0");
        assert_eq!(env.kernel.version, "");
        assert_eq!(env.architecture.kind, ArchitectureKind::Arm64);
        assert_eq!(env.virtualization.kind, VirtualizationType::BareMetal);
        assert_eq!(env.cgroup, Cgroup::none());
    }
}
