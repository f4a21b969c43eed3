//! Mounted filesystems and disk I/O.
//!
//! Both platform pipelines are hybrids: the free-space read is mandatory,
//! every other sub-read only enriches the result and degrades to empty.

use crate::chain::pipeline;
use crate::model::{OsFamily, StorageSnapshot};
use crate::parsers::storage::{
    merge_fs_types, merge_inodes, parse_df, parse_df_inodes, parse_df_macos, parse_diskstats,
    parse_iostat, parse_proc_mounts,
};
use crate::platform::PlatformRegistry;

use super::{optional, read_path, run, SourceContext};

pub fn registry(ctx: &SourceContext) -> PlatformRegistry<StorageSnapshot> {
    let mounts = ctx.proc("mounts");
    let diskstats = ctx.proc("diskstats");
    let iostat_devices = ctx.iostat_devices.clone();

    let linux = pipeline("linux.df", move |acq| {
        let mut mount_points = parse_df(&run(acq, "df", &["-k"])?)?;

        let inodes = optional("storage", "df -i", || {
            Ok(parse_df_inodes(&run(acq, "df", &["-i"])?)?)
        });
        if let Some(inodes) = inodes {
            merge_inodes(&mut mount_points, &inodes);
        }
        let types = optional("storage", "/proc/mounts", || {
            Ok(parse_proc_mounts(&read_path(acq, &mounts)?)?)
        });
        if let Some(types) = types {
            merge_fs_types(&mut mount_points, &types);
        }
        let disk_io = optional("storage", "/proc/diskstats", || {
            Ok(parse_diskstats(&read_path(acq, &diskstats)?)?)
        })
        .unwrap_or_default();

        Ok(StorageSnapshot {
            mount_points,
            disk_io,
        })
    });

    let macos = pipeline("macos.df", move |acq| {
        let mount_points = parse_df_macos(&run(acq, "df", &["-ki"])?)?;

        let mut args: Vec<&str> = vec!["-Id"];
        args.extend(iostat_devices.iter().map(String::as_str));
        let disk_io = optional("storage", "iostat", || {
            Ok(parse_iostat(&run(acq, "iostat", &args)?)?)
        })
        .unwrap_or_default();

        Ok(StorageSnapshot {
            mount_points,
            disk_io,
        })
    });

    PlatformRegistry::new("storage")
        .register(OsFamily::Linux, vec![linux])
        .register(OsFamily::MacOs, vec![macos])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::MockAcquirer;
    use crate::model::FileSystemType;

    const DF_K: &str = "\
Filesystem     1K-blocks     Used Available Use% Mounted on
/dev/sda1      102400000 51200000  51200000  50% /
/dev/sdb1       20480000  1024000  19456000   5% /var
";

    const DF_I: &str = "\
Filesystem      Inodes  IUsed   IFree IUse% Mounted on
/dev/sda1      6553600 300000 6253600    5% /
";

    const MOUNTS: &str = "\
/dev/sda1 / ext4 rw,relatime 0 0
/dev/sdb1 /var xfs rw,relatime 0 0
proc /proc proc rw 0 0
";

    const DISKSTATS: &str = "\
   8       0 sda 1000 0 2000 10 500 0 4000 20 0 30 30
   7       0 loop0 1 0 2 0 0 0 0 0 0 0 0
";

    fn linux(acq: &MockAcquirer) -> crate::error::Result<StorageSnapshot> {
        let chain = registry(&SourceContext::default())
            .resolve(OsFamily::Linux)
            .expect("registered");
        Ok(chain.read(acq)?)
    }

    #[test]
    fn test_linux_merges_all_sub_reads() {
        let mut acq = MockAcquirer::new();
        acq.add_command("df -k", DF_K)
            .add_command("df -i", DF_I)
            .add_file("/proc/mounts", MOUNTS)
            .add_file("/proc/diskstats", DISKSTATS);

        let snap = linux(&acq).expect("read");
        let root = snap.find_mount_point("/").expect("root");
        assert_eq!(root.fs_type, FileSystemType::Ext4);
        assert_eq!(root.total_inodes, 6553600);
        assert_eq!(snap.find_mount_point("/var/log").map(|m| m.mount_point.as_str()), Some("/var"));
        assert_eq!(snap.disk_io.len(), 1);
        assert_eq!(snap.disk_io[0].read_bytes, 2000 * 512);
    }

    #[test]
    fn test_linux_optional_sub_reads_degrade() {
        let mut acq = MockAcquirer::new();
        acq.add_command("df -k", DF_K);

        let snap = linux(&acq).expect("read");
        assert_eq!(snap.mount_points.len(), 2);
        assert_eq!(snap.mount_points[0].total_inodes, 0);
        assert_eq!(snap.mount_points[0].fs_type, FileSystemType::Other);
        assert!(snap.disk_io.is_empty());
    }

    #[test]
    fn test_linux_df_is_mandatory() {
        let mut acq = MockAcquirer::new();
        acq.add_command("df -i", DF_I).add_file("/proc/diskstats", DISKSTATS);
        assert!(linux(&acq).is_err());
    }

    #[test]
    fn test_macos_iostat_uses_configured_devices() {
        let ctx = SourceContext {
            iostat_devices: vec!["disk3".to_string()],
            ..SourceContext::default()
        };
        let mut acq = MockAcquirer::new();
        acq.add_command(
            "df -ki",
            "Filesystem 1024-blocks Used Available Capacity iused ifree %iused Mounted on\n\
             /dev/disk3s1 1000000 400000 600000 40% 1000 9000 10% /\n",
        )
        .add_command(
            "iostat -Id disk3",
            "          disk3\n    KB/t  xfrs   MB\n   20.00  1000  19.53\n",
        );

        let snap = registry(&ctx)
            .resolve(OsFamily::MacOs)
            .expect("registered")
            .read(&acq)
            .expect("read");
        assert_eq!(snap.mount_points[0].fs_type, FileSystemType::Apfs);
        assert_eq!(snap.disk_io.len(), 1);
        assert_eq!(snap.disk_io[0].device, "disk3");
    }
}
