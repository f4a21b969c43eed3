//! Per-domain sources: pipelines registered per platform, and the
//! [`SourceSet`] that wires them together from one [`Config`].

pub mod cpu;
pub mod environment;
pub mod load;
pub mod memory;
pub mod network;
pub mod storage;
pub mod uptime;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::acquire::{Acquire, SystemAcquirer};
use crate::config::Config;
use crate::error::Result;
use crate::model::{
    CpuSnapshot, EnvironmentSnapshot, LoadAverageSnapshot, MemorySnapshot, NetworkSnapshot,
    OsFamily, StorageSnapshot, UptimeSnapshot,
};
use crate::platform::CompositeSource;
use crate::process::{sysconf, ProcessSource};

/// Host layout and constants shared by every pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceContext {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
    pub etc_root: PathBuf,
    pub page_size: u64,
    pub clock_ticks_per_second: f64,
    pub iostat_devices: Vec<String>,
}

impl SourceContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            proc_root: config.proc_root.clone(),
            sys_root: config.sys_root.clone(),
            etc_root: config.etc_root.clone(),
            page_size: config.page_size.unwrap_or_else(|| *sysconf::PAGE_SIZE),
            clock_ticks_per_second: *sysconf::CLK_TCK,
            iostat_devices: config.iostat_devices.clone(),
        }
    }

    /// Path below the proc root, e.g. `proc("net/dev")`.
    pub fn proc(&self, relative: &str) -> PathBuf {
        self.proc_root.join(relative)
    }

    pub fn sys(&self, relative: &str) -> PathBuf {
        self.sys_root.join(relative)
    }

    pub fn etc(&self, relative: &str) -> PathBuf {
        self.etc_root.join(relative)
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Runs an optional sub-read of a hybrid pipeline; failure degrades to `None`.
pub(crate) fn optional<T>(
    domain: &str,
    sub_read: &str,
    read: impl FnOnce() -> Result<T>,
) -> Option<T> {
    match read() {
        Ok(value) => Some(value),
        Err(error) => {
            debug!(domain, sub_read, error = %error, "optional sub-read degraded");
            None
        }
    }
}

pub(crate) fn read_path(acquirer: &dyn Acquire, path: &Path) -> Result<String> {
    Ok(acquirer.read_file(path)?)
}

pub(crate) fn run(acquirer: &dyn Acquire, program: &str, args: &[&str]) -> Result<String> {
    Ok(acquirer.run(program, args)?)
}

/// Every domain source, resolved for one platform.
pub struct SourceSet {
    pub platform: OsFamily,
    pub cpu: CompositeSource<CpuSnapshot>,
    pub memory: CompositeSource<MemorySnapshot>,
    pub load: CompositeSource<LoadAverageSnapshot>,
    pub uptime: CompositeSource<UptimeSnapshot>,
    pub network: CompositeSource<NetworkSnapshot>,
    pub storage: CompositeSource<StorageSnapshot>,
    pub environment: CompositeSource<EnvironmentSnapshot>,
    pub process: ProcessSource,
}

impl SourceSet {
    /// Builds every source from `config` against the real host.
    pub fn from_config(config: &Config) -> Self {
        let acquirer: Arc<dyn Acquire> = match config.command_timeout() {
            Some(timeout) => Arc::new(SystemAcquirer::with_timeout(timeout)),
            None => Arc::new(SystemAcquirer::new()),
        };
        Self::with_acquirer(config, acquirer)
    }

    /// Builds every source from `config` with an explicit acquirer.
    pub fn with_acquirer(config: &Config, acquirer: Arc<dyn Acquire>) -> Self {
        let platform = config.platform.unwrap_or_else(OsFamily::current);
        let ctx = SourceContext::from_config(config);
        debug!(
            %platform,
            proc_root = %ctx.proc_root.display(),
            page_size = ctx.page_size,
            "building sources"
        );

        Self {
            platform,
            cpu: CompositeSource::new(cpu::registry(&ctx), platform, Arc::clone(&acquirer)),
            memory: CompositeSource::new(memory::registry(&ctx), platform, Arc::clone(&acquirer)),
            load: CompositeSource::new(load::registry(&ctx), platform, Arc::clone(&acquirer)),
            uptime: CompositeSource::new(uptime::registry(&ctx), platform, Arc::clone(&acquirer)),
            network: CompositeSource::new(network::registry(&ctx), platform, Arc::clone(&acquirer)),
            storage: CompositeSource::new(storage::registry(&ctx), platform, Arc::clone(&acquirer)),
            environment: CompositeSource::new(
                environment::registry(&ctx),
                platform,
                Arc::clone(&acquirer),
            ),
            process: ProcessSource::new(&ctx, platform, acquirer),
        }
    }
}
