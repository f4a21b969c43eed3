//! Configuration for the metrics engine.
//!
//! Loaded from YAML, JSON or TOML by file extension. Every field has a
//! default, so an empty file and a missing file both produce a working
//! configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::model::OsFamily;

pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_SYS_ROOT: &str = "/sys";
pub const DEFAULT_ETC_ROOT: &str = "/etc";

/// Searched in order when no path is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "/etc/hostmetrics/hostmetrics.yaml",
    "/etc/hostmetrics/hostmetrics.yml",
    "/etc/hostmetrics/hostmetrics.json",
    "/etc/hostmetrics/hostmetrics.toml",
    "./hostmetrics.yaml",
    "./hostmetrics.yml",
    "./hostmetrics.json",
    "./hostmetrics.toml",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn default_proc_root() -> PathBuf {
    PathBuf::from(DEFAULT_PROC_ROOT)
}
fn default_sys_root() -> PathBuf {
    PathBuf::from(DEFAULT_SYS_ROOT)
}
fn default_etc_root() -> PathBuf {
    PathBuf::from(DEFAULT_ETC_ROOT)
}
fn default_iostat_devices() -> Vec<String> {
    vec!["disk0".to_string(), "disk1".to_string(), "disk2".to_string()]
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the proc filesystem; point at `/host/proc` inside a container.
    #[serde(alias = "proc-root")]
    pub proc_root: PathBuf,
    #[serde(alias = "sys-root")]
    pub sys_root: PathBuf,
    #[serde(alias = "etc-root")]
    pub etc_root: PathBuf,

    /// Overrides `sysconf(_SC_PAGESIZE)` for RSS conversion.
    #[serde(alias = "page-size", skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,

    /// Kills commands that run longer than this.
    #[serde(alias = "command-timeout-ms", skip_serializing_if = "Option::is_none")]
    pub command_timeout_ms: Option<u64>,

    /// Devices passed to `iostat -Id` on macOS.
    #[serde(alias = "iostat-devices")]
    pub iostat_devices: Vec<String>,

    /// Forces the platform instead of detecting it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<OsFamily>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: default_proc_root(),
            sys_root: default_sys_root(),
            etc_root: default_etc_root(),
            page_size: None,
            command_timeout_ms: None,
            iostat_devices: default_iostat_devices(),
            platform: None,
        }
    }
}

impl Config {
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }

    /// Rejects values that would make every read fail or misreport.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == Some(0) {
            return Err(ConfigError::Invalid("page_size must be greater than 0".into()));
        }
        if self.command_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "command_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.iostat_devices.is_empty() {
            return Err(ConfigError::Invalid("iostat_devices must not be empty".into()));
        }
        if let Some(dev) = self.iostat_devices.iter().find(|d| d.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("invalid iostat device name {:?}", dev)));
        }
        if self.proc_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("proc_root must not be empty".into()));
        }
        Ok(())
    }

    /// Parses `content` in the format implied by `path`'s extension (YAML by default).
    pub fn from_str_for_path(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let path_buf = path.to_path_buf();
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(content).map_err(|source| ConfigError::Json {
                path: path_buf,
                source,
            }),
            Some("toml") => toml::from_str(content).map_err(|source| ConfigError::Toml {
                path: path_buf,
                source,
            }),
            _ => {
                // Empty YAML documents deserialize as unit, not as an empty map
                if content.trim().is_empty() {
                    return Ok(Config::default());
                }
                serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
                    path: path_buf,
                    source,
                })
            }
        }
    }
}

/// Loads the configuration from `path`, or from the first existing default
/// location. No file at all yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS.iter().map(Path::new).find(|p| p.exists()) {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = Config::from_str_for_path(&content, &path)?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}
