//! CLI arguments and subcommands for hostmetrics.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use hostmetrics::OsFamily;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Output format for snapshots
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Platform override accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlatformArg {
    Linux,
    Macos,
    Freebsd,
}

impl From<PlatformArg> for OsFamily {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Linux => OsFamily::Linux,
            PlatformArg::Macos => OsFamily::MacOs,
            PlatformArg::Freebsd => OsFamily::FreeBsd,
        }
    }
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "hostmetrics",
    about = "Print host resource metrics as JSON or YAML",
    long_about = "Print host resource metrics as JSON or YAML.\n\n\
                  Reads CPU, memory, load, uptime, network, storage, process and environment \
                  metrics through per-platform fallback chains of /proc files and system commands.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Output format for snapshots
    #[arg(short = 'f', long, value_enum, default_value = "json", global = true)]
    pub format: OutputFormat,

    /// Override the proc filesystem root (e.g. /host/proc)
    #[arg(long, global = true)]
    pub proc_root: Option<PathBuf>,

    /// Override the detected platform
    #[arg(long, value_enum, global = true)]
    pub platform: Option<PlatformArg>,

    /// Kill commands running longer than this many milliseconds
    #[arg(long, global = true)]
    pub command_timeout_ms: Option<u64>,
}

/// Subcommands, one per metric domain plus diagnostics
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// CPU tick counters, or usage over an interval with --sample-ms
    Cpu {
        /// Take a second snapshot after this many milliseconds and print the delta
        #[arg(long)]
        sample_ms: Option<u64>,
    },

    /// Physical memory and swap
    Memory,

    /// Load averages, normalized by core count
    Load,

    /// Uptime and boot time
    Uptime,

    /// Network interfaces and connection counts
    Network,

    /// Mounted filesystems and disk I/O
    Storage {
        /// Only print the mount holding this path (longest prefix match)
        #[arg(long)]
        path: Option<String>,
    },

    /// Resource usage of a single process
    Process {
        /// Process id (defaults to this process)
        #[arg(short = 'p', long)]
        pid: Option<u32>,
    },

    /// Resource usage of a process and all of its descendants
    Group {
        /// Root process id
        #[arg(short = 'p', long)]
        pid: u32,
    },

    /// Operating system, kernel, virtualization and container context
    Environment,

    /// Run every pipeline of every domain and report which succeed
    Check,

    /// Print the effective configuration
    Config {
        /// Output format of the configuration
        #[arg(long, value_enum, default_value = "yaml")]
        config_format: ConfigFormat,

        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}
