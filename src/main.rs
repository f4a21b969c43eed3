//! hostmetrics - command-line front end.
//!
//! Parses arguments, resolves the configuration, builds the per-platform
//! sources once and prints one snapshot per invocation.

mod cli;
mod commands;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, Level};

use hostmetrics::{load_config, Config, SourceSet};

use cli::{Args, Commands, LogLevel};
use commands::{
    command_check, command_config, command_cpu, command_environment, command_group, command_load,
    command_memory, command_network, command_process, command_storage, command_uptime,
};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) -> anyhow::Result<()> {
    let log_level = match args.log_level {
        LogLevel::Off => return Ok(()),
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    // Snapshots go to stdout, so logs must not
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Logging initialized with level: {:?}", args.log_level);
    Ok(())
}

/// Resolves the effective configuration (CLI > config file > defaults).
fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        debug!("Config file loading disabled");
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(proc_root) = &args.proc_root {
        config.proc_root = proc_root.clone();
    }
    if let Some(platform) = args.platform {
        config.platform = Some(platform.into());
    }
    if let Some(timeout) = args.command_timeout_ms {
        config.command_timeout_ms = Some(timeout);
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(&args)?;

    let config = resolve_config(&args)?;
    let format = args.format;

    if let Commands::Config { config_format, output } = &args.command {
        return command_config(&config, output.clone(), *config_format);
    }

    let sources = SourceSet::from_config(&config);
    debug!(platform = %sources.platform, "sources ready");

    match &args.command {
        Commands::Cpu { sample_ms } => command_cpu(&sources, *sample_ms, format),
        Commands::Memory => command_memory(&sources, format),
        Commands::Load => command_load(&sources, format),
        Commands::Uptime => command_uptime(&sources, format),
        Commands::Network => command_network(&sources, format),
        Commands::Storage { path } => command_storage(&sources, path.as_deref(), format),
        Commands::Process { pid } => command_process(&sources, *pid, format),
        Commands::Group { pid } => command_group(&sources, *pid, format),
        Commands::Environment => command_environment(&sources, format),
        Commands::Check => {
            if !command_check(&sources, &config) {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Config { .. } => unreachable!("Config handled above"),
    }
}
