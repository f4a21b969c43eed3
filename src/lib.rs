//! Host Metrics Library
//!
//! Reads CPU, memory, load, uptime, network, storage, process and environment
//! metrics from the running host and returns them as typed snapshots.
//!
//! # Architecture
//!
//! - **Acquisition** ([`acquire`]): obtains raw text from a file or a command
//! - **Parsers** ([`parsers`]): pure functions from raw text to snapshots
//! - **Fallback chains** ([`chain`]): ordered pipelines, first success wins
//! - **Platform resolution** ([`platform`]): one chain per OS family, chosen once
//! - **Process trees** ([`process`]): one table scan, iterative descendant walk
//! - **Derived metrics** ([`derived`]): percentages, normalized load, lookups
//!
//! # Usage
//!
//! ```no_run
//! use hostmetrics::{Config, SourceSet};
//!
//! let sources = SourceSet::from_config(&Config::default());
//!
//! let cpu = sources.cpu.read()?;
//! println!("cores: {}", cpu.core_count());
//!
//! let memory = sources.memory.read()?;
//! println!("memory used: {:.1}%", memory.used_percentage());
//!
//! let load = sources.load.read()?.normalized(cpu.core_count());
//! println!("load: {:.2}", load.one_minute);
//! # Ok::<(), hostmetrics::MetricsError>(())
//! ```
//!
//! Percentages from a single CPU snapshot are averages since boot. For
//! current usage take two snapshots and compute a [`CpuDelta`].

pub mod acquire;
pub mod chain;
pub mod config;
pub mod derived;
pub mod error;
pub mod model;
pub mod parsers;
pub mod platform;
pub mod process;
pub mod sources;

// Re-export main types for convenience
pub use acquire::{Acquire, MockAcquirer, Source, SystemAcquirer};
pub use chain::{FallbackChain, Pipeline, ProbeResult};
pub use config::{load_config, Config, ConfigError};
pub use error::{AcquisitionError, AggregateError, Attempt, MetricsError, ParseError, Result};
pub use model::*;
pub use platform::{CompositeSource, PlatformRegistry};
pub use process::{ProcessSource, ProcessTree};
pub use sources::{SourceContext, SourceSet};
