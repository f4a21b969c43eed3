//! Raw data acquisition.
//!
//! Every metric starts life as raw text, either the content of a file
//! (`/proc/stat`) or the stdout of a command (`df -k`). The [`Acquire`] trait
//! abstracts both so pipelines can run against the real host or against the
//! in-memory [`mock::MockAcquirer`] in tests.
//!
//! Acquirers never retry; fallback policy belongs to [`crate::chain`].

pub mod mock;
pub mod system;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::AcquisitionError;

pub use mock::MockAcquirer;
pub use system::SystemAcquirer;

/// Where raw text comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    File(PathBuf),
    Command { program: String, args: Vec<String> },
}

impl Source {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Source::File(path.into())
    }

    pub fn command(program: &str, args: &[&str]) -> Self {
        Source::Command {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Builds a command from a whitespace separated line such as `df -k`.
    pub fn command_line(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let program = parts.next().unwrap_or_default().to_string();
        Source::Command {
            program,
            args: parts.map(str::to_string).collect(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Command { program, args } => {
                write!(f, "{}", program)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

/// Obtains raw text from files and commands.
pub trait Acquire: Send + Sync {
    /// Reads a file or runs a command and returns its text.
    fn read(&self, source: &Source) -> Result<String, AcquisitionError>;

    /// Lists the entry names of a directory.
    fn list_dir(&self, path: &Path) -> Result<Vec<String>, AcquisitionError>;

    /// Checks whether a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Looks up an environment variable of the current process.
    fn env_var(&self, name: &str) -> Option<String>;

    /// Convenience wrapper for file reads.
    fn read_file(&self, path: &Path) -> Result<String, AcquisitionError> {
        self.read(&Source::File(path.to_path_buf()))
    }

    /// Convenience wrapper for command runs.
    fn run(&self, program: &str, args: &[&str]) -> Result<String, AcquisitionError> {
        self.read(&Source::command(program, args))
    }
}
