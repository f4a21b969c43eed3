//! In-memory acquirer for testing pipelines without a real host.
//!
//! `MockAcquirer` simulates files, directories, command outputs and
//! environment variables, so Linux and macOS pipelines can be exercised on
//! any machine.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::{Acquire, Source};
use crate::error::AcquisitionError;

#[derive(Debug, Clone, Default)]
pub struct MockAcquirer {
    files: HashMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
    denied: HashSet<PathBuf>,
    commands: HashMap<String, Result<String, AcquisitionError>>,
    env: HashMap<String, String>,
}

impl MockAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content. Parent directories are created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) -> &mut Self {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
        self
    }

    /// Adds an empty directory (and its parents).
    pub fn add_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
        self
    }

    /// Makes reads and listings of `path` fail with `PermissionDenied`.
    pub fn deny(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.denied.insert(path.as_ref().to_path_buf());
        self
    }

    /// Registers the stdout of a command line such as `df -k`.
    pub fn add_command(&mut self, line: &str, output: impl Into<String>) -> &mut Self {
        self.commands
            .insert(Source::command_line(line).to_string(), Ok(output.into()));
        self
    }

    /// Registers a command line that fails with the given error.
    pub fn fail_command(&mut self, line: &str, error: AcquisitionError) -> &mut Self {
        self.commands
            .insert(Source::command_line(line).to_string(), Err(error));
        self
    }

    pub fn set_env(&mut self, name: &str, value: &str) -> &mut Self {
        self.env.insert(name.to_string(), value.to_string());
        self
    }

    /// Adds `/proc/<pid>/stat` plus `open_fds` entries under `/proc/<pid>/fd`.
    pub fn add_process(
        &mut self,
        proc_root: &Path,
        pid: u32,
        stat: &str,
        open_fds: usize,
    ) -> &mut Self {
        let base = proc_root.join(pid.to_string());
        self.add_file(base.join("stat"), stat);
        self.add_dir(base.join("fd"));
        for fd in 0..open_fds {
            self.add_file(base.join("fd").join(fd.to_string()), "");
        }
        self
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl Acquire for MockAcquirer {
    fn read(&self, source: &Source) -> Result<String, AcquisitionError> {
        match source {
            Source::File(path) => {
                if self.denied.contains(path) {
                    return Err(AcquisitionError::PermissionDenied {
                        target: path.display().to_string(),
                    });
                }
                self.files
                    .get(path)
                    .cloned()
                    .ok_or_else(|| AcquisitionError::NotFound {
                        target: path.display().to_string(),
                    })
            }
            Source::Command { .. } => {
                let key = source.to_string();
                match self.commands.get(&key) {
                    Some(result) => result.clone(),
                    None => Err(AcquisitionError::ExecutionFailed {
                        target: key,
                        reason: "command not registered".to_string(),
                    }),
                }
            }
        }
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, AcquisitionError> {
        if self.denied.contains(path) {
            return Err(AcquisitionError::PermissionDenied {
                target: path.display().to_string(),
            });
        }
        if !self.directories.contains(path) {
            return Err(AcquisitionError::NotFound {
                target: path.display().to_string(),
            });
        }

        let mut names: Vec<String> = self
            .files
            .keys()
            .chain(self.directories.iter())
            .filter(|p| p.parent() == Some(path))
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }
}
