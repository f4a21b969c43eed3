//! Acquirer backed by the real filesystem and subprocesses.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::{Acquire, Source};
use crate::error::AcquisitionError;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Reads from `std::fs` and spawns commands with `std::process::Command`.
///
/// Commands are started directly from argv, never through a shell. An
/// optional timeout kills commands that do not finish in time.
#[derive(Debug, Default, Clone)]
pub struct SystemAcquirer {
    command_timeout: Option<Duration>,
}

impl SystemAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            command_timeout: Some(timeout),
        }
    }

    fn read_path(&self, path: &Path) -> Result<String, AcquisitionError> {
        let content = fs::read_to_string(path)
            .map_err(|e| AcquisitionError::from_io(path.display().to_string(), &e))?;
        trace!("Read {} bytes from {}", content.len(), path.display());
        Ok(content)
    }

    fn execute(
        &self,
        source: &Source,
        program: &str,
        args: &[String],
    ) -> Result<String, AcquisitionError> {
        let target = source.to_string();
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::PermissionDenied => AcquisitionError::PermissionDenied {
                    target: target.clone(),
                },
                _ => AcquisitionError::ExecutionFailed {
                    target: target.clone(),
                    reason: format!("spawn failed: {}", e),
                },
            })?;

        // Drain both pipes on helper threads so a chatty command cannot block
        // on a full pipe while we wait for it.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match self.command_timeout {
            None => child.wait(),
            Some(timeout) => {
                let start = Instant::now();
                loop {
                    match child.try_wait() {
                        Ok(Some(status)) => break Ok(status),
                        Ok(None) if start.elapsed() >= timeout => {
                            let _ = child.kill();
                            let _ = child.wait();
                            return Err(AcquisitionError::ExecutionFailed {
                                target,
                                reason: format!("timed out after {} ms", timeout.as_millis()),
                            });
                        }
                        Ok(None) => thread::sleep(POLL_INTERVAL),
                        Err(e) => break Err(e),
                    }
                }
            }
        }
        .map_err(|e| AcquisitionError::ExecutionFailed {
            target: target.clone(),
            reason: e.to_string(),
        })?;

        let out = stdout.and_then(|h| h.join().ok()).unwrap_or_default();
        let err = stderr.and_then(|h| h.join().ok()).unwrap_or_default();

        if !status.success() {
            let stderr_text = String::from_utf8_lossy(&err).trim().to_string();
            return Err(AcquisitionError::ExecutionFailed {
                target,
                reason: match status.code() {
                    Some(code) if stderr_text.is_empty() => format!("exit status {}", code),
                    Some(code) => format!("exit status {}: {}", code, stderr_text),
                    None => "terminated by signal".to_string(),
                },
            });
        }

        debug!("Command '{}' produced {} bytes", target, out.len());
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

impl Acquire for SystemAcquirer {
    fn read(&self, source: &Source) -> Result<String, AcquisitionError> {
        match source {
            Source::File(path) => self.read_path(path),
            Source::Command { program, args } => self.execute(source, program, args),
        }
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, AcquisitionError> {
        let entries = fs::read_dir(path)
            .map_err(|e| AcquisitionError::from_io(path.display().to_string(), &e))?;
        let mut names = Vec::new();
        for entry in entries.flatten() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // -------------------------------------------------------------------------
    // Files
    // -------------------------------------------------------------------------

    #[test]
    fn test_read_existing_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("loadavg");
        std::fs::write(&path, "0.52 0.58 0.59 2/1190 12345\n").expect("write");

        let acq = SystemAcquirer::new();
        let content = acq.read(&Source::File(path)).expect("read");
        assert!(content.starts_with("0.52"));
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let dir = tempdir().expect("Failed to create temp dir");
        let acq = SystemAcquirer::new();
        let err = acq
            .read_file(&dir.path().join("does-not-exist"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_dir_returns_entry_names() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("0"), "").expect("write");
        std::fs::write(dir.path().join("1"), "").expect("write");
        std::fs::create_dir(dir.path().join("2")).expect("mkdir");

        let acq = SystemAcquirer::new();
        let mut names = acq.list_dir(dir.path()).expect("list");
        names.sort();
        assert_eq!(names, vec!["0", "1", "2"]);
        assert!(acq.exists(&dir.path().join("2")));
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    #[cfg(unix)]
    #[test]
    fn test_run_command_captures_stdout() {
        let acq = SystemAcquirer::new();
        let out = acq.run("echo", &["hello world"]).expect("echo");
        assert_eq!(out.trim(), "hello world");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_execution_failure() {
        let acq = SystemAcquirer::new();
        let err = acq.run("false", &[]).unwrap_err();
        assert!(matches!(err, AcquisitionError::ExecutionFailed { .. }));
    }

    #[test]
    fn test_missing_program_is_execution_failure() {
        let acq = SystemAcquirer::new();
        let err = acq.run("nonexistentcommand12345", &[]).unwrap_err();
        assert!(matches!(err, AcquisitionError::ExecutionFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_slow_command() {
        let acq = SystemAcquirer::with_timeout(Duration::from_millis(50));
        let err = acq.run("sleep", &["5"]).unwrap_err();
        match err {
            AcquisitionError::ExecutionFailed { reason, .. } => {
                assert!(reason.contains("timed out"), "unexpected reason: {}", reason)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
