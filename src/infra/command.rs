//! Command execution
//!
//! Every stage talks to the host through `CommandRunner`:
//! - run a program with arguments, working directory and environment
//! - capture exit status, stdout and stderr
//! - optional timeout (the child is killed when it fires)
//! - PATH lookup for executables

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::error;

use crate::domain::{CommandOutput, CommandSpec};
use crate::error::DeployError;

/// Host command capability
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and capture both streams
    ///
    /// A non-zero exit is not an error here; callers decide via `CommandSpec::check`.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, DeployError>;

    /// Resolve an executable on PATH
    fn which(&self, program: &str) -> Option<PathBuf>;
}

/// Runs commands on the local host via `tokio::process`
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, DeployError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = spec.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let result = match spec.timeout {
            Some(timeout) => {
                tokio::select! {
                    result = cmd.output() => result,
                    _ = tokio::time::sleep(timeout) => {
                        error!(command = %spec.display(), "Command timed out after {:?}", timeout);
                        return Err(DeployError::TimedOut {
                            command: spec.display(),
                            timeout,
                        });
                    }
                }
            }
            None => cmd.output().await,
        };

        let output = result.map_err(|source| DeployError::Spawn {
            command: spec.display(),
            source,
        })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        find_executable(program, std::env::var_os("PATH").as_deref())
    }
}

/// Look up `program` in a PATH-style list of directories
///
/// Names containing a path separator are checked as-is.
pub fn find_executable(program: &str, path: Option<&OsStr>) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }
    if program.contains(std::path::MAIN_SEPARATOR) {
        let candidate = PathBuf::from(program);
        return is_executable(&candidate).then_some(candidate);
    }

    std::env::split_paths(path?)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
