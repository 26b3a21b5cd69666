//! Unified error handling
//!
//! `DeployError` describes what went wrong; `Failure` says whether the
//! pipeline may continue after it.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while provisioning or deploying
#[derive(Debug, Error)]
pub enum DeployError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or misses required keys
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config parsed but holds an unusable value
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Program could not be started at all
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Program ran and exited unsuccessfully
    #[error("Command `{command}` failed ({})", describe_code(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// Program exceeded the configured command timeout and was killed
    #[error("Command `{command}` timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },

    /// A required executable is not on PATH
    #[error("{0} is required but was not found on PATH")]
    MissingTool(String),

    /// One or more global npm tools could not be installed
    #[error("Failed to install global tools: {}", .0.join(", "))]
    ToolsNotInstalled(Vec<String>),

    /// Log sink could not be opened
    #[error("Failed to set up logging: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl DeployError {
    /// Captured stdout + stderr of a failed command
    pub fn command_output(&self) -> Option<(&str, &str)> {
        match self {
            DeployError::CommandFailed { stdout, stderr, .. } => Some((stdout, stderr)),
            _ => None,
        }
    }
}

/// Recovery class of a failed step
///
/// `Recoverable` is logged at WARN and the pipeline carries on;
/// `Fatal` aborts the run with a non-zero exit.
#[derive(Debug)]
pub enum Failure {
    Recoverable(DeployError),
    Fatal(DeployError),
}

impl Failure {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Failure::Fatal(_))
    }

    pub fn error(&self) -> &DeployError {
        match self {
            Failure::Recoverable(e) | Failure::Fatal(e) => e,
        }
    }

    pub fn into_error(self) -> DeployError {
        match self {
            Failure::Recoverable(e) | Failure::Fatal(e) => e,
        }
    }
}

impl From<DeployError> for Failure {
    fn from(err: DeployError) -> Self {
        Failure::Fatal(err)
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Recoverable(e) => write!(f, "recoverable: {}", e),
            Failure::Fatal(e) => write!(f, "fatal: {}", e),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error())
    }
}

/// Result of a pipeline step
pub type StepResult<T = ()> = Result<T, Failure>;
