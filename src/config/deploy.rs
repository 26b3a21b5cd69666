//! Deployment config file

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::env::constants::DEFAULT_LOG_FILE;
use crate::error::DeployError;

/// Deployment config, loaded once per run
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    pub node: NodeConfig,
    pub repository: RepositoryConfig,
    pub app: AppConfig,
    #[serde(default)]
    pub host: HostConfig,
}

/// Node.js runtime
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// NodeSource major version (e.g. "23")
    pub version: String,
}

/// Source repository
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    pub url: String,
    /// Local working tree
    pub dir: PathBuf,
    /// Branch to clone and pull; remote default when unset
    #[serde(default)]
    pub branch: Option<String>,
}

/// Application under PM2
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// PM2 process name
    pub name: String,
    pub build_command: String,
    pub start_command: String,
}

/// Host provisioning
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Executables installed through apt-get when missing
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,
    /// npm packages installed globally when missing
    #[serde(default = "default_global_tools")]
    pub global_tools: Vec<String>,
    /// Account PM2 resurrects the process list for at boot
    #[serde(default)]
    pub startup_user: Option<String>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            packages: default_packages(),
            global_tools: default_global_tools(),
            startup_user: None,
            log_file: None,
            command_timeout_secs: None,
        }
    }
}

fn default_packages() -> Vec<String> {
    vec!["git".to_string(), "curl".to_string()]
}

fn default_global_tools() -> Vec<String> {
    vec!["pm2".to_string()]
}

impl DeployConfig {
    /// Read, parse and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, DeployError> {
        let content = std::fs::read_to_string(path).map_err(|source| DeployError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, DeployError> {
        let config: DeployConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no stage could work with
    pub fn validate(&self) -> Result<(), DeployError> {
        let required = [
            ("node.version", self.node.version.as_str()),
            ("repository.url", self.repository.url.as_str()),
            ("app.name", self.app.name.as_str()),
            ("app.build_command", self.app.build_command.as_str()),
            ("app.start_command", self.app.start_command.as_str()),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(DeployError::InvalidConfig(format!("{} must not be empty", key)));
            }
        }

        if self.repository.dir.as_os_str().is_empty() {
            return Err(DeployError::InvalidConfig(
                "repository.dir must not be empty".to_string(),
            ));
        }

        if !self
            .node
            .version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.')
        {
            return Err(DeployError::InvalidConfig(format!(
                "node.version {:?} is not a NodeSource version",
                self.node.version
            )));
        }

        if let Some(tool) = self
            .host
            .packages
            .iter()
            .chain(&self.host.global_tools)
            .find(|t| t.trim().is_empty())
        {
            return Err(DeployError::InvalidConfig(format!(
                "empty entry {:?} in host tool lists",
                tool
            )));
        }

        if self.host.command_timeout_secs == Some(0) {
            return Err(DeployError::InvalidConfig(
                "host.command_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.host.command_timeout_secs.map(Duration::from_secs)
    }

    pub fn log_file(&self) -> PathBuf {
        self.host
            .log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }
}
