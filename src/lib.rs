//! node-deployer: provision a host and deploy a Node.js app under PM2
//!
//! Library entry point. `run_with_config` loads the TOML config, installs the
//! log subscriber and drives the deployment pipeline once.

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod logging;
pub mod services;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::env::constants::{DEFAULT_CONFIG_FILE, DEFAULT_LOG_FILE, VERSION};
use crate::config::DeployConfig;
use crate::infra::{CommandRunner, SystemRunner};
use crate::services::deploy::{self, DeployContext};

/// Process exit code on full pipeline success
pub const EXIT_SUCCESS: u8 = 0;
/// Process exit code on any fatal failure
pub const EXIT_FAILURE: u8 = 1;

/// Command line settings
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub config_path: PathBuf,
    /// Overrides `host.log_file`
    pub log_file: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            log_file: None,
        }
    }
}

/// Run one deployment against the real host
pub async fn run_with_config(runtime: RuntimeConfig) -> u8 {
    run_with_runner(runtime, Arc::new(SystemRunner::new())).await
}

/// Run one deployment with the given command runner, returning the exit code
pub async fn run_with_runner(runtime: RuntimeConfig, runner: Arc<dyn CommandRunner>) -> u8 {
    let loaded = DeployConfig::load(&runtime.config_path);

    let log_file = runtime.log_file.clone().unwrap_or_else(|| match &loaded {
        Ok(config) => config.log_file(),
        Err(_) => PathBuf::from(DEFAULT_LOG_FILE),
    });

    let _guard = match logging::init(&log_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    tracing::info!(
        version = VERSION,
        config = %runtime.config_path.display(),
        log_file = %log_file.display(),
        "node-deployer starting"
    );

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return EXIT_FAILURE;
        }
    };

    let ctx = DeployContext::new(config, runner);
    let report = deploy::execute(&ctx).await;

    if report.succeeded() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}
