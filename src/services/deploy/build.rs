//! Build stage
//!
//! Installs project dependencies, then runs the configured build command.

use std::path::Path;
use tracing::info;

use crate::config::env::constants::LOCK_FILE;
use crate::domain::CommandSpec;
use crate::error::StepResult;

use super::context::DeployContext;

/// How project dependencies get installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStrategy {
    /// `npm ci`: installs exactly what the lock file pins and never rewrites it
    Locked,
    /// `npm install`: resolves versions and may create a lock file
    Unlocked,
}

impl InstallStrategy {
    pub fn detect(project_dir: &Path) -> Self {
        if project_dir.join(LOCK_FILE).is_file() {
            InstallStrategy::Locked
        } else {
            InstallStrategy::Unlocked
        }
    }

    pub fn command(&self) -> CommandSpec {
        match self {
            InstallStrategy::Locked => CommandSpec::new("npm").arg("ci"),
            InstallStrategy::Unlocked => CommandSpec::new("npm").arg("install"),
        }
    }
}

pub async fn run(ctx: &DeployContext) -> StepResult<String> {
    let dir = ctx.config.repository.dir.as_path();
    let build_command = &ctx.config.app.build_command;
    info!("Setting up project in {}...", dir.display());

    let strategy = InstallStrategy::detect(dir);
    let install = strategy.command();
    let install_line = install.display();
    ctx.exec(install.current_dir(dir)).await?;

    ctx.exec(CommandSpec::shell(build_command).current_dir(dir))
        .await?;

    info!("Project setup completed successfully");
    Ok(format!("{}, {}", install_line, build_command))
}
