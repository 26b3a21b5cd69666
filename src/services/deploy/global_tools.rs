//! Global npm tools stage (PM2 and friends)
//!
//! A tool that fails to install does not stop the batch; the stage then ends
//! with a recoverable failure naming every tool that is still missing.

use tracing::{error, info, warn};

use crate::domain::CommandSpec;
use crate::error::{DeployError, Failure, StepResult};

use super::context::DeployContext;

pub async fn ensure(ctx: &DeployContext) -> StepResult<String> {
    let tools = &ctx.config.host.global_tools;
    if tools.is_empty() {
        return Ok("no global tools configured".to_string());
    }

    if !ctx.has("npm") {
        error!("NPM is required to install global tools. Please install NPM and try again.");
        return Err(DeployError::MissingTool("npm".to_string()).into());
    }

    let mut installed = Vec::new();
    let mut failed = Vec::new();

    for tool in tools {
        if ctx.has(tool) {
            info!("{} is already installed", tool);
            continue;
        }

        info!("Installing {}...", tool);
        match ctx
            .exec(CommandSpec::new("npm").args(["install", "-g", tool.as_str()]))
            .await
        {
            Ok(_) => {
                info!("{} installed successfully", tool);
                installed.push(tool.clone());
            }
            Err(e) => {
                warn!(tool = %tool, error = %e, "Global tool install failed, continuing");
                if let Some((_, stderr)) = e.command_output() {
                    if !stderr.trim().is_empty() {
                        warn!("STDERR: {}", stderr.trim_end());
                    }
                }
                failed.push(tool.clone());
            }
        }
    }

    if !failed.is_empty() {
        return Err(Failure::Recoverable(DeployError::ToolsNotInstalled(failed)));
    }

    if installed.is_empty() {
        Ok("all tools present".to_string())
    } else {
        Ok(format!("installed {}", installed.join(", ")))
    }
}
