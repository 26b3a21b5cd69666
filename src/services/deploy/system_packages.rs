//! System package stage
//!
//! Installs missing executables through apt-get. Presence is decided by a
//! PATH lookup only.

use tracing::info;

use crate::domain::CommandSpec;
use crate::error::StepResult;

use super::context::DeployContext;

/// Install every configured package whose executable is not on PATH
pub async fn ensure(ctx: &DeployContext) -> StepResult<String> {
    let mut missing = Vec::new();
    for package in &ctx.config.host.packages {
        match ctx.which(package) {
            Some(path) => info!("{} is already installed at {}", package, path.display()),
            None => {
                info!("{} is not installed", package);
                missing.push(package.as_str());
            }
        }
    }

    if missing.is_empty() {
        return Ok("all packages present".to_string());
    }

    ctx.exec(CommandSpec::new("sudo").args(["apt-get", "update"]))
        .await?;

    for &package in &missing {
        info!("Installing {}...", package);
        ctx.exec(CommandSpec::new("sudo").args(["apt-get", "install", "-y", package]))
            .await?;
        info!("{} installed successfully", package);
    }

    Ok(format!("installed {}", missing.join(", ")))
}
