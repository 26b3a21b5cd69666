//! Node.js runtime stage
//!
//! Installs Node.js from NodeSource when `node` is not on PATH:
//! 1. download the version-pinned setup script
//! 2. run it with sudo
//! 3. apt-get install nodejs
//!
//! The downloaded script is removed on every exit path.

use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::config::env::constants::NODESOURCE_SETUP_URL;
use crate::domain::CommandSpec;
use crate::error::{DeployError, StepResult};

use super::context::DeployContext;

const SETUP_SCRIPT_PREFIX: &str = "nodesource_setup";

/// NodeSource setup script URL for a major version
pub fn setup_url(version: &str) -> String {
    NODESOURCE_SETUP_URL.replace("{version}", version)
}

/// Freshly created, uniquely named setup script, removed when dropped
///
/// Only the file this run created is ever deleted.
struct SetupScript {
    file: Option<NamedTempFile>,
}

impl SetupScript {
    fn create(dir: &Path) -> Result<Self, DeployError> {
        let file = tempfile::Builder::new()
            .prefix(SETUP_SCRIPT_PREFIX)
            .suffix(".sh")
            .tempfile_in(dir)?;
        Ok(Self { file: Some(file) })
    }

    fn path(&self) -> &Path {
        self.file
            .as_ref()
            .map(NamedTempFile::path)
            .unwrap_or_else(|| Path::new(""))
    }

    fn path_str(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }
}

impl Drop for SetupScript {
    fn drop(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        let path = file.path().to_path_buf();
        match file.close() {
            Ok(()) => info!("Removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove NodeSource setup script"
            ),
        }
    }
}

/// Install Node.js unless already resolvable
pub async fn ensure(ctx: &DeployContext) -> StepResult<String> {
    if let Some(path) = ctx.which("node") {
        info!("Node.js is already installed at {}", path.display());
        return Ok(format!("already installed at {}", path.display()));
    }

    let version = &ctx.config.node.version;
    info!("Installing Node.js version {}...", version);

    let script = SetupScript::create(&ctx.scratch_dir)?;
    ctx.exec(
        CommandSpec::new("curl")
            .arg("-fsSL")
            .arg(setup_url(version))
            .arg("-o")
            .arg(script.path_str()),
    )
    .await?;
    ctx.exec(CommandSpec::new("sudo").arg("bash").arg(script.path_str()))
        .await?;
    ctx.exec(CommandSpec::new("sudo").args(["apt-get", "install", "-y", "nodejs"]))
        .await?;

    info!("Node.js installed successfully");
    Ok(format!("installed Node.js {}.x", version))
}
