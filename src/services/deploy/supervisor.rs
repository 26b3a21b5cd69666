//! PM2 bridge
//!
//! Two separately fallible stages:
//! - `start`: drop any stale PM2 entry under the app name, then start the app
//! - `persist`: register PM2 with systemd for the startup user and save the
//!   process list so it is resurrected at boot

use tracing::{info, warn};

use crate::config::env::{home_dir, login_user};
use crate::domain::{CommandOutput, CommandSpec};
use crate::error::{DeployError, Failure, StepResult};

use super::context::DeployContext;

/// Whether pm2 reported that the named process does not exist
fn is_missing_process(output: &CommandOutput) -> bool {
    let text = output.combined().to_lowercase();
    text.contains("not found") || text.contains("does not exist") || text.contains("doesn't exist")
}

/// `pm2 delete <name>`; a missing process is a recoverable failure
async fn stop_existing(ctx: &DeployContext, name: &str) -> StepResult {
    let output = ctx
        .exec(CommandSpec::new("pm2").args(["delete", name]).unchecked())
        .await?;

    if output.success() {
        info!("Removed existing PM2 process {}", name);
        return Ok(());
    }

    let err = DeployError::CommandFailed {
        command: format!("pm2 delete {}", name),
        code: output.code,
        stdout: output.stdout.clone(),
        stderr: output.stderr.clone(),
    };
    if is_missing_process(&output) {
        Err(Failure::Recoverable(err))
    } else {
        Err(Failure::Fatal(err))
    }
}

/// `pm2 start <program> --name <name> -- <args>` for a start command line
pub fn start_command(start_command: &str, name: &str) -> Result<CommandSpec, DeployError> {
    let mut parts = start_command.split_whitespace();
    let program = parts.next().ok_or_else(|| {
        DeployError::InvalidConfig("app.start_command must not be empty".to_string())
    })?;
    let args: Vec<&str> = parts.collect();

    let mut spec = CommandSpec::new("pm2").args(["start", program, "--name", name]);
    if !args.is_empty() {
        spec = spec.arg("--").args(args);
    }
    Ok(spec)
}

pub async fn start(ctx: &DeployContext) -> StepResult<String> {
    let app = &ctx.config.app;
    let dir = ctx.config.repository.dir.as_path();
    info!("Starting application in {} using PM2...", dir.display());

    match stop_existing(ctx, &app.name).await {
        Ok(()) => {}
        Err(Failure::Recoverable(e)) => {
            warn!(error = %e, "PM2 process {} does not exist, nothing to stop", app.name);
        }
        Err(fatal) => return Err(fatal),
    }

    let spec = start_command(&app.start_command, &app.name)?;
    ctx.exec(spec.current_dir(dir)).await?;

    info!("Application started successfully with PM2");
    Ok(format!("{} running as {}", app.start_command, app.name))
}

/// Home directory PM2 writes its dump file to for `user`
fn home_for(user: &str) -> String {
    if login_user().as_deref() == Some(user) {
        if let Some(home) = home_dir() {
            return home;
        }
    }
    if user == "root" {
        "/root".to_string()
    } else {
        format!("/home/{}", user)
    }
}

async fn startup_user(ctx: &DeployContext) -> Result<String, DeployError> {
    if let Some(user) = ctx
        .config
        .host
        .startup_user
        .clone()
        .or_else(login_user)
    {
        return Ok(user);
    }

    let output = ctx.exec(CommandSpec::new("whoami")).await?;
    let user = output.stdout.trim().to_string();
    if user.is_empty() {
        return Err(DeployError::InvalidConfig(
            "cannot determine startup user, set host.startup_user".to_string(),
        ));
    }
    Ok(user)
}

pub async fn persist(ctx: &DeployContext) -> StepResult<String> {
    let user = startup_user(ctx).await?;
    let home = home_for(&user);
    let path = format!("PATH={}", std::env::var("PATH").unwrap_or_default());
    info!(user = %user, home = %home, "Registering PM2 startup");

    ctx.exec(CommandSpec::new("sudo").args([
        "env",
        path.as_str(),
        "pm2",
        "startup",
        "systemd",
        "-u",
        user.as_str(),
        "--hp",
        home.as_str(),
    ]))
    .await?;
    ctx.exec(CommandSpec::new("pm2").arg("save")).await?;

    info!("PM2 startup configuration completed");
    Ok(format!("startup registered for {}", user))
}
