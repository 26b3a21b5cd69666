//! Deployment context
//!
//! Everything a stage needs: the config, the command runner and a scratch
//! directory for temporary files.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::DeployConfig;
use crate::domain::{CommandOutput, CommandSpec};
use crate::error::DeployError;
use crate::infra::CommandRunner;

#[derive(Clone)]
pub struct DeployContext {
    pub config: Arc<DeployConfig>,
    pub runner: Arc<dyn CommandRunner>,
    /// Where downloaded installer scripts are written
    pub scratch_dir: PathBuf,
}

impl DeployContext {
    pub fn new(config: DeployConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
            scratch_dir: std::env::temp_dir(),
        }
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// PATH lookup, never runs the tool
    pub fn which(&self, program: &str) -> Option<PathBuf> {
        self.runner.which(program)
    }

    pub fn has(&self, program: &str) -> bool {
        self.which(program).is_some()
    }

    /// Run a command
    ///
    /// Applies the configured timeout unless the command sets its own. A non-zero
    /// exit of a checked command becomes `DeployError::CommandFailed` carrying
    /// the captured streams; logging the failure is left to the caller.
    pub async fn exec(&self, spec: CommandSpec) -> Result<CommandOutput, DeployError> {
        let spec = if spec.timeout.is_none() {
            let timeout = self.config.command_timeout();
            spec.timeout(timeout)
        } else {
            spec
        };

        let command = spec.display();
        info!("Executing command: {}", command);

        let output = self.runner.run(&spec).await?;

        if !output.stdout.trim().is_empty() {
            debug!(command = %command, "stdout: {}", output.stdout.trim_end());
        }
        if !output.stderr.trim().is_empty() {
            debug!(command = %command, "stderr: {}", output.stderr.trim_end());
        }

        if spec.check && !output.success() {
            return Err(DeployError::CommandFailed {
                command,
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        if output.success() {
            info!("Command executed successfully");
        }
        Ok(output)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::infra::FakeRunner;
    use std::time::Duration;

    pub(crate) fn test_config() -> DeployConfig {
        DeployConfig::parse(
            r#"
[node]
version = "23"

[repository]
url = "R"
dir = "/opt/app"

[app]
name = "app"
build_command = "build"
start_command = "serve"
"#,
        )
        .unwrap()
    }

    pub(crate) fn test_context(runner: Arc<FakeRunner>) -> DeployContext {
        DeployContext::new(test_config(), runner)
    }

    #[tokio::test]
    async fn test_exec_checked_failure() {
        let runner = Arc::new(FakeRunner::new());
        runner.fail("git pull", 1, "fatal: not a git repository");
        let ctx = test_context(runner.clone());

        let err = ctx
            .exec(CommandSpec::new("git").arg("pull"))
            .await
            .unwrap_err();

        match err {
            DeployError::CommandFailed { command, code, stderr, .. } => {
                assert_eq!(command, "git pull");
                assert_eq!(code, Some(1));
                assert!(stderr.contains("not a git repository"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_exec_unchecked_failure_returns_output() {
        let runner = Arc::new(FakeRunner::new());
        runner.fail("pm2 delete", 1, "[PM2][ERROR] Process or Namespace app not found");
        let ctx = test_context(runner.clone());

        let output = ctx
            .exec(CommandSpec::new("pm2").args(["delete", "app"]).unchecked())
            .await
            .unwrap();

        assert_eq!(output.code, Some(1));
    }

    #[tokio::test]
    async fn test_exec_applies_config_timeout() {
        let runner = Arc::new(FakeRunner::new());
        let mut config = test_config();
        config.host.command_timeout_secs = Some(60);
        let ctx = DeployContext::new(config, runner.clone());

        ctx.exec(CommandSpec::new("npm").arg("ci")).await.unwrap();
        ctx.exec(CommandSpec::new("npm").arg("ci").timeout(Some(Duration::from_secs(5))))
            .await
            .unwrap();

        let specs = runner.specs();
        assert_eq!(specs[0].timeout, Some(Duration::from_secs(60)));
        assert_eq!(specs[1].timeout, Some(Duration::from_secs(5)));
    }
}
