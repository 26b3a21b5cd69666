//! Source sync stage
//!
//! Empty (or new) target directory: full clone. Anything else: fast-forward
//! pull in place. A non-empty directory that is not a git work tree fails at
//! the pull.

use std::path::Path;
use tracing::info;

use crate::domain::CommandSpec;
use crate::error::{DeployError, StepResult};

use super::context::DeployContext;

/// What the sync did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Pulled,
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncAction::Cloned => f.write_str("cloned"),
            SyncAction::Pulled => f.write_str("pulled"),
        }
    }
}

async fn is_empty_dir(dir: &Path) -> Result<bool, DeployError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    Ok(entries.next_entry().await?.is_none())
}

pub async fn sync(ctx: &DeployContext) -> StepResult<SyncAction> {
    let repo = &ctx.config.repository;
    let dir = repo.dir.as_path();

    if !dir.exists() {
        info!("Creating project directory {}", dir.display());
    }
    tokio::fs::create_dir_all(dir).await.map_err(DeployError::from)?;

    if is_empty_dir(dir).await? {
        info!("Cloning repository from {} to {}...", repo.url, dir.display());
        let mut clone = CommandSpec::new("git").arg("clone");
        if let Some(ref branch) = repo.branch {
            clone = clone.args(["--branch", branch.as_str()]);
        }
        ctx.exec(
            clone
                .arg("--")
                .arg(repo.url.as_str())
                .arg(dir.to_string_lossy()),
        )
        .await?;
        info!("Repository cloned successfully");
        Ok(SyncAction::Cloned)
    } else {
        info!("Updating repository in {}...", dir.display());
        let mut pull = CommandSpec::new("git").args(["pull", "--ff-only"]);
        if let Some(ref branch) = repo.branch {
            pull = pull.args(["origin", branch.as_str()]);
        }
        ctx.exec(pull.current_dir(dir)).await?;
        info!("Repository updated successfully");
        Ok(SyncAction::Pulled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Failure;
    use crate::infra::FakeRunner;
    use crate::services::deploy::context::tests::test_config;
    use std::sync::Arc;

    fn context_for(runner: Arc<FakeRunner>, dir: &Path, branch: Option<&str>) -> DeployContext {
        let mut config = test_config();
        config.repository.dir = dir.to_path_buf();
        config.repository.branch = branch.map(str::to_string);
        DeployContext::new(config, runner)
    }

    #[tokio::test]
    async fn test_missing_dir_is_created_and_cloned() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("opt").join("app");
        let runner = Arc::new(FakeRunner::new());
        let ctx = context_for(runner.clone(), &dir, None);

        let action = sync(&ctx).await.unwrap();

        assert_eq!(action, SyncAction::Cloned);
        assert!(dir.is_dir());
        assert_eq!(runner.calls(), vec![format!("git clone -- R {}", dir.display())]);
    }

    #[tokio::test]
    async fn test_clone_with_branch() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());
        let ctx = context_for(runner.clone(), tmp.path(), Some("main"));

        sync(&ctx).await.unwrap();

        assert_eq!(
            runner.calls(),
            vec![format!("git clone --branch main -- R {}", tmp.path().display())]
        );
    }

    #[tokio::test]
    async fn test_dash_url_stays_positional() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());
        let mut config = test_config();
        config.repository.dir = tmp.path().to_path_buf();
        config.repository.url = "--upload-pack=touch /tmp/pwned".to_string();
        let ctx = DeployContext::new(config, runner.clone());

        sync(&ctx).await.unwrap();

        let args = &runner.specs()[0].args;
        let separator = args.iter().position(|a| a == "--").unwrap();
        assert_eq!(args[separator + 1], "--upload-pack=touch /tmp/pwned");
        assert!(args[..separator].iter().all(|a| !a.starts_with("--upload-pack")));
    }

    #[tokio::test]
    async fn test_existing_checkout_is_pulled_not_recloned() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        let runner = Arc::new(FakeRunner::new());
        let ctx = context_for(runner.clone(), tmp.path(), Some("main"));

        let action = sync(&ctx).await.unwrap();

        assert_eq!(action, SyncAction::Pulled);
        assert_eq!(runner.calls(), vec!["git pull --ff-only origin main"]);
        assert_eq!(runner.specs()[0].cwd.as_deref(), Some(tmp.path()));
        assert!(runner.position("git clone").is_none());
    }

    #[tokio::test]
    async fn test_pull_in_non_repository_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("index.html"), "<html/>").unwrap();
        let runner = Arc::new(FakeRunner::new());
        runner.fail("git pull", 128, "fatal: not a git repository");
        let ctx = context_for(runner.clone(), tmp.path(), None);

        let failure = sync(&ctx).await.unwrap_err();

        assert!(matches!(
            failure,
            Failure::Fatal(DeployError::CommandFailed { code: Some(128), .. })
        ));
        assert!(runner.position("git clone").is_none());
    }
}
