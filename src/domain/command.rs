//! External command descriptor and captured result

use std::path::{Path, PathBuf};
use std::time::Duration;

/// A program invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// Treat a non-zero exit as an error
    pub check: bool,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            check: true,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Keep the output of a failing command instead of raising
    pub fn unchecked(mut self) -> Self {
        self.check = false;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a command string through `sh -c`
    pub fn shell(script: &str) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    /// Program and arguments joined for logs
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Both streams, for matching on tool messages
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_to_checked() {
        let spec = CommandSpec::new("git").args(["pull", "--ff-only"]).current_dir("/opt/app");
        assert!(spec.check);
        assert_eq!(spec.display(), "git pull --ff-only");
        assert_eq!(spec.cwd.as_deref(), Some(Path::new("/opt/app")));
        assert!(!spec.unchecked().check);
    }

    #[test]
    fn test_shell_wraps_script() {
        let spec = CommandSpec::shell("npm run build");
        assert_eq!(spec.program, "sh");
        assert_eq!(spec.args, vec!["-c", "npm run build"]);
    }

    #[test]
    fn test_output_success() {
        let ok = CommandOutput { code: Some(0), ..Default::default() };
        let failed = CommandOutput { code: Some(1), ..Default::default() };
        let killed = CommandOutput::default();
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }
}
