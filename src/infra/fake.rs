//! Scripted `CommandRunner` for tests
//!
//! Records every command, answers PATH lookups from a fixed tool set and
//! replies with programmed outputs (default: exit 0, empty streams).

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::domain::{CommandOutput, CommandSpec};
use crate::error::DeployError;
use crate::infra::CommandRunner;

#[derive(Default)]
pub struct FakeRunner {
    tools: Mutex<HashSet<String>>,
    replies: Mutex<Vec<(String, CommandOutput)>>,
    provides: Mutex<Vec<(String, String)>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner whose PATH already holds `tools`
    pub fn with_tools(tools: &[&str]) -> Self {
        let runner = Self::new();
        for tool in tools {
            runner.install(tool);
        }
        runner
    }

    pub fn install(&self, tool: &str) {
        self.tools.lock().unwrap().insert(tool.to_string());
    }

    /// Reply with `output` to commands whose display line starts with `prefix`
    ///
    /// Earlier registrations win.
    pub fn reply(&self, prefix: &str, output: CommandOutput) {
        self.replies.lock().unwrap().push((prefix.to_string(), output));
    }

    pub fn fail(&self, prefix: &str, code: i32, stderr: &str) {
        self.reply(
            prefix,
            CommandOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        );
    }

    /// Put `tool` on PATH once a command starting with `prefix` succeeds
    pub fn provides(&self, prefix: &str, tool: &str) {
        self.provides
            .lock()
            .unwrap()
            .push((prefix.to_string(), tool.to_string()));
    }

    /// Display lines of every command run so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(CommandSpec::display).collect()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Index of the first call starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, DeployError> {
        self.calls.lock().unwrap().push(spec.clone());
        let line = spec.display();
        let reply = self
            .replies
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone());

        let output = reply.unwrap_or(CommandOutput {
            code: Some(0),
            ..Default::default()
        });

        if output.success() {
            let provided: Vec<String> = self
                .provides
                .lock()
                .unwrap()
                .iter()
                .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
                .map(|(_, tool)| tool.clone())
                .collect();
            for tool in provided {
                self.install(&tool);
            }
        }

        Ok(output)
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.tools
            .lock()
            .unwrap()
            .contains(program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }
}
