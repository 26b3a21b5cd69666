//! Deployment pipeline
//!
//! Runs the stages strictly in order against one `DeployContext`:
//! system packages, Node.js runtime, global tools, source sync, build,
//! start under PM2, boot-startup registration.
//!
//! A recoverable failure marks its stage as a warning and the run goes on.
//! A fatal failure marks the stage failed, skips everything after it and
//! leaves the report in `PipelineState::Failed`.

pub mod build;
pub mod context;
pub mod global_tools;
pub mod node;
pub mod source;
pub mod supervisor;
pub mod system_packages;

use chrono::{DateTime, Utc};
use std::fmt::Display;
use tracing::{error, info, warn};

use crate::domain::{DeployStage, PipelineState, StageStatus};
use crate::error::{Failure, StepResult};

pub use context::DeployContext;

/// Stage keys and display names, in execution order
const STAGES: [(&str, &str); 7] = [
    ("system_packages", "System Packages"),
    ("node_runtime", "Node.js Runtime"),
    ("global_tools", "Global Tools"),
    ("source_sync", "Source Sync"),
    ("build", "Build"),
    ("start", "Start Application"),
    ("persist", "Startup Registration"),
];

const PACKAGES: usize = 0;
const NODE: usize = 1;
const GLOBAL_TOOLS: usize = 2;
const SOURCE: usize = 3;
const BUILD: usize = 4;
const START: usize = 5;
const PERSIST: usize = 6;

/// Outcome of one pipeline run
#[derive(Clone, Debug)]
pub struct DeployReport {
    pub state: PipelineState,
    pub stages: Vec<DeployStage>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Error of the stage that aborted the run
    pub error: Option<String>,
}

impl DeployReport {
    fn new() -> Self {
        Self {
            state: PipelineState::NotStarted,
            stages: STAGES
                .iter()
                .map(|(name, display_name)| DeployStage::new(name, display_name))
                .collect(),
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Done
    }

    pub fn stage(&self, name: &str) -> Option<&DeployStage> {
        self.stages.iter().find(|s| s.name == name)
    }

    fn begin(&mut self, index: usize) {
        let stage = &mut self.stages[index];
        info!("=== {} ===", stage.display_name);
        stage.start();
    }

    /// Record a stage result; false means the run must stop
    fn end<T: Display>(&mut self, index: usize, result: StepResult<T>) -> bool {
        let stage = &mut self.stages[index];
        match result {
            Ok(summary) => {
                stage.finish(StageStatus::Success, Some(summary.to_string()));
                true
            }
            Err(Failure::Recoverable(e)) => {
                warn!(stage = %stage.name, "{}", e);
                stage.finish(StageStatus::Warning, Some(e.to_string()));
                true
            }
            Err(Failure::Fatal(e)) => {
                error!(stage = %stage.name, "{}", e);
                if let Some((stdout, stderr)) = e.command_output() {
                    if !stdout.trim().is_empty() {
                        error!("STDOUT: {}", stdout.trim_end());
                    }
                    if !stderr.trim().is_empty() {
                        error!("STDERR: {}", stderr.trim_end());
                    }
                }
                let message = e.to_string();
                stage.finish(StageStatus::Failed, Some(message.clone()));
                self.abort(index, message);
                false
            }
        }
    }

    fn abort(&mut self, failed_index: usize, message: String) {
        for stage in self.stages.iter_mut().skip(failed_index + 1) {
            stage.skip(Some("previous stage failed".to_string()));
        }
        self.state = PipelineState::Failed;
        self.error = Some(message);
        self.finished_at = Some(Utc::now());
        self.log_summary();
        error!("Deployment failed");
    }

    /// One line per stage with status and duration
    pub fn log_summary(&self) {
        for stage in &self.stages {
            let duration = stage
                .duration_ms
                .map(|ms| format!("{}ms", ms))
                .unwrap_or_else(|| "-".to_string());
            info!(
                stage = %stage.name,
                status = %stage.status,
                duration = %duration,
                "{}",
                stage.message.as_deref().unwrap_or("")
            );
        }
    }

    fn advance(&mut self) {
        self.state = self.state.next();
        info!(state = %self.state, "Pipeline state advanced");
    }
}

/// Run the whole pipeline
///
/// Never panics on stage failures; the report carries the outcome.
pub async fn execute(ctx: &DeployContext) -> DeployReport {
    let mut report = DeployReport::new();
    info!(
        app = %ctx.config.app.name,
        repository = %ctx.config.repository.url,
        dir = %ctx.config.repository.dir.display(),
        "Starting deployment..."
    );

    // Dependencies
    report.begin(PACKAGES);
    if !report.end(PACKAGES, system_packages::ensure(ctx).await) {
        return report;
    }
    report.begin(NODE);
    if !report.end(NODE, node::ensure(ctx).await) {
        return report;
    }
    report.begin(GLOBAL_TOOLS);
    if !report.end(GLOBAL_TOOLS, global_tools::ensure(ctx).await) {
        return report;
    }
    report.advance();

    report.begin(SOURCE);
    if !report.end(SOURCE, source::sync(ctx).await) {
        return report;
    }
    report.advance();

    report.begin(BUILD);
    if !report.end(BUILD, build::run(ctx).await) {
        return report;
    }
    report.advance();

    report.begin(START);
    if !report.end(START, supervisor::start(ctx).await) {
        return report;
    }
    report.advance();

    report.begin(PERSIST);
    if !report.end(PERSIST, supervisor::persist(ctx).await) {
        return report;
    }
    report.advance();

    report.advance();
    report.finished_at = Some(Utc::now());
    report.log_summary();
    info!("Deployment completed successfully!");
    report
}
