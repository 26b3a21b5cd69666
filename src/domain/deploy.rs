//! Deployment domain model

use chrono::{DateTime, Utc};

/// Pipeline progress for a single run
///
/// Moves strictly forward; any fatal failure jumps to `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    DependenciesResolved,
    SourceSynced,
    Built,
    Running,
    Persisted,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::NotStarted => "NOT_STARTED",
            PipelineState::DependenciesResolved => "DEPENDENCIES_RESOLVED",
            PipelineState::SourceSynced => "SOURCE_SYNCED",
            PipelineState::Built => "BUILT",
            PipelineState::Running => "RUNNING",
            PipelineState::Persisted => "PERSISTED",
            PipelineState::Done => "DONE",
            PipelineState::Failed => "FAILED",
        }
    }

    /// Next state on success; terminal states stay put
    pub fn next(&self) -> Self {
        match self {
            PipelineState::NotStarted => PipelineState::DependenciesResolved,
            PipelineState::DependenciesResolved => PipelineState::SourceSynced,
            PipelineState::SourceSynced => PipelineState::Built,
            PipelineState::Built => PipelineState::Running,
            PipelineState::Running => PipelineState::Persisted,
            PipelineState::Persisted => PipelineState::Done,
            PipelineState::Done => PipelineState::Done,
            PipelineState::Failed => PipelineState::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageStatus {
    Pending,
    Running,
    Success,
    /// Finished with a recoverable failure
    Warning,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Success => "success",
            StageStatus::Warning => "warning",
            StageStatus::Failed => "failed",
            StageStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one pipeline stage
#[derive(Clone, Debug)]
pub struct DeployStage {
    /// Stage key (e.g. "source_sync", "build")
    pub name: String,
    /// Display name (e.g. "Source Sync")
    pub display_name: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Duration in milliseconds
    pub duration_ms: Option<i64>,
    pub status: StageStatus,
    pub message: Option<String>,
}

impl DeployStage {
    /// Create a pending stage
    pub fn new(name: &str, display_name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            started_at: None,
            finished_at: None,
            duration_ms: None,
            status: StageStatus::Pending,
            message: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Utc::now());
        self.status = StageStatus::Running;
    }

    /// Finish the stage with the given status
    pub fn finish(&mut self, status: StageStatus, message: Option<String>) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.status = status;
        self.message = message;
        if let Some(started) = self.started_at {
            self.duration_ms = Some((now - started).num_milliseconds());
        }
    }

    pub fn skip(&mut self, reason: Option<String>) {
        self.status = StageStatus::Skipped;
        self.message = reason;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_state_order() {
        let mut state = PipelineState::NotStarted;
        let mut seen = vec![state];
        while !state.is_terminal() {
            state = state.next();
            seen.push(state);
        }
        assert_eq!(
            seen,
            vec![
                PipelineState::NotStarted,
                PipelineState::DependenciesResolved,
                PipelineState::SourceSynced,
                PipelineState::Built,
                PipelineState::Running,
                PipelineState::Persisted,
                PipelineState::Done,
            ]
        );
    }

    #[test]
    fn test_failed_is_terminal() {
        assert!(PipelineState::Failed.is_terminal());
        assert_eq!(PipelineState::Failed.next(), PipelineState::Failed);
        assert_eq!(PipelineState::SourceSynced.to_string(), "SOURCE_SYNCED");
    }

    #[test]
    fn test_deploy_stage_lifecycle() {
        let mut stage = DeployStage::new("build", "Build");
        assert_eq!(stage.status, StageStatus::Pending);

        stage.start();
        assert_eq!(stage.status, StageStatus::Running);
        assert!(stage.started_at.is_some());

        stage.finish(StageStatus::Warning, Some("pm2 not installed".to_string()));
        assert_eq!(stage.status, StageStatus::Warning);
        assert!(stage.finished_at.is_some());
        assert!(stage.duration_ms.is_some());
    }

    #[test]
    fn test_stage_status_labels() {
        assert_eq!(StageStatus::Warning.to_string(), "warning");
        assert_eq!(StageStatus::Skipped.as_str(), "skipped");
    }
}
