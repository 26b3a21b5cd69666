//! Domain model
//!
//! Plain data, no process or filesystem access

pub mod command;
pub mod deploy;

pub use command::{CommandOutput, CommandSpec};
pub use deploy::{DeployStage, PipelineState, StageStatus};
