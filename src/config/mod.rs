//! Configuration
//!
//! TOML deployment config and host environment lookups

pub mod deploy;
pub mod env;

pub use deploy::{AppConfig, DeployConfig, HostConfig, NodeConfig, RepositoryConfig};
