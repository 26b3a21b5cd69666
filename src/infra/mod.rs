//! Infrastructure
//!
//! Wraps host access (process execution, PATH lookup)

pub mod command;
#[cfg(test)]
pub mod fake;

pub use command::{find_executable, CommandRunner, SystemRunner};
#[cfg(test)]
pub use fake::FakeRunner;
