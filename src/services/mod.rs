//! Service layer
//!
//! Deployment stages and the pipeline that drives them

pub mod deploy;
