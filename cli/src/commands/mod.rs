//! Command implementations

pub mod config;
pub mod decrypt;
pub mod deploy;
pub mod deployments;
pub mod validate;
pub mod version;
