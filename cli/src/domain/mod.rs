//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, or `std::process`.
//! All functions are synchronous and take data in, returning data out.
//! Entropy for key material is the only outside input.

pub mod bundle;
pub mod compile;
pub mod config;
pub mod constraint;
pub mod crypto;
pub mod error;
pub mod path;
pub mod tree;
pub mod validate;
pub mod vault;
pub mod workspace;

pub use compile::{Artifacts, CompiledNode, compile};
pub use config::{SwarmConfig, validate_config_key, validate_config_value};
pub use error::{
    CompileError, ConfigError, CryptoError, DeployError, PackagingError, TreeError,
    VaultRejection,
};
pub use path::{ConfigPath, set_nested};
pub use tree::AgentTree;
pub use vault::VaultDocument;
