//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, or `std::process`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Tree errors ───────────────────────────────────────────────────────────────

/// Structural problems found while snapshotting the agent tree.
/// Always raised before any constraint is resolved.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Agent tree is empty.")]
    Empty,

    #[error("Agent tree has no root. Exactly one 'matrix' node without a parent is required.")]
    MissingRoot,

    #[error("Agent tree has more than one root: {}", .0.join(", "))]
    MultipleRoots(Vec<String>),

    #[error("Root agent must keep universal_id 'matrix' (found '{0}').")]
    RootRenamed(String),

    #[error("Duplicate graph_id '{0}'.")]
    DuplicateGraphId(String),

    #[error("Duplicate universal_id '{0}': every agent needs a unique deployment name.")]
    DuplicateUniversalId(String),

    #[error(
        "Invalid universal_id '{0}': must match ^[A-Za-z0-9][A-Za-z0-9._-]{{0,63}}$"
    )]
    InvalidUniversalId(String),

    #[error("Parent chain of '{0}' forms a cycle.")]
    Cycle(String),
}

// ── Crypto errors ─────────────────────────────────────────────────────────────

/// Failures inside the crypto material factory or the directive sealer.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("RSA key generation failed: {0}")]
    KeyGeneration(String),

    #[error("key encoding failed: {0}")]
    KeyEncoding(String),

    #[error("certificate construction failed: {0}")]
    Certificate(String),

    #[error("certificate parsing failed: {0}")]
    CertificateParse(String),

    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed: bundle is corrupt or the key is wrong")]
    Decrypt,

    #[error("invalid {field}: {reason}")]
    Malformed { field: &'static str, reason: String },
}

// ── Compile errors ────────────────────────────────────────────────────────────

/// Fatal outcomes of one compile. Any of these means no artifact was produced.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Agent '{agent}': constraint '{class}' is unresolvable ({reason}).")]
    ConstraintUnresolvable {
        agent: String,
        class: String,
        reason: String,
    },

    #[error("Agent '{agent}': constraint '{class}' references registry object '{serial}' which {reason}.")]
    RegistryValidationFailed {
        agent: String,
        class: String,
        serial: String,
        reason: String,
    },

    #[error("Agent '{agent}': generating material for '{class}' failed: {source}")]
    CryptoGenerationFailure {
        agent: String,
        class: String,
        #[source]
        source: CryptoError,
    },
}

impl CompileError {
    /// Failing agent and constraint class, for operator-facing reports.
    #[must_use]
    pub fn agent_and_class(&self) -> Option<(&str, &str)> {
        match self {
            Self::Tree(_) => None,
            Self::ConstraintUnresolvable { agent, class, .. }
            | Self::RegistryValidationFailed { agent, class, .. }
            | Self::CryptoGenerationFailure { agent, class, .. } => Some((agent, class)),
        }
    }
}

// ── Packaging errors ──────────────────────────────────────────────────────────

/// Failures while embedding sources or sealing the directive.
#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("Source embedding or hash stamping requires a source root directory.")]
    SourceRootRequired,

    #[error("Agent '{agent}': agent type '{name}' cannot be used in a source path")]
    InvalidAgentName { agent: String, name: String },

    #[error("Agent '{agent}': source file not found at {path}")]
    MissingSource { agent: String, path: String },

    #[error("Agent '{agent}': reading {path} failed: {source}")]
    Io {
        agent: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directive serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Sealing directive failed: {0}")]
    Seal(#[from] CryptoError),
}

// ── Vault errors ──────────────────────────────────────────────────────────────

/// Reasons the vault guard refuses a patch. Surfaced to callers as `false`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VaultRejection {
    #[error("refusing to replace section '{0}' with null")]
    NullSection(String),

    #[error("patch would shrink the vault to {size} bytes (minimum {minimum})")]
    BelowMinimum { size: usize, minimum: usize },

    #[error("empty batch")]
    EmptyBatch,

    #[error("batch was staged against generation {staged}, document is at {current}")]
    Stale { staged: u64, current: u64 },

    #[error("vault document is not serializable: {0}")]
    Serialize(String),
}

// ── Deploy errors ─────────────────────────────────────────────────────────────

/// Operator-facing deploy refusals that happen before compilation.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Invalid deployment label '{0}': must match ^[a-z0-9]([a-z0-9._-]{{0,62}}[a-z0-9])?$")]
    InvalidLabel(String),

    #[error("Deployment '{0}' already exists. Re-run with --force to replace it.")]
    AlreadyExists(String),

    #[error("Deployment '{0}' not found.")]
    NotFound(String),

    #[error("Vault refused the deployment record for '{0}'; no artifacts were kept.")]
    VaultRejected(String),

    #[error("Invalid workspace ID in vault: {0}")]
    InvalidWorkspaceId(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
