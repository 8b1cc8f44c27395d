//! Identifier validation: no I/O.

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::error::DeployError;

/// Deployment-facing agent names. Also used as keys in the `certs` map.
pub static UNIVERSAL_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern: cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,63}$").expect("valid regex")
});

/// Deployment labels end up in file names; checked before any path
/// interpolation to prevent path traversal (CWE-22).
pub static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z0-9]([a-z0-9._-]{0,62}[a-z0-9])?$").expect("valid regex")
});

#[must_use]
pub fn is_valid_universal_id(id: &str) -> bool {
    UNIVERSAL_ID_RE.is_match(id)
}

/// Validates a deployment label.
///
/// # Errors
///
/// Returns [`DeployError::InvalidLabel`] if the label does not match
/// [`LABEL_RE`] or contains `..`.
pub fn validate_label(label: &str) -> Result<(), DeployError> {
    if LABEL_RE.is_match(label) && !label.contains("..") {
        Ok(())
    } else {
        Err(DeployError::InvalidLabel(label.to_string()))
    }
}
