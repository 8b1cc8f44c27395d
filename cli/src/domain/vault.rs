//! Guarded vault document.
//!
//! The vault is a JSON object of named sections. Every change goes through
//! [`VaultDocument::stage`], which validates a whole batch against the
//! current state without touching it, and [`VaultDocument::apply`], which
//! commits a staged batch. Splitting the two lets the caller persist the
//! staged bytes before the in-memory state changes.

use serde_json::{Map, Value};

use crate::domain::error::VaultRejection;

/// Smallest serialized vault the guard accepts after a patch.
pub const DEFAULT_MIN_VAULT_BYTES: usize = 64;

pub const SECTION_WORKSPACE: &str = "workspace";
pub const SECTION_DEPLOYMENTS: &str = "deployments";

/// A validated batch, ready to persist and apply.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedPatch {
    sections: Vec<(String, Value)>,
    serialized: Vec<u8>,
    /// Document generation the batch was validated against.
    generation: u64,
}

impl StagedPatch {
    /// Serialized document as it will look once applied.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.serialized
    }

    #[must_use]
    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|(name, _)| name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VaultDocument {
    sections: Map<String, Value>,
    /// Last known good serialized copy.
    snapshot: Vec<u8>,
    min_bytes: usize,
    /// Bumped on every applied batch.
    generation: u64,
}

impl VaultDocument {
    #[must_use]
    pub fn empty(min_bytes: usize) -> Self {
        Self {
            sections: Map::new(),
            snapshot: b"{}".to_vec(),
            min_bytes,
            generation: 0,
        }
    }

    /// Parses a stored vault. Empty input yields an empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a JSON object.
    pub fn from_bytes(bytes: &[u8], min_bytes: usize) -> Result<Self, serde_json::Error> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::empty(min_bytes));
        }
        let sections: Map<String, Value> = serde_json::from_slice(bytes)?;
        Ok(Self {
            sections,
            snapshot: bytes.to_vec(),
            min_bytes,
            generation: 0,
        })
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    #[must_use]
    pub fn snapshot(&self) -> &[u8] {
        &self.snapshot
    }

    #[must_use]
    pub fn min_bytes(&self) -> usize {
        self.min_bytes
    }

    /// Validates replacing each named section with its value, as one batch.
    ///
    /// # Errors
    ///
    /// Returns the first [`VaultRejection`]; the document is never modified.
    pub fn stage(&self, sections: Vec<(String, Value)>) -> Result<StagedPatch, VaultRejection> {
        if sections.is_empty() {
            return Err(VaultRejection::EmptyBatch);
        }
        if let Some((name, _)) = sections.iter().find(|(_, value)| value.is_null()) {
            return Err(VaultRejection::NullSection(name.clone()));
        }

        let mut candidate = self.sections.clone();
        for (name, value) in &sections {
            candidate.insert(name.clone(), value.clone());
        }
        let serialized = serde_json::to_vec_pretty(&candidate)
            .map_err(|e| VaultRejection::Serialize(e.to_string()))?;
        if serialized.len() < self.min_bytes {
            return Err(VaultRejection::BelowMinimum {
                size: serialized.len(),
                minimum: self.min_bytes,
            });
        }
        Ok(StagedPatch {
            sections,
            serialized,
            generation: self.generation,
        })
    }

    /// Commits a batch produced by [`Self::stage`] and returns the names of
    /// the replaced sections.
    ///
    /// # Errors
    ///
    /// Returns [`VaultRejection::Stale`] if another batch was applied after
    /// this one was staged; the document is not modified.
    pub fn apply(&mut self, staged: StagedPatch) -> Result<Vec<String>, VaultRejection> {
        if staged.generation != self.generation {
            return Err(VaultRejection::Stale {
                staged: staged.generation,
                current: self.generation,
            });
        }
        let mut names = Vec::with_capacity(staged.sections.len());
        for (name, value) in staged.sections {
            self.sections.insert(name.clone(), value);
            names.push(name);
        }
        self.snapshot = staged.serialized;
        self.generation += 1;
        Ok(names)
    }
}
