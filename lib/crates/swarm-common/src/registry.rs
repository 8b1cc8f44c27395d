// lib/crates/swarm-common/src/registry.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read-only snapshot of operator-assigned resources:
/// `namespace (= constraint class) → serial → object`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    namespaces: BTreeMap<String, BTreeMap<String, RegistryObject>>,
}

/// An opaque registry resource. Only its fields and optional output path
/// matter to the compiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Where the fields nest in the output config tree. Handler default
    /// applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

impl Registry {
    #[must_use]
    pub fn get(&self, namespace: &str, serial: &str) -> Option<&RegistryObject> {
        self.namespaces.get(namespace)?.get(serial)
    }

    pub fn insert(
        &mut self,
        namespace: impl Into<String>,
        serial: impl Into<String>,
        object: RegistryObject,
    ) {
        self.namespaces
            .entry(namespace.into())
            .or_default()
            .insert(serial.into(), object);
    }

    /// Total number of objects across all namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RegistryObject {
    /// Builds an object from a JSON map of fields.
    #[must_use]
    pub fn with_fields(fields: Map<String, Value>) -> Self {
        Self {
            label: None,
            fields,
            path: None,
        }
    }
}
