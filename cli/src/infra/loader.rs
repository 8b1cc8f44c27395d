//! Infrastructure implementation of the `InputLoader` port.
//!
//! `.yaml`/`.yml` files are read as YAML; everything else as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use swarm_common::{Registry, TreeDocument};

use crate::application::ports::InputLoader;

pub struct FileLoader;

impl InputLoader for FileLoader {
    fn load_tree(&self, path: &Path) -> Result<TreeDocument> {
        let tree: TreeDocument = load(path)?;
        tracing::debug!(path = %path.display(), nodes = tree.nodes.len(), "loaded agent tree");
        Ok(tree)
    }

    fn load_registry(&self, path: &Path) -> Result<Registry> {
        let registry: Registry = load(path)?;
        tracing::debug!(path = %path.display(), objects = registry.len(), "loaded registry");
        Ok(registry)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    if is_yaml(path) {
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    } else {
        serde_json::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }
}
