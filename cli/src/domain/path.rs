//! Path-directed nesting into JSON maps.
//!
//! Both compilers place resolved fields at a list of string segments. The
//! setter creates intermediate maps as needed and overwrites any non-map
//! value that sits where a map is required. The last write to a leaf wins.

use std::fmt;

use serde_json::{Map, Value};

/// Leading segment marking the implicit config root.
pub const CONFIG_ROOT: &str = "config";

/// A list of map keys describing where a value nests in an output tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConfigPath(Vec<String>);

impl ConfigPath {
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parses a dotted path such as `config.security.signing`.
    #[must_use]
    pub fn dotted(path: &str) -> Self {
        Self::new(path.split('.').filter(|s| !s.is_empty()))
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops a leading `config` segment. Directive config is nested under
    /// the node's `config` object already.
    #[must_use]
    pub fn strip_config_root(&self) -> Self {
        match self.0.split_first() {
            Some((head, rest)) if head == CONFIG_ROOT => Self(rest.to_vec()),
            _ => self.clone(),
        }
    }

    #[must_use]
    pub fn join(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Writes `value` into `target` at `path`.
///
/// An empty path merges an object `value` key-by-key into `target`; a
/// non-object value at the empty path is ignored because it has no key to
/// live under.
pub fn set_nested(target: &mut Map<String, Value>, path: &ConfigPath, value: Value) {
    let Some((leaf, parents)) = path.segments().split_last() else {
        if let Value::Object(fields) = value {
            for (key, field) in fields {
                target.insert(key, field);
            }
        }
        return;
    };

    let mut cursor = target;
    for segment in parents {
        let slot = cursor
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        cursor = next;
    }
    cursor.insert(leaf.clone(), value);
}

/// Like [`set_nested`], but merges an object `value` into an existing object
/// at `path` instead of replacing it. Later keys overwrite earlier ones.
pub fn merge_nested(target: &mut Map<String, Value>, path: &ConfigPath, value: Value) {
    let Value::Object(fields) = value else {
        set_nested(target, path, value);
        return;
    };
    for (key, field) in fields {
        set_nested(target, &path.join(&key), field);
    }
}
