//! Application service: directive packaging.
//!
//! Optional source embedding and hash stamping, canonical serialization and
//! AES-GCM sealing. Nothing is written to disk here; a failure leaves no
//! partial bundle behind.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};

use crate::application::ports::SourceReader;
use crate::domain::bundle::{SealedDirective, seal, sha256_hex};
use crate::domain::compile::directive::DIRECTIVE_ROOT_KEY;
use crate::domain::compile::{CompiledNode, DirectiveArtifact};
use crate::domain::error::PackagingError;
use crate::domain::validate::is_valid_universal_id;

#[derive(Debug, Clone, Copy)]
pub struct PackageOptions<'a> {
    pub embed_sources: bool,
    pub stamp_hash: bool,
    pub source_root: Option<&'a Path>,
    /// Relative source path; `{name}` is replaced with the agent type.
    pub source_template: &'a str,
}

#[derive(Debug, Clone)]
pub struct PackagedDirective {
    pub sealed: SealedDirective,
    pub plaintext_len: usize,
    pub embedded: usize,
    pub stamped: usize,
}

/// Canonical plaintext: `{"agent_tree": ...}` with sorted keys.
///
/// # Errors
///
/// Returns [`PackagingError::Serialize`] if the tree cannot be serialized.
pub fn directive_plaintext(tree: &CompiledNode) -> Result<Vec<u8>, PackagingError> {
    let mut root = Map::new();
    root.insert(DIRECTIVE_ROOT_KEY.to_string(), serde_json::to_value(tree)?);
    Ok(serde_json::to_vec(&Value::Object(root))?)
}

/// Packages `directive` into a sealed bundle.
///
/// # Errors
///
/// Returns a [`PackagingError`] when a source root is needed but missing, an
/// agent source file is missing or unreadable, or sealing fails.
pub fn package(
    directive: &DirectiveArtifact,
    options: &PackageOptions<'_>,
    sources: &impl SourceReader,
) -> Result<PackagedDirective, PackagingError> {
    let mut tree = directive.tree.clone();
    let mut embedded = 0;
    let mut stamped = 0;

    if options.embed_sources || options.stamp_hash {
        let root = options.source_root.ok_or(PackagingError::SourceRootRequired)?;
        tree.try_walk_mut(&mut |node| {
            let path = source_path(root, options.source_template, node)?;
            let bytes = sources
                .read_source(&path)
                .map_err(|source| PackagingError::Io {
                    agent: node.universal_id.clone(),
                    path: path.display().to_string(),
                    source,
                })?
                .ok_or_else(|| PackagingError::MissingSource {
                    agent: node.universal_id.clone(),
                    path: path.display().to_string(),
                })?;
            if options.embed_sources {
                node.source_embed = Some(STANDARD.encode(&bytes));
                embedded += 1;
            }
            if options.stamp_hash {
                node.source_sha256 = Some(sha256_hex(&bytes));
                stamped += 1;
            }
            Ok::<(), PackagingError>(())
        })?;
    }

    let plaintext = directive_plaintext(&tree)?;
    let sealed = seal(&plaintext)?;
    tracing::info!(
        bytes = plaintext.len(),
        embedded,
        stamped,
        directive_hash = %sealed.directive_hash,
        "directive sealed"
    );
    Ok(PackagedDirective {
        sealed,
        plaintext_len: plaintext.len(),
        embedded,
        stamped,
    })
}

fn source_path(root: &Path, template: &str, node: &CompiledNode) -> Result<PathBuf, PackagingError> {
    if !is_valid_universal_id(&node.name) || node.name.contains("..") {
        return Err(PackagingError::InvalidAgentName {
            agent: node.universal_id.clone(),
            name: node.name.clone(),
        });
    }
    Ok(root.join(template.replace("{name}", &node.name)))
}
