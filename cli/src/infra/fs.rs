//! Filesystem infrastructure: implements `SourceReader`, `ArtifactWriter`
//! and `FileHasher`.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::application::ports::{ArtifactWriter, FileHasher, SourceReader};

/// Production filesystem implementation of the artifact ports.
pub struct LocalFs;

impl SourceReader for LocalFs {
    fn read_source(&self, path: &Path) -> std::io::Result<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl ArtifactWriter for LocalFs {
    fn stage_bundle(&self, path: &Path, bytes: &[u8]) -> Result<PathBuf> {
        stage(path, bytes)
    }

    fn stage_key(&self, path: &Path, key: &str) -> Result<PathBuf> {
        stage(path, format!("{key}\n").as_bytes())
    }

    fn promote(&self, staged: &Path, path: &Path) -> Result<()> {
        std::fs::rename(staged, path)
            .with_context(|| format!("moving {} to {}", staged.display(), path.display()))
    }

    fn remove(&self, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing file {}", path.display())),
        }
    }
}

impl FileHasher for LocalFs {
    fn sha256_file(&self, path: &Path) -> Result<String> {
        sha256_file(path)
    }
}

/// Compute the SHA256 hex digest of a file.
///
/// Reads the file in 64 KB chunks to avoid loading large files into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// `~/.swarm`, home of the config file, the vault and default deployments.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn swarm_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))
        .map(|h| h.join(".swarm"))
}

/// Restricts `path` to owner read/write. No-op off Unix.
///
/// # Errors
///
/// Returns an error if permissions cannot be changed.
pub fn set_owner_only(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("setting permissions on {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

fn create_parent(path: &Path) -> Result<PathBuf> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).with_context(|| format!("creating directory {}", dir.display()))?;
    Ok(dir)
}

/// Writes `bytes` to an owner-only temp file in the directory of `path` and
/// keeps it. The temp file is deleted if any step fails.
fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let dir = create_parent(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(&dir)
        .with_context(|| format!("cannot create temp file in {}", dir.display()))?;
    set_owner_only(tmp.path())?;
    tmp.write_all(bytes)
        .with_context(|| format!("writing staged {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("syncing staged {}", path.display()))?;
    tmp.into_temp_path()
        .keep()
        .map_err(|e| e.error)
        .with_context(|| format!("keeping staged {}", path.display()))
}
