//! Workspace layout, local configuration and the package registry for hwaf.
//!
//! This crate provides the persistence layer: `WorkspaceLayout` for the
//! directory structure of a workspace, `WorkspaceConfig` for the TOML local
//! configuration, and `PkgDb`, the registry recording every package of the
//! workspace and how it was obtained. All writes go through a temp file and an
//! atomic rename.

pub mod config;
pub mod layout;
pub mod pkgdb;

pub use config::{HwafCfg, WorkspaceConfig, DEFAULT_SOURCE_ROOT};
pub use layout::{WorkspaceLayout, PKGDB_FORMAT_VERSION};
pub use pkgdb::{pkg_key, PkgDb, PkgEntry, VcsKind};

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Fsync a directory to ensure that a preceding `rename()` is durable.
///
/// POSIX does not guarantee a rename survives a crash until the parent
/// directory itself has been synced.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

/// Replace `dest` with `content` through a synced temp file in the same directory.
pub(crate) fn write_atomic(dest: &Path, content: &[u8]) -> Result<(), StoreError> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| StoreError::Io(e.error))?;
    fsync_dir(dir)?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid local configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("failed to write local configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
    #[error("a package with name [{0}] already exists")]
    DuplicatePackage(String),
    #[error("no such package [{0}] in db")]
    NotFound(String),
    #[error("integrity check failed for '{path}': expected {expected}, got {actual}")]
    IntegrityFailure {
        path: String,
        expected: String,
        actual: String,
    },
    #[error("pkgdb format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("invalid package path: {0}")]
    InvalidPackagePath(String),
}
