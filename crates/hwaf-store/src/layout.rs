use crate::StoreError;
use std::fs;
use std::path::{Path, PathBuf};

/// Current registry format version. Incremented on incompatible changes.
pub const PKGDB_FORMAT_VERSION: u32 = 1;

const HWAF_DIR: &str = ".hwaf";

/// Directory layout of an hwaf workspace.
///
/// Tool state lives under `<root>/.hwaf`; packages live under the source root,
/// whose name comes from the local configuration.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn hwaf_dir(&self) -> PathBuf {
        self.root.join(HWAF_DIR)
    }

    #[inline]
    pub fn pkgdb_file(&self) -> PathBuf {
        self.hwaf_dir().join("pkgdb.json")
    }

    #[inline]
    pub fn local_config(&self) -> PathBuf {
        self.hwaf_dir().join("local.conf")
    }

    #[inline]
    pub fn lock_file(&self) -> PathBuf {
        self.hwaf_dir().join(".lock")
    }

    /// Absolute location of a workspace-relative path such as a registry entry's.
    #[inline]
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn is_workspace(&self) -> bool {
        self.hwaf_dir().is_dir()
    }

    /// Create the tool directory and the source root. Idempotent.
    pub fn initialize(&self, source_root: &str) -> Result<(), StoreError> {
        fs::create_dir_all(self.hwaf_dir())?;
        fs::create_dir_all(self.resolve(source_root))?;
        Ok(())
    }
}
