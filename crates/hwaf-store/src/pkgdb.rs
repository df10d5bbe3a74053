use crate::layout::PKGDB_FORMAT_VERSION;
use crate::{write_atomic, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How a package came into the workspace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    Local,
    Git,
    Svn,
}

impl std::fmt::Display for VcsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VcsKind::Local => write!(f, "local"),
            VcsKind::Git => write!(f, "git"),
            VcsKind::Svn => write!(f, "svn"),
        }
    }
}

impl FromStr for VcsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(VcsKind::Local),
            "git" => Ok(VcsKind::Git),
            "svn" => Ok(VcsKind::Svn),
            other => Err(format!("VCS of type [{other}] is not handled")),
        }
    }
}

/// Provenance record of one package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PkgEntry {
    /// Registry key, derived from `path`.
    pub name: String,
    /// Location relative to the workspace root.
    pub path: String,
    pub vcs: VcsKind,
    /// Remote the package was checked out from; empty for local packages.
    #[serde(default)]
    pub remote: String,
    pub added_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PkgDbFile {
    format_version: u32,
    packages: BTreeMap<String, PkgEntry>,
    /// blake3 over the serialized `packages`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checksum: Option<String>,
}

fn checksum(packages: &BTreeMap<String, PkgEntry>) -> Result<String, StoreError> {
    let json = serde_json::to_string_pretty(packages)?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}

/// Canonical registry key for a workspace-relative package path.
///
/// Separators are normalized to `/`, `.` components and trailing slashes are
/// dropped and `..` is folded. Absolute paths and paths escaping the
/// workspace are rejected.
pub fn pkg_key(path: &str) -> Result<String, StoreError> {
    let invalid = || StoreError::InvalidPackagePath(path.to_owned());
    if path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute() {
        return Err(invalid());
    }
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split(|c: char| c == '/' || c == '\\') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop().ok_or_else(invalid)?;
            }
            p => parts.push(p),
        }
    }
    if parts.is_empty() {
        return Err(invalid());
    }
    Ok(parts.join("/"))
}

/// The package registry of a workspace.
///
/// Every mutation is written through to disk before it returns; if the write
/// fails the in-memory view is restored, so both stay in agreement.
#[derive(Debug)]
pub struct PkgDb {
    file: PathBuf,
    packages: BTreeMap<String, PkgEntry>,
}

impl PkgDb {
    /// Open the registry at `file`, starting empty if it does not exist yet.
    pub fn open(file: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file = file.into();
        if !file.exists() {
            tracing::debug!("no pkgdb at {}, starting empty", file.display());
            return Ok(Self {
                file,
                packages: BTreeMap::new(),
            });
        }
        Self::load(file)
    }

    pub fn load(file: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file = file.into();
        let content = fs::read_to_string(&file)?;
        let on_disk: PkgDbFile = serde_json::from_str(&content)?;

        if on_disk.format_version != PKGDB_FORMAT_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: PKGDB_FORMAT_VERSION,
                found: on_disk.format_version,
            });
        }
        let actual = checksum(&on_disk.packages)?;
        let Some(expected) = on_disk.checksum else {
            return Err(StoreError::IntegrityFailure {
                path: file.display().to_string(),
                expected: "(missing)".to_owned(),
                actual,
            });
        };
        if actual != expected {
            return Err(StoreError::IntegrityFailure {
                path: file.display().to_string(),
                expected,
                actual,
            });
        }

        tracing::debug!(
            "loaded {} packages from {}",
            on_disk.packages.len(),
            file.display()
        );
        Ok(Self {
            file,
            packages: on_disk.packages,
        })
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let on_disk = PkgDbFile {
            format_version: PKGDB_FORMAT_VERSION,
            packages: self.packages.clone(),
            checksum: Some(checksum(&self.packages)?),
        };
        let content = serde_json::to_string_pretty(&on_disk)?;
        write_atomic(&self.file, content.as_bytes())
    }

    #[inline]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Register the package at `path`. Fails if its key is already registered.
    pub fn add(&mut self, vcs: VcsKind, remote: &str, path: &str) -> Result<&PkgEntry, StoreError> {
        let key = pkg_key(path)?;
        if self.packages.contains_key(&key) {
            return Err(StoreError::DuplicatePackage(key));
        }
        let entry = PkgEntry {
            name: key.clone(),
            path: key.clone(),
            vcs,
            remote: remote.to_owned(),
            added_at: chrono::Utc::now().to_rfc3339(),
        };
        self.packages.insert(key.clone(), entry);
        if let Err(e) = self.save() {
            self.packages.remove(&key);
            return Err(e);
        }
        tracing::info!("registered {vcs} package [{key}]");
        self.get_pkg(&key)
    }

    pub fn has_pkg(&self, key: &str) -> bool {
        self.packages.contains_key(key)
    }

    pub fn get_pkg(&self, key: &str) -> Result<&PkgEntry, StoreError> {
        self.packages
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_owned()))
    }

    /// Drop the entry for `key`. The package directory is left alone.
    pub fn remove(&mut self, key: &str) -> Result<PkgEntry, StoreError> {
        let entry = self
            .packages
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(key.to_owned()))?;
        if let Err(e) = self.save() {
            self.packages.insert(key.to_owned(), entry);
            return Err(e);
        }
        tracing::info!("unregistered package [{key}]");
        Ok(entry)
    }

    /// All entries, ordered by key.
    pub fn list(&self) -> impl Iterator<Item = &PkgEntry> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
