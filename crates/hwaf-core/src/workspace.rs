use crate::cleanup::remove_pkg_dir;
use crate::concurrency::WorkspaceLock;
use crate::vcs::VcsClient;
use crate::CoreError;
use hwaf_schema::{parse_hscript_file, Configuration, Environment, HSCRIPT_FILE};
use hwaf_store::{pkg_key, PkgDb, PkgEntry, StoreError, VcsKind, WorkspaceConfig, WorkspaceLayout};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// An opened hwaf workspace.
///
/// Holds the exclusive workspace lock for as long as it lives, so every
/// registry and package-directory mutation made through it is serialized
/// against other invocations.
pub struct Workspace {
    layout: WorkspaceLayout,
    config: WorkspaceConfig,
    pkgdb: PkgDb,
    _lock: WorkspaceLock,
}

/// Outcome of removing several packages in one go.
#[derive(Debug, Default)]
pub struct RemoveReport {
    pub removed: Vec<PkgEntry>,
    /// Failures, keyed by the name as it was given.
    pub errors: Vec<(String, CoreError)>,
}

impl RemoveReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first_error(&self) -> Option<&CoreError> {
        self.errors.first().map(|(_, e)| e)
    }
}

impl Workspace {
    /// Create the workspace layout at `root` (if needed) and open it.
    ///
    /// An existing `local.conf` or registry is kept as is.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let layout = WorkspaceLayout::new(root);
        let config = WorkspaceConfig::load(&layout.local_config())?;
        layout.initialize(config.source_root())?;
        if !layout.local_config().exists() {
            config.save(&layout.local_config())?;
        }

        let lock = WorkspaceLock::acquire(&layout.lock_file())?;
        let pkgdb = PkgDb::open(layout.pkgdb_file())?;
        if !layout.pkgdb_file().exists() {
            pkgdb.save()?;
        }
        info!("initialized workspace at {}", layout.root().display());

        Ok(Self {
            layout,
            config,
            pkgdb,
            _lock: lock,
        })
    }

    /// Open an existing workspace, blocking until its lock is free.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let layout = WorkspaceLayout::new(root);
        if !layout.is_workspace() {
            return Err(CoreError::NotAWorkspace(
                layout.root().display().to_string(),
            ));
        }
        let lock = WorkspaceLock::acquire(&layout.lock_file())?;
        let config = WorkspaceConfig::load(&layout.local_config())?;
        let pkgdb = PkgDb::open(layout.pkgdb_file())?;
        debug!(
            "opened workspace {} ({} packages)",
            layout.root().display(),
            pkgdb.len()
        );

        Ok(Self {
            layout,
            config,
            pkgdb,
            _lock: lock,
        })
    }

    #[inline]
    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    #[inline]
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    #[inline]
    pub fn pkgdb(&self) -> &PkgDb {
        &self.pkgdb
    }

    #[inline]
    pub fn source_root(&self) -> &str {
        self.config.source_root()
    }

    pub fn source_dir(&self) -> PathBuf {
        self.layout.resolve(self.source_root())
    }

    /// Map a user-supplied package name to its registry key.
    ///
    /// `${VAR}` references are expanded from the process environment and the
    /// path is cleaned; an absolute path inside the workspace is made
    /// relative. The name is tried as is, then under the source root. Any
    /// name that does not lead to a registered package is `NotFound`.
    pub fn resolve_pkg(&self, name: &str) -> Result<String, CoreError> {
        let not_found = || CoreError::NotFound(name.to_owned());
        let expanded = Environment::from_process().expand(name);
        let relative = self.strip_root(Path::new(&expanded))?;
        let key = pkg_key(&relative).map_err(|_| not_found())?;
        if self.pkgdb.has_pkg(&key) {
            return Ok(key);
        }
        let under_src =
            pkg_key(&format!("{}/{key}", self.source_root())).map_err(|_| not_found())?;
        if self.pkgdb.has_pkg(&under_src) {
            return Ok(under_src);
        }
        Err(not_found())
    }

    /// `path` relative to the workspace root when it lies inside it.
    fn strip_root(&self, path: &Path) -> Result<String, CoreError> {
        if !path.is_absolute() {
            return Ok(path.to_string_lossy().into_owned());
        }
        let root = self.layout.root();
        let absolute_root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        let mut candidates = vec![absolute_root];
        if let Ok(canonical) = fs::canonicalize(root) {
            candidates.push(canonical);
        }
        Ok(candidates
            .iter()
            .find_map(|r| path.strip_prefix(r).ok())
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned())
    }

    pub fn get_pkg(&self, name: &str) -> Result<&PkgEntry, CoreError> {
        let key = self.resolve_pkg(name)?;
        Ok(self.pkgdb.get_pkg(&key)?)
    }

    /// Location of a package's hscript document.
    pub fn hscript_path(&self, name: &str) -> Result<PathBuf, CoreError> {
        let entry = self.get_pkg(name)?;
        Ok(self.layout.resolve(&entry.path).join(HSCRIPT_FILE))
    }

    /// Parse and validate the hscript of a registered package.
    pub fn load_hscript(&self, name: &str) -> Result<Configuration, CoreError> {
        let path = self.hscript_path(name)?;
        debug!("loading {}", path.display());
        Ok(parse_hscript_file(&path)?)
    }

    /// Registry key for a package path given relative to the source root.
    fn pkg_key_in_source(&self, path: &str) -> Result<String, CoreError> {
        let full_name = pkg_key(path)?;
        Ok(pkg_key(&format!("{}/{full_name}", self.source_root()))?)
    }

    /// Create a new local package under the source root and register it.
    ///
    /// `path` is relative to the source root, e.g. `MyPath/MyPackage`.
    pub fn create_pkg(&mut self, path: &str) -> Result<&PkgEntry, CoreError> {
        let full_name = pkg_key(path)?;
        let key = self.pkg_key_in_source(path)?;
        let dir = self.layout.resolve(&key);
        if dir.exists() {
            return Err(CoreError::PackageDirExists(key));
        }
        if self.pkgdb.has_pkg(&key) {
            return Err(StoreError::DuplicatePackage(key).into());
        }

        let name = full_name.rsplit('/').next().unwrap_or(&full_name).to_owned();
        if let Err(e) = write_pkg_skeleton(&dir, &full_name, &name) {
            self.discard_partial(&dir);
            return Err(e.into());
        }
        if let Err(e) = self.pkgdb.add(VcsKind::Local, "", &key).map(|_| ()) {
            self.discard_partial(&dir);
            return Err(e.into());
        }
        info!("created package [{full_name}] in {}", dir.display());
        Ok(self.pkgdb.get_pkg(&key)?)
    }

    /// Check a package out of version control and register it.
    ///
    /// Without an explicit `path`, the last component of the remote is used
    /// (minus a `.git` suffix or a trailing `trunk`).
    pub fn checkout_pkg(
        &mut self,
        client: &dyn VcsClient,
        vcs: VcsKind,
        remote: &str,
        path: Option<&str>,
    ) -> Result<&PkgEntry, CoreError> {
        if vcs == VcsKind::Local {
            return Err(CoreError::UnsupportedVcs(vcs));
        }
        let path = match path {
            Some(p) => p.to_owned(),
            None => default_checkout_path(remote)?,
        };
        let key = self.pkg_key_in_source(&path)?;
        if self.pkgdb.has_pkg(&key) {
            return Err(StoreError::DuplicatePackage(key).into());
        }
        let dir = self.layout.resolve(&key);
        if dir.exists() {
            return Err(CoreError::PackageDirExists(key));
        }
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent)?;
        }

        info!("checking out {vcs} package [{remote}] into {key}");
        if let Err(e) = client.checkout(vcs, remote, &dir) {
            self.discard_partial(&dir);
            return Err(e);
        }
        if let Err(e) = self.pkgdb.add(vcs, remote, &key).map(|_| ()) {
            self.discard_partial(&dir);
            return Err(e.into());
        }
        Ok(self.pkgdb.get_pkg(&key)?)
    }

    fn discard_partial(&self, dir: &Path) {
        if !dir.exists() {
            return;
        }
        if let Err(e) = remove_pkg_dir(dir, &self.source_dir(), self.layout.root()) {
            warn!("could not clean up {}: {e}", dir.display());
        }
    }

    /// Remove a package from disk and from the registry.
    ///
    /// A package whose directory is already gone is an error unless `force`
    /// is set. With `force`, failures while deleting the directory or the
    /// registry entry are logged and the removal carries on.
    pub fn remove_pkg(&mut self, name: &str, force: bool) -> Result<PkgEntry, CoreError> {
        let key = self.resolve_pkg(name)?;
        let entry = self.pkgdb.get_pkg(&key)?.clone();
        let dir = self.layout.resolve(&entry.path);

        if !dir.exists() {
            if !force {
                return Err(CoreError::AlreadyDeletedOnDisk { name: key });
            }
            warn!("package [{key}] is not on disk, dropping registry entry");
        } else if let Err(e) = remove_pkg_dir(&dir, &self.source_dir(), self.layout.root()) {
            if !force {
                return Err(e.into());
            }
            warn!("could not remove {}: {e}", dir.display());
        }

        match self.pkgdb.remove(&key) {
            Ok(removed) => {
                info!("removed package [{key}]");
                Ok(removed)
            }
            Err(e) if force => {
                warn!("could not unregister [{key}]: {e}");
                Ok(entry)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove each named package independently. Nothing is rolled back.
    pub fn remove_pkgs<S: AsRef<str>>(&mut self, names: &[S], force: bool) -> RemoveReport {
        let mut report = RemoveReport::default();
        for name in names {
            let name = name.as_ref();
            match self.remove_pkg(name, force) {
                Ok(entry) => report.removed.push(entry),
                Err(e) => report.errors.push((name.to_owned(), e)),
            }
        }
        report
    }
}

fn write_pkg_skeleton(dir: &Path, full_name: &str, name: &str) -> std::io::Result<()> {
    fs::create_dir_all(dir.join(name))?;
    fs::create_dir_all(dir.join("src"))?;
    fs::write(dir.join(HSCRIPT_FILE), hscript_template(full_name, name))
}

fn hscript_template(full_name: &str, name: &str) -> String {
    format!(
        r#"# -*- yaml -*-
# automatically generated hscript

package: {{
  name: "{full_name}",
  authors: [],
  deps: {{
    # e.g.:
    # AtlasPolicy: {{}},
  }},
}}

options: {{}}

configure: {{
  tools: [],
  env: [],
}}

build: {{
  # e.g.:
  # {name}: {{
  #   features: "cxx cxxshlib",
  #   source: "src/*.cxx",
  #   target: "{name}",
  # }},
}}
"#
    )
}

fn default_checkout_path(remote: &str) -> Result<String, CoreError> {
    let name = remote
        .trim_end_matches('/')
        .rsplit(|c: char| c == '/' || c == ':')
        .find(|part| !part.is_empty() && *part != "trunk")
        .map(|part| part.trim_end_matches(".git"))
        .unwrap_or_default();
    if name.is_empty() {
        return Err(StoreError::InvalidPackagePath(remote.to_owned()).into());
    }
    Ok(name.to_owned())
}
