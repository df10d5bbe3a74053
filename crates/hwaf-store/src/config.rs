use crate::{write_atomic, StoreError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source root used when the local configuration does not name one.
pub const DEFAULT_SOURCE_ROOT: &str = "src";

/// Workspace-local configuration, stored as TOML in `.hwaf/local.conf`.
///
/// ```toml
/// [hwaf-cfg]
/// cmtpkgs = "src"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(rename = "hwaf-cfg", default)]
    pub hwaf_cfg: HwafCfg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwafCfg {
    /// Directory, relative to the workspace root, holding the packages.
    #[serde(default = "default_cmtpkgs")]
    pub cmtpkgs: String,
}

impl Default for HwafCfg {
    fn default() -> Self {
        Self {
            cmtpkgs: default_cmtpkgs(),
        }
    }
}

fn default_cmtpkgs() -> String {
    DEFAULT_SOURCE_ROOT.to_owned()
}

impl WorkspaceConfig {
    /// Load the configuration; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::debug!("no local config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let content = toml::to_string_pretty(self)?;
        write_atomic(path, content.as_bytes())
    }

    pub fn source_root(&self) -> &str {
        self.hwaf_cfg.cmtpkgs.trim_end_matches('/')
    }
}
