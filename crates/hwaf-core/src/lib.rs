//! Workspace orchestration for hwaf.
//!
//! This crate ties the hscript schema and the package registry together into
//! the `Workspace` handle, opened at the start of every package-affecting
//! command. It owns the package lifecycle (create, VCS checkout, removal with
//! on-disk cleanup) and the advisory lock serializing concurrent invocations.

pub mod cleanup;
pub mod concurrency;
pub mod vcs;
pub mod workspace;

pub use cleanup::remove_pkg_dir;
pub use concurrency::WorkspaceLock;
pub use vcs::{SystemVcs, VcsClient};
pub use workspace::{RemoveReport, Workspace};

use hwaf_store::VcsKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("hscript error: {0}")]
    Hscript(#[from] hwaf_schema::HscriptError),
    #[error("store error: {0}")]
    Store(#[from] hwaf_store::StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no such package [{0}] in db")]
    NotFound(String),
    #[error(
        "no such package [{name}] on disk\ndid you remove it by hand? (re-try with 'hwaf pkg rm -f {name}')"
    )]
    AlreadyDeletedOnDisk { name: String },
    #[error("directory [{0}] already exists on filesystem")]
    PackageDirExists(String),
    #[error("{vcs} checkout of [{remote}] failed: {reason}")]
    Vcs {
        vcs: VcsKind,
        remote: String,
        reason: String,
    },
    #[error("VCS of type [{0}] cannot be checked out")]
    UnsupportedVcs(VcsKind),
    #[error("workspace lock: {0}")]
    Lock(String),
    #[error("not an hwaf workspace: {0} (run 'hwaf init' first)")]
    NotAWorkspace(String),
}
