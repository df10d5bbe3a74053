//! Package lifecycle tests: create, checkout and removal with on-disk cleanup.

use hwaf_core::{CoreError, VcsClient, Workspace, WorkspaceLock};
use hwaf_store::{PkgDb, StoreError, VcsKind};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Records checkouts and fakes them by writing a minimal package tree.
#[derive(Default)]
struct FakeVcs {
    calls: RefCell<Vec<(VcsKind, String, PathBuf)>>,
    fail: bool,
}

impl VcsClient for FakeVcs {
    fn checkout(&self, vcs: VcsKind, remote: &str, dest: &Path) -> Result<(), CoreError> {
        self.calls
            .borrow_mut()
            .push((vcs, remote.to_owned(), dest.to_path_buf()));
        fs::create_dir_all(dest.join("src"))?;
        if self.fail {
            return Err(CoreError::Vcs {
                vcs,
                remote: remote.to_owned(),
                reason: "connection refused".to_owned(),
            });
        }
        fs::write(dest.join("hscript.yml"), "package: {name: checked-out}\n")?;
        Ok(())
    }
}

fn new_workspace() -> (tempfile::TempDir, Workspace) {
    let dir = tempfile::tempdir().unwrap();
    let ws = Workspace::init(dir.path()).unwrap();
    (dir, ws)
}

#[test]
fn create_registers_local_package_with_valid_hscript() {
    let (dir, mut ws) = new_workspace();
    let entry = ws.create_pkg("MyPath/MyPackage").unwrap().clone();
    assert_eq!(entry.name, "src/MyPath/MyPackage");
    assert_eq!(entry.vcs, VcsKind::Local);
    assert_eq!(entry.remote, "");

    let pkg_dir = dir.path().join("src/MyPath/MyPackage");
    assert!(pkg_dir.join("MyPackage").is_dir());
    assert!(pkg_dir.join("src").is_dir());

    let cfg = ws.load_hscript("MyPath/MyPackage").unwrap();
    assert_eq!(cfg.package.name, "MyPath/MyPackage");
}

#[test]
fn create_rejects_existing_directory() {
    let (dir, mut ws) = new_workspace();
    fs::create_dir_all(dir.path().join("src/Existing")).unwrap();
    assert!(matches!(
        ws.create_pkg("Existing"),
        Err(CoreError::PackageDirExists(key)) if key == "src/Existing"
    ));
    assert!(ws.pkgdb().is_empty());
}

#[test]
fn create_rejects_registered_package() {
    let (dir, mut ws) = new_workspace();
    ws.create_pkg("Dup").unwrap();
    fs::remove_dir_all(dir.path().join("src/Dup")).unwrap();
    assert!(matches!(
        ws.create_pkg("Dup"),
        Err(CoreError::Store(StoreError::DuplicatePackage(_)))
    ));
}

#[test]
fn registry_survives_reopen() {
    let (dir, mut ws) = new_workspace();
    ws.create_pkg("Control/AthenaKernel").unwrap();
    drop(ws);

    let ws = Workspace::open(dir.path()).unwrap();
    assert!(ws.pkgdb().has_pkg("src/Control/AthenaKernel"));
    let db = PkgDb::load(ws.layout().pkgdb_file()).unwrap();
    assert_eq!(db.len(), 1);
}

#[test]
fn remove_cleans_up_empty_parent() {
    let (dir, mut ws) = new_workspace();
    ws.create_pkg("Control/AthenaKernel").unwrap();

    let removed = ws.remove_pkg("Control/AthenaKernel", false).unwrap();
    assert_eq!(removed.name, "src/Control/AthenaKernel");
    assert!(!dir.path().join("src/Control").exists());
    assert!(dir.path().join("src").is_dir());
    assert!(ws.pkgdb().is_empty());
}

#[test]
fn remove_keeps_parent_with_sibling_package() {
    let (dir, mut ws) = new_workspace();
    ws.create_pkg("Control/AthenaKernel").unwrap();
    ws.create_pkg("Control/AthenaServices").unwrap();

    ws.remove_pkg("src/Control/AthenaKernel", false).unwrap();
    assert!(!dir.path().join("src/Control/AthenaKernel").exists());
    assert!(dir.path().join("src/Control/AthenaServices").is_dir());
    assert!(ws.pkgdb().has_pkg("src/Control/AthenaServices"));
}

#[test]
fn remove_of_hand_deleted_package_needs_force() {
    let (dir, mut ws) = new_workspace();
    ws.create_pkg("Gone").unwrap();
    fs::remove_dir_all(dir.path().join("src/Gone")).unwrap();

    let err = ws.remove_pkg("Gone", false).unwrap_err();
    assert!(matches!(&err, CoreError::AlreadyDeletedOnDisk { name } if name == "src/Gone"));
    assert!(err.to_string().contains("did you remove it by hand?"));
    assert!(ws.pkgdb().has_pkg("src/Gone"));

    ws.remove_pkg("Gone", true).unwrap();
    assert!(!ws.pkgdb().has_pkg("src/Gone"));
}

#[test]
fn forced_remove_survives_failed_cleanup() {
    let (dir, mut ws) = new_workspace();
    ws.create_pkg("F").unwrap();
    let pkg_dir = dir.path().join("src/F");
    fs::remove_dir_all(&pkg_dir).unwrap();
    fs::write(&pkg_dir, "not a directory").unwrap();

    assert!(matches!(ws.remove_pkg("F", false), Err(CoreError::Io(_))));
    assert!(ws.pkgdb().has_pkg("src/F"));

    let removed = ws.remove_pkg("F", true).unwrap();
    assert_eq!(removed.name, "src/F");
    assert!(!ws.pkgdb().has_pkg("src/F"));
}

#[test]
fn failed_create_leaves_no_empty_parents() {
    let (dir, mut ws) = new_workspace();
    let pkgdb_file = ws.layout().pkgdb_file();
    fs::remove_file(&pkgdb_file).unwrap();
    fs::create_dir_all(pkgdb_file.join("blocker")).unwrap();

    assert!(ws.create_pkg("MyPath/MyPackage").is_err());
    assert!(!dir.path().join("src/MyPath").exists());
    assert!(dir.path().join("src").is_dir());
    assert!(ws.pkgdb().is_empty());
}

#[test]
fn remove_unknown_package_is_not_found() {
    let (_dir, mut ws) = new_workspace();
    assert!(matches!(
        ws.remove_pkg("Nope", true),
        Err(CoreError::NotFound(name)) if name == "Nope"
    ));
}

#[test]
fn remove_many_reports_each_failure() {
    let (_dir, mut ws) = new_workspace();
    ws.create_pkg("A").unwrap();
    ws.create_pkg("B").unwrap();

    let report = ws.remove_pkgs(&["A", "Missing", "B"], false);
    assert!(!report.is_ok());
    let removed: Vec<_> = report.removed.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(removed, ["src/A", "src/B"]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].0, "Missing");
    assert!(matches!(report.first_error(), Some(CoreError::NotFound(_))));
    assert!(ws.pkgdb().is_empty());
}

#[test]
fn checkout_registers_remote() {
    let (dir, mut ws) = new_workspace();
    let vcs = FakeVcs::default();
    let entry = ws
        .checkout_pkg(&vcs, VcsKind::Git, "https://github.com/hwaf/mypkg.git", None)
        .unwrap()
        .clone();
    assert_eq!(entry.name, "src/mypkg");
    assert_eq!(entry.vcs, VcsKind::Git);
    assert_eq!(entry.remote, "https://github.com/hwaf/mypkg.git");

    let calls = vcs.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].2, dir.path().join("src/mypkg"));
    assert_eq!(ws.load_hscript("mypkg").unwrap().package.name, "checked-out");
}

#[test]
fn checkout_into_explicit_path() {
    let (dir, mut ws) = new_workspace();
    let vcs = FakeVcs::default();
    ws.checkout_pkg(
        &vcs,
        VcsKind::Svn,
        "svn+ssh://svn.cern.ch/reps/atlasoff/Control/AthenaKernel/trunk",
        Some("Control/AthenaKernel"),
    )
    .unwrap();
    assert!(dir.path().join("src/Control/AthenaKernel/hscript.yml").is_file());
    assert_eq!(
        ws.get_pkg("Control/AthenaKernel").unwrap().vcs,
        VcsKind::Svn
    );
}

#[test]
fn checkout_rejects_local() {
    let (_dir, mut ws) = new_workspace();
    let vcs = FakeVcs::default();
    assert!(matches!(
        ws.checkout_pkg(&vcs, VcsKind::Local, "somewhere", None),
        Err(CoreError::UnsupportedVcs(VcsKind::Local))
    ));
    assert!(vcs.calls.borrow().is_empty());
}

#[test]
fn failed_checkout_leaves_nothing_behind() {
    let (dir, mut ws) = new_workspace();
    let vcs = FakeVcs {
        fail: true,
        ..FakeVcs::default()
    };
    let err = ws
        .checkout_pkg(&vcs, VcsKind::Git, "git@host:Tools/Broken.git", Some("Tools/Broken"))
        .unwrap_err();
    assert!(matches!(err, CoreError::Vcs { .. }));
    assert!(!dir.path().join("src/Tools").exists());
    assert!(ws.pkgdb().is_empty());
}

#[test]
fn open_workspace_holds_the_lock() {
    let (_dir, ws) = new_workspace();
    let lock_path = ws.layout().lock_file();
    assert!(WorkspaceLock::try_acquire(&lock_path).unwrap().is_none());
    drop(ws);
    assert!(WorkspaceLock::try_acquire(&lock_path).unwrap().is_some());
}

#[test]
fn custom_source_root_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".hwaf")).unwrap();
    fs::write(
        dir.path().join(".hwaf/local.conf"),
        "[hwaf-cfg]\ncmtpkgs = \"pkgs\"\n",
    )
    .unwrap();

    let mut ws = Workspace::init(dir.path()).unwrap();
    assert_eq!(ws.source_root(), "pkgs");
    ws.create_pkg("Foo/Bar").unwrap();
    assert!(dir.path().join("pkgs/Foo/Bar/hscript.yml").is_file());
    ws.remove_pkg("Foo/Bar", false).unwrap();
    assert!(!dir.path().join("pkgs/Foo").exists());
    assert!(dir.path().join("pkgs").is_dir());
}
