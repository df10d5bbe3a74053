use std::fs;
use std::io;
use std::path::Path;

/// Delete a package directory tree, then every ancestor it leaves empty.
///
/// The upward walk stops at the first non-empty ancestor, at `source_root`, or
/// at `workspace_root`, whichever comes first; none of those is ever removed.
/// Removing `src/Control/AthenaKernel` therefore also removes `src/Control`
/// unless another package still lives there.
pub fn remove_pkg_dir(dir: &Path, source_root: &Path, workspace_root: &Path) -> io::Result<()> {
    fs::remove_dir_all(dir)?;
    tracing::debug!("removed {}", dir.display());

    let mut current = dir.parent();
    while let Some(parent) = current {
        if parent == source_root || parent == workspace_root || !parent.starts_with(workspace_root)
        {
            break;
        }
        if fs::read_dir(parent)?.next().is_some() {
            break;
        }
        fs::remove_dir(parent)?;
        tracing::debug!("removed empty directory {}", parent.display());
        current = parent.parent();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mkpkg(root: &Path, rel: &str) {
        let dir = root.join(rel);
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("hscript.yml"), "package: {name: x}\n").unwrap();
    }

    #[test]
    fn removes_empty_namespace_parent() {
        let ws = tempfile::tempdir().unwrap();
        let src = ws.path().join("src");
        mkpkg(ws.path(), "src/Control/AthenaKernel");

        remove_pkg_dir(&src.join("Control/AthenaKernel"), &src, ws.path()).unwrap();
        assert!(!src.join("Control").exists());
        assert!(src.is_dir());
    }

    #[test]
    fn keeps_parent_with_siblings() {
        let ws = tempfile::tempdir().unwrap();
        let src = ws.path().join("src");
        mkpkg(ws.path(), "src/Control/AthenaKernel");
        mkpkg(ws.path(), "src/Control/AthenaServices");

        remove_pkg_dir(&src.join("Control/AthenaKernel"), &src, ws.path()).unwrap();
        assert!(!src.join("Control/AthenaKernel").exists());
        assert!(src.join("Control/AthenaServices").is_dir());
    }

    #[test]
    fn walks_several_levels() {
        let ws = tempfile::tempdir().unwrap();
        let src = ws.path().join("src");
        mkpkg(ws.path(), "src/A/B/C/pkg");
        fs::write(src.join("A").join("README"), "keep").unwrap();

        remove_pkg_dir(&src.join("A/B/C/pkg"), &src, ws.path()).unwrap();
        assert!(!src.join("A/B").exists());
        assert!(src.join("A/README").exists());
    }

    #[test]
    fn never_removes_source_root() {
        let ws = tempfile::tempdir().unwrap();
        let src = ws.path().join("src");
        mkpkg(ws.path(), "src/mypkg");

        remove_pkg_dir(&src.join("mypkg"), &src, ws.path()).unwrap();
        assert!(src.is_dir());
        assert_eq!(fs::read_dir(&src).unwrap().count(), 0);
    }

    #[test]
    fn stops_at_workspace_root_outside_source_root() {
        let ws = tempfile::tempdir().unwrap();
        let src = ws.path().join("src");
        fs::create_dir_all(&src).unwrap();
        mkpkg(ws.path(), "external/pkg");

        remove_pkg_dir(&ws.path().join("external/pkg"), &src, ws.path()).unwrap();
        assert!(!ws.path().join("external").exists());
        assert!(ws.path().is_dir());
    }

    #[test]
    fn missing_dir_is_an_error() {
        let ws = tempfile::tempdir().unwrap();
        let src = ws.path().join("src");
        assert!(remove_pkg_dir(&src.join("nope"), &src, ws.path()).is_err());
    }
}
