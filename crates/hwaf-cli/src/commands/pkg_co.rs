use super::{json_pretty, open_workspace, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use hwaf_core::SystemVcs;
use hwaf_store::VcsKind;
use std::path::Path;

pub fn run(
    root: &Path,
    vcs: VcsKind,
    remote: &str,
    path: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let mut ws = open_workspace(root)?;
    let pb = if json {
        None
    } else {
        Some(spinner(&format!("checking out [{remote}]..."))?)
    };

    match ws.checkout_pkg(&SystemVcs, vcs, remote, path) {
        Ok(entry) => {
            if let Some(pb) = &pb {
                spin_ok(pb, &format!("checked out [{remote}] into {}", entry.path));
            }
            if json {
                println!("{}", json_pretty(entry)?);
            }
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, &format!("checkout of [{remote}] failed"));
            }
            Err(e.to_string())
        }
    }
}
