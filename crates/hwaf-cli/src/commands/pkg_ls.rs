use super::{colorize_vcs, json_pretty, open_workspace, EXIT_SUCCESS};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> Result<u8, String> {
    let ws = open_workspace(root)?;
    let entries: Vec<_> = ws.pkgdb().list().collect();
    if json {
        println!("{}", json_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("no packages found");
    } else {
        println!("{:<40} {:<6} REMOTE", "PACKAGE", "VCS");
        for entry in &entries {
            println!(
                "{:<40} {:<6} {}",
                entry.name,
                colorize_vcs(entry.vcs),
                entry.remote
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
