use super::{json_pretty, open_workspace, EXIT_SUCCESS};
use std::path::Path;

pub fn run(root: &Path, path: &str, json: bool) -> Result<u8, String> {
    let mut ws = open_workspace(root)?;
    let entry = ws.create_pkg(path).map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(entry)?);
    } else {
        println!("created package [{path}] in {}", entry.path);
    }
    Ok(EXIT_SUCCESS)
}
