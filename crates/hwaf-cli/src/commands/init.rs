use super::{json_pretty, EXIT_SUCCESS};
use hwaf_core::Workspace;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> Result<u8, String> {
    let ws = Workspace::init(root).map_err(|e| e.to_string())?;
    if json {
        let payload = serde_json::json!({
            "workspace": root.display().to_string(),
            "source_root": ws.source_root(),
            "packages": ws.pkgdb().len(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "initialized workspace at {} (source root: {})",
            root.display(),
            ws.source_root()
        );
    }
    Ok(EXIT_SUCCESS)
}
