use super::{exit_code_for, json_pretty, open_workspace, EXIT_SUCCESS};
use std::path::Path;

pub fn run(root: &Path, names: &[String], force: bool, json: bool) -> Result<u8, String> {
    let mut ws = open_workspace(root)?;
    let report = ws.remove_pkgs(names, force);

    if json {
        let errors: Vec<_> = report
            .errors
            .iter()
            .map(|(name, e)| serde_json::json!({ "name": name, "error": e.to_string() }))
            .collect();
        let payload = serde_json::json!({
            "removed": &report.removed,
            "errors": errors,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        for entry in &report.removed {
            println!("removed package [{}]", entry.name);
        }
        for (name, e) in &report.errors {
            eprintln!("error: could not remove [{name}]: {e}");
        }
    }

    Ok(report
        .first_error()
        .map_or(EXIT_SUCCESS, |e| exit_code_for(&e.to_string())))
}
