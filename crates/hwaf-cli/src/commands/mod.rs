pub mod completions;
pub mod init;
pub mod pkg_co;
pub mod pkg_create;
pub mod pkg_ls;
pub mod pkg_rm;
pub mod show_hscript;
pub mod show_pkg_uses;

use hwaf_core::Workspace;
use hwaf_store::VcsKind;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_HSCRIPT_ERROR: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;

/// Exit status for a failure, keyed on the error's message prefix.
pub fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("hscript error:") {
        EXIT_HSCRIPT_ERROR
    } else if msg.starts_with("store error:") || msg.starts_with("workspace lock:") {
        EXIT_STORE_ERROR
    } else {
        EXIT_FAILURE
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn open_workspace(root: &Path) -> Result<Workspace, String> {
    Workspace::open(root).map_err(|e| e.to_string())
}

pub fn spinner(msg: &str) -> Result<ProgressBar, String> {
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .map_err(|e| e.to_string())?
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(
        ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(
        ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_vcs(vcs: VcsKind) -> String {
    use console::Style;
    let label = vcs.to_string();
    match vcs {
        VcsKind::Local => Style::new().yellow().apply_to(label).to_string(),
        VcsKind::Git => Style::new().green().apply_to(label).to_string(),
        VcsKind::Svn => Style::new().cyan().apply_to(label).to_string(),
    }
}
