use super::{json_pretty, open_workspace, EXIT_SUCCESS};
use hwaf_schema::{
    parse_hscript_file, Action, Configuration, Environment, PackageSection, HSCRIPT_FILE,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Serialize)]
struct HscriptReport<'a> {
    package: &'a PackageSection,
    tools: &'a [String],
    tags: BTreeSet<String>,
    environment: BTreeMap<String, String>,
    actions: Vec<Action>,
}

/// Load `target` as an hscript file, a package directory, or a registered package.
pub(crate) fn load(root: &Path, target: &str) -> Result<Configuration, String> {
    let path = Path::new(target);
    let file = if path.is_file() {
        Some(path.to_path_buf())
    } else if path.join(HSCRIPT_FILE).is_file() {
        Some(path.join(HSCRIPT_FILE))
    } else {
        None
    };
    match file {
        Some(file) => parse_hscript_file(&file).map_err(|e| format!("hscript error: {e}")),
        None => open_workspace(root)?
            .load_hscript(target)
            .map_err(|e| e.to_string()),
    }
}

pub fn run(root: &Path, target: &str, json: bool) -> Result<u8, String> {
    let cfg = load(root, target)?;
    let tags = cfg
        .active_tags()
        .map_err(|e| format!("hscript error: {e}"))?;
    let resolved = cfg.environment(&Environment::from_process());
    let environment: BTreeMap<String, String> = cfg
        .configure
        .env
        .iter()
        .filter_map(|a| {
            resolved
                .get(&a.name)
                .map(|v| (a.name.clone(), v.to_owned()))
        })
        .collect();

    let report = HscriptReport {
        package: &cfg.package,
        tools: &cfg.configure.tools,
        tags,
        environment,
        actions: cfg.actions(),
    };

    if json {
        println!("{}", json_pretty(&report)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("package:  {}", report.package.name);
    if !report.package.authors.is_empty() {
        println!("authors:  {}", report.package.authors.join(", "));
    }
    if !report.package.managers.is_empty() {
        println!("managers: {}", report.package.managers.join(", "));
    }
    let deps = report.package.dep_names();
    if !deps.is_empty() {
        println!("deps:     {}", deps.join(", "));
    }
    if !report.tools.is_empty() {
        println!("tools:    {}", report.tools.join(", "));
    }
    if !report.tags.is_empty() {
        let tags: Vec<_> = report.tags.iter().map(String::as_str).collect();
        println!("tags:     {}", tags.join(" "));
    }
    if !report.environment.is_empty() {
        println!("env:");
        for (name, value) in &report.environment {
            println!("  {name}={value}");
        }
    }
    if !report.actions.is_empty() {
        println!("actions:");
        for action in &report.actions {
            match action {
                Action::RunScript { path } => println!("  hwaf-call {path}"),
                Action::Rule { name, rule } if rule.target.is_empty() => println!("  rule {name}"),
                Action::Rule { name, rule } => {
                    println!("  rule {name} (target: {})", rule.target);
                }
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
