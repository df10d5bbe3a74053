use super::{json_pretty, EXIT_SUCCESS};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct RuleUses {
    rule: String,
    uses: Vec<String>,
}

pub fn run(root: &Path, name: &str, json: bool) -> Result<u8, String> {
    let cfg = super::show_hscript::load(root, name)?;
    let deps = cfg.package.dep_names();
    let rules: Vec<RuleUses> = cfg
        .build
        .rules()
        .map(|r| RuleUses {
            rule: r.name.clone(),
            uses: r.rule.uses.clone(),
        })
        .collect();

    if json {
        let payload = serde_json::json!({
            "package": cfg.package.name,
            "deps": deps,
            "rules": rules,
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("package [{}] uses:", cfg.package.name);
    if deps.is_empty() {
        println!("  (no package dependencies)");
    }
    for dep in &deps {
        println!("  {dep}");
    }
    for r in rules.iter().filter(|r| !r.uses.is_empty()) {
        println!("rule [{}] uses: {}", r.rule, r.uses.join(" "));
    }
    Ok(EXIT_SUCCESS)
}
