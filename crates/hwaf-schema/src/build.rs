//! The `build` section: named build rules and helper script calls, and their
//! flattening into an ordered action list.

use serde::Serialize;
use serde_yaml::Mapping;

/// A named build-target description.
///
/// List attributes accept a scalar or a list in the document; `target` and
/// `install_path` stay scalar. Attributes the schema does not know are kept in
/// `extra`, in document order, but not interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildRule {
    pub features: Vec<String>,
    pub source: Vec<String>,
    pub target: String,
    #[serde(rename = "use")]
    pub uses: Vec<String>,
    pub cxxflags: Vec<String>,
    pub cflags: Vec<String>,
    pub defines: Vec<String>,
    pub install_path: String,
    #[serde(skip_serializing_if = "Mapping::is_empty")]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedRule {
    pub name: String,
    pub rule: BuildRule,
}

/// One key of the `build` mapping, kept in the order it was written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BuildItem {
    HwafCall { scripts: Vec<String> },
    Rule(NamedRule),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BuildSection {
    pub items: Vec<BuildItem>,
}

impl BuildSection {
    pub fn hwaf_call(&self) -> impl Iterator<Item = &str> {
        self.items.iter().flat_map(|item| {
            let scripts: &[String] = match item {
                BuildItem::HwafCall { scripts } => scripts,
                BuildItem::Rule(_) => &[],
            };
            scripts.iter().map(String::as_str)
        })
    }

    pub fn rules(&self) -> impl Iterator<Item = &NamedRule> {
        self.items.iter().filter_map(|item| match item {
            BuildItem::Rule(r) => Some(r),
            BuildItem::HwafCall { .. } => None,
        })
    }

    pub fn rule(&self, name: &str) -> Option<&BuildRule> {
        self.rules().find(|r| r.name == name).map(|r| &r.rule)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A step handed to the build engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    RunScript { path: String },
    Rule { name: String, rule: BuildRule },
}

/// Flatten the `build` section into actions, preserving document order.
///
/// Rule `use` references are not followed: ordering by dependency and cycle
/// detection belong to the build engine.
pub fn extract_actions(build: &BuildSection) -> Vec<Action> {
    let mut actions = Vec::new();
    for item in &build.items {
        match item {
            BuildItem::HwafCall { scripts } => {
                actions.extend(scripts.iter().map(|p| Action::RunScript { path: p.clone() }));
            }
            BuildItem::Rule(r) => actions.push(Action::Rule {
                name: r.name.clone(),
                rule: r.rule.clone(),
            }),
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, target: &str) -> BuildItem {
        BuildItem::Rule(NamedRule {
            name: name.to_owned(),
            rule: BuildRule {
                target: target.to_owned(),
                ..BuildRule::default()
            },
        })
    }

    fn scripts(paths: &[&str]) -> BuildItem {
        BuildItem::HwafCall {
            scripts: paths.iter().map(|&p| p.to_owned()).collect(),
        }
    }

    #[test]
    fn scripts_first_then_rules() {
        let build = BuildSection {
            items: vec![
                scripts(&["waftools/script-1.py", "waftools/script-2.py"]),
                rule("lib", "hello-world"),
                rule("app", "hello-app"),
            ],
        };
        let actions = extract_actions(&build);
        assert_eq!(actions.len(), 4);
        assert_eq!(
            actions[0],
            Action::RunScript {
                path: "waftools/script-1.py".to_owned()
            }
        );
        assert!(matches!(&actions[2], Action::Rule { name, .. } if name == "lib"));
        assert!(matches!(&actions[3], Action::Rule { name, .. } if name == "app"));
    }

    #[test]
    fn scripts_written_after_rules_run_after_them() {
        let build = BuildSection {
            items: vec![rule("lib", "x"), scripts(&["post.py"])],
        };
        let actions = extract_actions(&build);
        assert!(matches!(&actions[0], Action::Rule { .. }));
        assert!(matches!(&actions[1], Action::RunScript { path } if path == "post.py"));
    }

    #[test]
    fn empty_section_has_no_actions() {
        assert!(extract_actions(&BuildSection::default()).is_empty());
    }

    #[test]
    fn accessors_split_items() {
        let build = BuildSection {
            items: vec![scripts(&["a.py"]), rule("lib", "x")],
        };
        assert_eq!(build.hwaf_call().collect::<Vec<_>>(), vec!["a.py"]);
        assert_eq!(build.rules().count(), 1);
        assert_eq!(build.rule("lib").unwrap().target, "x");
        assert!(build.rule("nope").is_none());
    }

    #[test]
    fn action_serializes_with_tag() {
        let json = serde_json::to_value(Action::RunScript {
            path: "a.py".to_owned(),
        })
        .unwrap();
        assert_eq!(json["action"], "run-script");
        assert_eq!(json["path"], "a.py");
    }
}
