//! Environment templating for the `configure.env` section.
//!
//! Assignments are applied strictly in declaration order, so later entries see
//! the values produced by earlier ones.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator between entries of a path-list variable such as `PATH`.
#[cfg(windows)]
pub const PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
pub const PATH_SEPARATOR: &str = ":";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvMode {
    Set,
    PrependPath,
    AppendPath,
}

impl std::fmt::Display for EnvMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvMode::Set => write!(f, "set"),
            EnvMode::PrependPath => write!(f, "prepend-path"),
            EnvMode::AppendPath => write!(f, "append-path"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvAssignment {
    pub name: String,
    pub mode: EnvMode,
    pub value: String,
}

impl EnvAssignment {
    pub fn set(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: EnvMode::Set,
            value: value.into(),
        }
    }

    pub fn prepend(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: EnvMode::PrependPath,
            value: value.into(),
        }
    }

    pub fn append(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: EnvMode::AppendPath,
            value: value.into(),
        }
    }
}

/// A resolved set of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment. Non-UTF-8 entries are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Substitute every `${NAME}` in `template`. Unknown names expand to the
    /// empty string; an unterminated `${` is kept literally.
    pub fn expand(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };
            out.push_str(self.get(&after[..end]).unwrap_or(""));
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        out
    }

    /// Apply one assignment in place.
    pub fn assign(&mut self, assignment: &EnvAssignment) {
        let expanded = self.expand(&assignment.value);
        let existing = self.get(&assignment.name).unwrap_or("");
        let value = match assignment.mode {
            EnvMode::Set => expanded,
            EnvMode::PrependPath => join_path(&expanded, existing),
            EnvMode::AppendPath => join_path(existing, &expanded),
        };
        self.vars.insert(assignment.name.clone(), value);
    }
}

impl FromIterator<(String, String)> for Environment {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Resolve `assignments` on top of `base`, in order.
pub fn apply_env(assignments: &[EnvAssignment], base: &Environment) -> Environment {
    let mut env = base.clone();
    for a in assignments {
        env.assign(a);
        tracing::trace!("{} {} -> {:?}", a.mode, a.name, env.get(&a.name));
    }
    env
}

// An empty side contributes no separator.
fn join_path(front: &str, back: &str) -> String {
    match (front.is_empty(), back.is_empty()) {
        (true, _) => back.to_owned(),
        (_, true) => front.to_owned(),
        _ => format!("{front}{PATH_SEPARATOR}{back}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sep(parts: &[&str]) -> String {
        parts.join(PATH_SEPARATOR)
    }

    #[test]
    fn prepend_onto_earlier_set() {
        let env = apply_env(
            &[
                EnvAssignment::set("PATH", "/a"),
                EnvAssignment::prepend("PATH", "/b"),
            ],
            &Environment::new(),
        );
        assert_eq!(env.get("PATH"), Some(sep(&["/b", "/a"]).as_str()));
    }

    #[test]
    fn append_onto_base_value() {
        let mut base = Environment::new();
        base.insert("PYTHONPATH", "/usr/lib/python");
        let env = apply_env(
            &[EnvAssignment::append("PYTHONPATH", "/mypath/python")],
            &base,
        );
        assert_eq!(
            env.get("PYTHONPATH"),
            Some(sep(&["/usr/lib/python", "/mypath/python"]).as_str())
        );
        assert_eq!(base.get("PYTHONPATH"), Some("/usr/lib/python"));
    }

    #[test]
    fn prepend_onto_unset_has_no_dangling_separator() {
        let env = apply_env(&[EnvAssignment::prepend("LD_LIBRARY_PATH", "/lib")], &Environment::new());
        assert_eq!(env.get("LD_LIBRARY_PATH"), Some("/lib"));
    }

    #[test]
    fn set_expands_earlier_variables() {
        let env = apply_env(
            &[
                EnvAssignment::set("ROOT", "/opt/sw"),
                EnvAssignment::set("BIN", "${ROOT}/bin"),
                EnvAssignment::set("ROOT", "/elsewhere"),
            ],
            &Environment::new(),
        );
        assert_eq!(env.get("BIN"), Some("/opt/sw/bin"));
        assert_eq!(env.get("ROOT"), Some("/elsewhere"));
    }

    #[test]
    fn unresolved_reference_expands_empty() {
        let env = apply_env(
            &[EnvAssignment::set("X", "a${NOPE}b")],
            &Environment::new(),
        );
        assert_eq!(env.get("X"), Some("ab"));
    }

    #[test]
    fn prepend_may_reference_itself() {
        let mut base = Environment::new();
        base.insert("P", "/x");
        let env = apply_env(&[EnvAssignment::prepend("P", "${P}/sub")], &base);
        assert_eq!(env.get("P"), Some(sep(&["/x/sub", "/x"]).as_str()));
    }

    #[test]
    fn unterminated_reference_is_literal() {
        let env = Environment::new();
        assert_eq!(env.expand("abc${DEF"), "abc${DEF");
        assert_eq!(env.expand("$HOME/x"), "$HOME/x");
    }

    #[test]
    fn order_matters() {
        let a = apply_env(
            &[
                EnvAssignment::set("V", "1"),
                EnvAssignment::append("V", "2"),
            ],
            &Environment::new(),
        );
        let b = apply_env(
            &[
                EnvAssignment::append("V", "2"),
                EnvAssignment::set("V", "1"),
            ],
            &Environment::new(),
        );
        assert_eq!(a.get("V"), Some(sep(&["1", "2"]).as_str()));
        assert_eq!(b.get("V"), Some("1"));
    }

    #[test]
    fn mode_display() {
        assert_eq!(EnvMode::PrependPath.to_string(), "prepend-path");
        assert_eq!(EnvMode::AppendPath.to_string(), "append-path");
        assert_eq!(EnvMode::Set.to_string(), "set");
    }
}
