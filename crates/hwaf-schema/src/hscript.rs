use crate::build::{extract_actions, Action, BuildItem, BuildRule, BuildSection, NamedRule};
use crate::environ::{apply_env, EnvAssignment, EnvMode, Environment};
use crate::error::{Mismatch, Shape, ValidationError, ValidationErrors};
use crate::tags::{declared_tags, resolve_tags, TagDecl};
use crate::value::{
    expect_mapping, expect_sequence, normalize_list, normalize_scalar_or_list, scalar,
    single_entry,
};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the hscript document at the root of a package.
pub const HSCRIPT_FILE: &str = "hscript.yml";

const TOP_LEVEL_FIELDS: &[&str] = &["package", "options", "configure", "build"];
const PACKAGE_FIELDS: &[&str] = &["name", "authors", "managers", "deps"];
const CONFIGURE_FIELDS: &[&str] = &["tools", "env", "declare-tags", "apply-tags", "hwaf-call"];

#[derive(Debug, Error)]
pub enum HscriptError {
    #[error("failed to read hscript file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse hscript: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("invalid hscript: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// A validated hscript document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    pub package: PackageSection,
    pub options: Mapping,
    pub configure: ConfigureSection,
    pub build: BuildSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackageSection {
    pub name: String,
    pub authors: Vec<String>,
    pub managers: Vec<String>,
    /// Dependency name to an opaque spec, in document order.
    pub deps: Mapping,
}

impl PackageSection {
    pub fn dep_names(&self) -> Vec<String> {
        self.deps.keys().filter_map(|k| scalar(k).ok()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigureSection {
    pub tools: Vec<String>,
    pub env: Vec<EnvAssignment>,
    pub declare_tags: Vec<TagDecl>,
    pub apply_tags: Vec<String>,
    pub hwaf_call: Vec<String>,
}

impl Configuration {
    /// Applied tags plus their constituents.
    pub fn active_tags(&self) -> Result<BTreeSet<String>, ValidationError> {
        resolve_tags(&self.configure.declare_tags, &self.configure.apply_tags)
    }

    /// The `configure.env` assignments resolved on top of `base`.
    pub fn environment(&self, base: &Environment) -> Environment {
        apply_env(&self.configure.env, base)
    }

    pub fn actions(&self) -> Vec<Action> {
        extract_actions(&self.build)
    }
}

pub fn parse_hscript_str(input: &str) -> Result<Configuration, HscriptError> {
    let blank = input.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with('#')
    });
    let doc: Value = if blank {
        Value::Null
    } else {
        serde_yaml::from_str(input)?
    };
    Ok(validate(&doc)?)
}

pub fn parse_hscript_file(path: impl AsRef<Path>) -> Result<Configuration, HscriptError> {
    let content = fs::read_to_string(path)?;
    parse_hscript_str(&content)
}

/// Check a parsed document against the hscript schema.
///
/// Each section stops at its first problem, but every section is checked, so
/// one call reports as many errors as can be found cheaply.
pub fn validate(doc: &Value) -> Result<Configuration, ValidationErrors> {
    let top = match doc {
        Value::Null => return Err(ValidationErrors::new(vec![ValidationError::DocumentEmpty])),
        Value::Mapping(m) => m,
        other => {
            return Err(ValidationErrors::new(vec![Mismatch {
                expected: "mapping",
                found: Shape::of(other),
            }
            .at("document")]))
        }
    };

    let mut errors = Vec::new();
    if let Err(e) = check_known_fields(top, TOP_LEVEL_FIELDS, "document") {
        errors.push(e);
    }

    let package = match top.get("package") {
        Some(v) => keep(validate_package(v), &mut errors),
        None => {
            errors.push(ValidationError::DocumentEmpty);
            None
        }
    };
    let options = keep(
        top.get("options").map_or(Ok(Mapping::new()), |v| {
            expect_mapping(v).map_err(|e| e.at("options"))
        }),
        &mut errors,
    );
    let configure = keep(
        top.get("configure").map_or(Ok(ConfigureSection::default()), validate_configure),
        &mut errors,
    );
    let build = keep(
        top.get("build").map_or(Ok(BuildSection::default()), validate_build),
        &mut errors,
    );

    if let Some(c) = &configure {
        check_applied_tags(c, &mut errors);
    }

    match (package, options, configure, build) {
        (Some(package), Some(options), Some(configure), Some(build)) if errors.is_empty() => {
            tracing::debug!("validated hscript for package '{}'", package.name);
            Ok(Configuration {
                package,
                options,
                configure,
                build,
            })
        }
        _ => Err(ValidationErrors::new(errors)),
    }
}

fn keep<T>(result: Result<T, ValidationError>, errors: &mut Vec<ValidationError>) -> Option<T> {
    result.map_err(|e| errors.push(e)).ok()
}

fn check_known_fields(m: &Mapping, known: &[&str], path: &str) -> Result<(), ValidationError> {
    for key in m.keys() {
        let field = scalar(key).map_err(|e| e.at(path))?;
        if !known.contains(&field.as_str()) {
            return Err(ValidationError::UnknownField {
                path: path.to_owned(),
                field,
            });
        }
    }
    Ok(())
}

fn list_field(m: &Mapping, key: &str, path: &str) -> Result<Vec<String>, ValidationError> {
    m.get(key)
        .map_or(Ok(Vec::new()), |v| normalize_list(v).map_err(|e| e.at(path)))
}

fn validate_package(value: &Value) -> Result<PackageSection, ValidationError> {
    let m = expect_mapping(value).map_err(|e| e.at("package"))?;
    check_known_fields(&m, PACKAGE_FIELDS, "package")?;

    let name = match m.get("name") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim()).filter(|s| !s.is_empty()),
        Some(other) => {
            return Err(Mismatch {
                expected: "string",
                found: Shape::of(other),
            }
            .at("package.name"))
        }
    };
    let Some(name) = name else {
        return Err(ValidationError::MissingRequiredField {
            path: "package.name".to_owned(),
        });
    };

    let deps = m
        .get("deps")
        .map_or(Ok(Mapping::new()), expect_mapping)
        .map_err(|e| e.at("package.deps"))?;

    Ok(PackageSection {
        name: name.to_owned(),
        authors: list_field(&m, "authors", "package.authors")?,
        managers: list_field(&m, "managers", "package.managers")?,
        deps,
    })
}

fn validate_configure(value: &Value) -> Result<ConfigureSection, ValidationError> {
    let m = expect_mapping(value).map_err(|e| e.at("configure"))?;
    check_known_fields(&m, CONFIGURE_FIELDS, "configure")?;

    let tools = list_field(&m, "tools", "configure.tools")?;

    let mut env = Vec::new();
    if let Some(v) = m.get("env") {
        let items = expect_sequence(v).map_err(|e| e.at("configure.env"))?;
        for (i, item) in items.iter().enumerate() {
            env.push(env_entry(item).map_err(|e| e.at(format!("configure.env[{i}]")))?);
        }
    }

    let mut declare_tags = Vec::new();
    if let Some(v) = m.get("declare-tags") {
        let items = expect_sequence(v).map_err(|e| e.at("configure.declare-tags"))?;
        for (i, item) in items.iter().enumerate() {
            let path = format!("configure.declare-tags[{i}]");
            let (name, constituents) = single_entry(item).map_err(|e| e.at(path.as_str()))?;
            let constituents = normalize_list(constituents).map_err(|e| e.at(path))?;
            declare_tags.push(TagDecl { name, constituents });
        }
        declared_tags(&declare_tags)?;
    }

    Ok(ConfigureSection {
        tools,
        env,
        declare_tags,
        apply_tags: list_field(&m, "apply-tags", "configure.apply-tags")?,
        hwaf_call: list_field(&m, "hwaf-call", "configure.hwaf-call")?,
    })
}

// `{NAME: v}`, `{PREPENDPATH: {NAME: v}}` or `{APPENDPATH: {NAME: v}}`.
fn env_entry(item: &Value) -> Result<EnvAssignment, Mismatch> {
    let (key, inner) = single_entry(item)?;
    let mode = match key.as_str() {
        "PREPENDPATH" => EnvMode::PrependPath,
        "APPENDPATH" => EnvMode::AppendPath,
        _ => {
            return Ok(EnvAssignment {
                name: key,
                mode: EnvMode::Set,
                value: scalar(inner)?,
            })
        }
    };
    let (name, value) = single_entry(inner)?;
    Ok(EnvAssignment {
        name,
        mode,
        value: scalar(value)?,
    })
}

fn check_applied_tags(configure: &ConfigureSection, errors: &mut Vec<ValidationError>) {
    // Duplicates were already reported by the section itself.
    let Ok(declared) = declared_tags(&configure.declare_tags) else {
        return;
    };
    for (i, tag) in configure.apply_tags.iter().enumerate() {
        if !declared.contains_key(tag.as_str()) {
            errors.push(ValidationError::UndeclaredTag {
                path: format!("configure.apply-tags[{i}]"),
                tag: tag.clone(),
            });
        }
    }
}

fn validate_build(value: &Value) -> Result<BuildSection, ValidationError> {
    let m = expect_mapping(value).map_err(|e| e.at("build"))?;
    let mut items = Vec::with_capacity(m.len());
    for (key, v) in &m {
        let key = scalar(key).map_err(|e| e.at("build"))?;
        if key == "hwaf-call" {
            let scripts = normalize_list(v).map_err(|e| e.at("build.hwaf-call"))?;
            items.push(BuildItem::HwafCall { scripts });
        } else {
            let rule = build_rule(&key, v)?;
            items.push(BuildItem::Rule(NamedRule { name: key, rule }));
        }
    }
    Ok(BuildSection { items })
}

fn build_rule(name: &str, value: &Value) -> Result<BuildRule, ValidationError> {
    let Value::Mapping(attrs) = value else {
        return Err(Mismatch {
            expected: "mapping",
            found: Shape::of(value),
        }
        .at(format!("build.{name}")));
    };

    let mut rule = BuildRule::default();
    for (key, v) in attrs {
        let attr = scalar(key).map_err(|e| e.at(format!("build.{name}")))?;
        let path = || format!("build.{name}.{attr}");
        let list = || normalize_scalar_or_list(v).map_err(|e| e.at(path()));
        let text = || match v {
            Value::Null => Ok(String::new()),
            other => scalar(other).map_err(|e| e.at(path())),
        };
        match attr.as_str() {
            "features" => rule.features = list()?,
            "source" => rule.source = list()?,
            "use" => rule.uses = list()?,
            "cxxflags" => rule.cxxflags = list()?,
            "cflags" => rule.cflags = list()?,
            "defines" => rule.defines = list()?,
            "target" => rule.target = text()?,
            "install_path" => rule.install_path = text()?,
            _ => {
                tracing::debug!("build.{name}: keeping unrecognized attribute '{attr}'");
                rule.extra.insert(key.clone(), v.clone());
            }
        }
    }
    Ok(rule)
}
