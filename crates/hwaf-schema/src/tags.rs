//! Tag declaration and application.
//!
//! A tag is declared once with a list of constituent labels and may then be
//! applied. Constituents are descriptive only: they are never expanded further,
//! even when a constituent happens to share its name with a declared tag.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One `declare-tags` entry: `{name: [constituent, ...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDecl {
    pub name: String,
    pub constituents: Vec<String>,
}

impl TagDecl {
    pub fn new(name: impl Into<String>, constituents: &[&str]) -> Self {
        Self {
            name: name.into(),
            constituents: constituents.iter().map(|&c| c.to_owned()).collect(),
        }
    }
}

/// Index declarations by name. Declaring the same tag twice is an error.
pub fn declared_tags(declare: &[TagDecl]) -> Result<BTreeMap<&str, &[String]>, ValidationError> {
    let mut table = BTreeMap::new();
    for (i, decl) in declare.iter().enumerate() {
        if table
            .insert(decl.name.as_str(), decl.constituents.as_slice())
            .is_some()
        {
            return Err(ValidationError::DuplicateTag {
                path: format!("configure.declare-tags[{i}]"),
                tag: decl.name.clone(),
            });
        }
    }
    Ok(table)
}

/// Compute the active tag set: every applied tag plus its listed constituents.
pub fn resolve_tags(
    declare: &[TagDecl],
    apply: &[String],
) -> Result<BTreeSet<String>, ValidationError> {
    let table = declared_tags(declare)?;
    let mut active = BTreeSet::new();
    for (i, tag) in apply.iter().enumerate() {
        let Some(constituents) = table.get(tag.as_str()) else {
            return Err(ValidationError::UndeclaredTag {
                path: format!("configure.apply-tags[{i}]"),
                tag: tag.clone(),
            });
        };
        active.insert(tag.clone());
        active.extend(constituents.iter().cloned());
    }
    tracing::debug!("resolved {} active tags from {} applied", active.len(), apply.len());
    Ok(active)
}
