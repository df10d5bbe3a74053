//! Coercion of loosely-typed YAML nodes into the strict shapes the hscript
//! schema expects.
//!
//! Two list flavours exist. *Scoping* lists (`apply-tags`, `env`, `authors`, ...)
//! must be written as lists. Build-rule attributes may be written either as a
//! single scalar or as a list, and a scalar is widened to one element. Neither
//! flavour splits strings on whitespace.

use crate::error::{Mismatch, Shape};
use serde_yaml::{Mapping, Value};

/// Render a scalar node as text.
pub fn scalar(value: &Value) -> Result<String, Mismatch> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Mismatch {
            expected: "scalar",
            found: Shape::of(other),
        }),
    }
}

/// A list of scalars. `null` reads as the empty list; a mapping or a bare
/// scalar is rejected.
pub fn normalize_list(value: &Value) -> Result<Vec<String>, Mismatch> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items.iter().map(list_item).collect(),
        other => Err(Mismatch {
            expected: "list",
            found: Shape::of(other),
        }),
    }
}

/// A scalar or a list of scalars. A scalar becomes a one-element list.
pub fn normalize_scalar_or_list(value: &Value) -> Result<Vec<String>, Mismatch> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items.iter().map(list_item).collect(),
        Value::Mapping(_) | Value::Tagged(_) => Err(Mismatch {
            expected: "scalar or list",
            found: Shape::of(value),
        }),
        scalar_value => Ok(vec![scalar(scalar_value)?]),
    }
}

/// A mapping; `null` reads as the empty mapping.
pub fn expect_mapping(value: &Value) -> Result<Mapping, Mismatch> {
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(m) => Ok(m.clone()),
        other => Err(Mismatch {
            expected: "mapping",
            found: Shape::of(other),
        }),
    }
}

/// The raw items of a list, for sections whose items have their own structure.
pub fn expect_sequence(value: &Value) -> Result<&[Value], Mismatch> {
    match value {
        Value::Null => Ok(&[]),
        Value::Sequence(items) => Ok(items),
        other => Err(Mismatch {
            expected: "list",
            found: Shape::of(other),
        }),
    }
}

/// A mapping holding exactly one entry, returned as `(key, value)`.
pub fn single_entry(value: &Value) -> Result<(String, &Value), Mismatch> {
    let wrong = Mismatch {
        expected: "single-entry mapping",
        found: Shape::of(value),
    };
    let Value::Mapping(m) = value else {
        return Err(wrong);
    };
    let mut iter = m.iter();
    match (iter.next(), iter.next()) {
        (Some((k, v)), None) => Ok((scalar(k)?, v)),
        _ => Err(wrong),
    }
}

fn list_item(value: &Value) -> Result<String, Mismatch> {
    scalar(value).map_err(|m| Mismatch {
        expected: "scalar list item",
        found: m.found,
    })
}
