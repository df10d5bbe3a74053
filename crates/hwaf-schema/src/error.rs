use std::fmt;
use thiserror::Error;

/// Coarse structural shape of a YAML node, as reported in type errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Null,
    Scalar,
    List,
    Mapping,
    Tagged,
}

impl Shape {
    pub fn of(value: &serde_yaml::Value) -> Self {
        use serde_yaml::Value;
        match value {
            Value::Null => Shape::Null,
            Value::Bool(_) | Value::Number(_) | Value::String(_) => Shape::Scalar,
            Value::Sequence(_) => Shape::List,
            Value::Mapping(_) => Shape::Mapping,
            Value::Tagged(_) => Shape::Tagged,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Null => write!(f, "null"),
            Shape::Scalar => write!(f, "scalar"),
            Shape::List => write!(f, "list"),
            Shape::Mapping => write!(f, "mapping"),
            Shape::Tagged => write!(f, "tagged value"),
        }
    }
}

/// What the document should have held at some location, and what it held instead.
///
/// Produced by the normalizer, which does not know where in the document it is
/// looking; [`Mismatch::at`] attaches the section path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: &'static str,
    pub found: Shape,
}

impl Mismatch {
    pub fn at(self, path: impl Into<String>) -> ValidationError {
        ValidationError::TypeMismatch {
            path: path.into(),
            expected: self.expected,
            found: self.found,
        }
    }
}

/// A single structural problem found while validating an hscript document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("document must declare a package")]
    DocumentEmpty,
    #[error("{path}: missing required field")]
    MissingRequiredField { path: String },
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: Shape,
    },
    #[error("{path}: tag '{tag}' is applied but never declared")]
    UndeclaredTag { path: String, tag: String },
    #[error("{path}: tag '{tag}' is declared more than once")]
    DuplicateTag { path: String, tag: String },
    #[error("{path}: unknown field '{field}'")]
    UnknownField { path: String, field: String },
}

impl ValidationError {
    /// Section path the error refers to, e.g. `configure.declare-tags[2]`.
    pub fn path(&self) -> &str {
        match self {
            ValidationError::DocumentEmpty => "",
            ValidationError::MissingRequiredField { path }
            | ValidationError::TypeMismatch { path, .. }
            | ValidationError::UndeclaredTag { path, .. }
            | ValidationError::DuplicateTag { path, .. }
            | ValidationError::UnknownField { path, .. } => path,
        }
    }
}

/// Every error collected from one validation pass, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// The error a caller should treat as the failure cause.
    pub fn first(&self) -> Option<&ValidationError> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "no validation errors"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => {
                write!(f, "{first}")?;
                for e in rest {
                    write!(f, "; {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationErrors {}
