use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Core error type shared across blueprint crates.
///
/// Every variant aborts the build it was raised from. Unresolvable
/// references are not errors; they are collected as [`LinkError`]s.
#[derive(Debug, Error)]
pub enum Error {
    /// Catalog metadata that can never form a valid blueprint.
    #[error("invalid blueprint: {0}")]
    InvalidBlueprint(String),
    /// Two entities claim the same name within one scope.
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    /// A requested feature is not yet supported.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by blueprint crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a constraint the linker could not install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkErrorCode {
    UnknownSchema,
    UnknownRelation,
    AmbiguousRelation,
    UnknownColumn,
    UnsupportedConstraint,
}

impl LinkErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkErrorCode::UnknownSchema => "unknown_schema",
            LinkErrorCode::UnknownRelation => "unknown_relation",
            LinkErrorCode::AmbiguousRelation => "ambiguous_relation",
            LinkErrorCode::UnknownColumn => "unknown_column",
            LinkErrorCode::UnsupportedConstraint => "unsupported_constraint",
        }
    }
}

impl fmt::Display for LinkErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured record of a constraint left out of the finished graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkError {
    pub code: LinkErrorCode,
    /// Unique name of the relation declaring the constraint.
    pub relation: String,
    /// Unique name the constraint would have had.
    pub constraint: String,
    pub message: String,
    pub hint: Option<String>,
}

impl LinkError {
    /// Create a new link error.
    pub fn new(
        code: LinkErrorCode,
        relation: impl Into<String>,
        constraint: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            code,
            relation: relation.into(),
            constraint: constraint.into(),
            message: message.into(),
            hint,
        }
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.constraint, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}
