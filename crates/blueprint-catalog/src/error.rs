use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Structural problem found while validating a catalog document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    /// JSON pointer into the document, `/` for the root.
    pub path: String,
    pub message: String,
}

impl CatalogIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors raised while reading catalog metadata.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("catalog document has {} structural issue(s); first: {}", .0.len(), first_issue(.0))]
    Invalid(Vec<CatalogIssue>),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
    #[error("catalog document does not name an engine and none is configured")]
    MissingEngine,
    #[error(transparent)]
    Blueprint(#[from] blueprint_core::Error),
}

fn first_issue(issues: &[CatalogIssue]) -> String {
    issues
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".to_string())
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
