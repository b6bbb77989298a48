use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jsonschema::JSONSchema;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde_json::Value;
use tracing::{debug, warn};

use blueprint_core::{BlueprintOptions, CatalogSnapshot};

use crate::engine::Engine;
use crate::error::{CatalogError, CatalogIssue, Result};
use crate::mapper::map_catalog;
use crate::raw::RawCatalog;
use crate::reader::CatalogReader;

/// Reads a catalog document exported to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonCatalogReader {
    path: PathBuf,
    engine: Option<Engine>,
}

impl JsonCatalogReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            engine: None,
        }
    }

    /// Engine assumed for documents that do not name one.
    pub fn with_engine(mut self, engine: Option<Engine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogReader for JsonCatalogReader {
    fn engine(&self) -> &'static str {
        "json"
    }

    async fn read(&self, options: &BlueprintOptions) -> Result<CatalogSnapshot> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| CatalogError::Io {
                    path: self.path.clone(),
                    source,
                })?;
        debug!(
            path = %self.path.display(),
            bytes = contents.len(),
            "catalog file loaded"
        );
        parse_catalog(&contents, self.engine, options)
    }
}

/// Emit the JSON Schema of catalog documents.
pub fn catalog_json_schema() -> RootSchema {
    schema_for!(RawCatalog)
}

/// Check a document against [`catalog_json_schema`].
///
/// Returns every violation found; an empty list means the document is valid.
pub fn validate_catalog_json(document: &Value) -> Result<Vec<CatalogIssue>> {
    let schema = serde_json::to_value(catalog_json_schema())?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| CatalogError::Schema(err.to_string()))?;

    let issues = match compiled.validate(document) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|error| {
                CatalogIssue::new(
                    normalized_json_pointer(&error.instance_path.to_string()),
                    error.to_string(),
                )
            })
            .collect(),
    };
    Ok(issues)
}

/// Validate, decode and normalize a catalog document.
pub fn parse_catalog(
    contents: &str,
    engine: Option<Engine>,
    options: &BlueprintOptions,
) -> Result<CatalogSnapshot> {
    let document: Value = serde_json::from_str(contents)?;

    let issues = validate_catalog_json(&document)?;
    if !issues.is_empty() {
        warn!(issues = issues.len(), "catalog document failed validation");
        return Err(CatalogError::Invalid(issues));
    }

    let raw: RawCatalog = serde_json::from_value(document)?;
    map_catalog(raw, engine, options)
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
