//! Catalog readers producing the metadata a blueprint is linked from.

pub mod engine;
pub mod error;
pub mod json;
pub mod mapper;
pub mod raw;
pub mod reader;

pub use engine::Engine;
pub use error::{CatalogError, CatalogIssue, Result};
pub use json::{JsonCatalogReader, catalog_json_schema, parse_catalog, validate_catalog_json};
pub use reader::CatalogReader;

pub use blueprint_core::{BlueprintOptions, CatalogSnapshot, DatabaseBlueprint};

/// Read a catalog and link it into a blueprint.
pub async fn load_blueprint(
    reader: &dyn CatalogReader,
    options: &BlueprintOptions,
) -> Result<DatabaseBlueprint> {
    let snapshot = reader.read(options).await?;
    Ok(blueprint_core::link(&snapshot, options)?)
}
