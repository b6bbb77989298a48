use async_trait::async_trait;

use blueprint_core::{BlueprintOptions, CatalogSnapshot};

use crate::error::Result;

/// Trait implemented by sources of catalog metadata.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Identifier of the backend (e.g. `json`).
    fn engine(&self) -> &'static str;

    /// Read the catalog and return a normalized snapshot.
    async fn read(&self, options: &BlueprintOptions) -> Result<CatalogSnapshot>;
}
