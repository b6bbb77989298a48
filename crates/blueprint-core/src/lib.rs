//! In-memory blueprint of a relational database.
//!
//! A [`DatabaseBlueprint`] holds every schema, table, view, column, index and
//! foreign key of one database, cross-linked so that each column knows the
//! indexes covering it and the foreign keys on both of its sides. Graphs are
//! built from engine-neutral [`CatalogSnapshot`] metadata by [`link`].

pub mod catalog;
pub mod column;
pub mod database;
pub mod error;
pub mod foreign_key;
pub mod graph;
pub mod ids;
pub mod index;
pub mod linker;
pub mod options;
pub mod owner;
pub mod relationships;
pub mod schema;
pub mod types;

pub use catalog::{
    CatalogSnapshot, ColumnMetadata, ForeignKeyMetadata, IndexMetadata, RelationKind,
    RelationMetadata, SchemaMetadata,
};
pub use column::{ColumnBlueprint, ForeignKeyReference, IndexReference};
pub use database::DatabaseBlueprint;
pub use error::{Error, LinkError, LinkErrorCode, Result};
pub use foreign_key::ForeignKeyBlueprint;
pub use graph::{DependencyReport, DependencySummary};
pub use ids::{ColumnId, ForeignKeyId, IndexId, RelationId, SchemaId};
pub use index::IndexBlueprint;
pub use linker::link;
pub use options::BlueprintOptions;
pub use owner::{
    ColumnOwner, ConstraintSet, NamedIds, RelationBlueprint, TableBlueprint, ViewBlueprint,
};
pub use relationships::{Relationship, RelationshipKind};
pub use schema::SchemaBlueprint;
pub use types::{ColumnAttributes, DataType, FkAction, NOT_APPLICABLE};
