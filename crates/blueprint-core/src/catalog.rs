//! Decoded catalog metadata consumed by the linker.
//!
//! Records keep the declaration order reported by the catalog reader. The
//! linker never relies on relations being listed before the relations that
//! reference them.

use serde::{Deserialize, Serialize};

use crate::types::{ColumnAttributes, DataType, FkAction, NOT_APPLICABLE};

/// Metadata for one database, as returned by a catalog reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub database: String,
    pub schemas: Vec<SchemaMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaMetadata {
    pub name: String,
    pub relations: Vec<RelationMetadata>,
}

/// Kind of relation represented in the catalog.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    #[default]
    Table,
    View,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationMetadata {
    pub name: String,
    #[serde(default)]
    pub kind: RelationKind,
    pub columns: Vec<ColumnMetadata>,
    #[serde(default)]
    pub indexes: Vec<IndexMetadata>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyMetadata>,
}

/// Column record with a normalized type. Absent sizes become [`NOT_APPLICABLE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    pub data_type: DataType,
    pub is_nullable: bool,
    pub has_default: bool,
    pub is_autoincrement: bool,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub is_unsigned: Option<bool>,
}

impl ColumnMetadata {
    pub fn attributes(&self) -> ColumnAttributes {
        ColumnAttributes {
            data_type: self.data_type.clone(),
            is_nullable: self.is_nullable,
            maximum_characters: self.length.unwrap_or(NOT_APPLICABLE),
            numeric_precision: self.precision.unwrap_or(NOT_APPLICABLE),
            numeric_scale: self.scale.unwrap_or(NOT_APPLICABLE),
            is_autoincrement: self.is_autoincrement,
            has_default: self.has_default,
            is_unsigned: self.is_unsigned,
        }
    }
}

/// Index definition preserving column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub name: String,
    pub is_unique: bool,
    #[serde(default)]
    pub is_primary: bool,
    pub columns: Vec<String>,
}

/// Foreign key definition preserving column ordering.
///
/// Without `referenced_schema` the target is looked up in the declaring
/// schema first, then in every other schema of the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyMetadata {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub referenced_schema: Option<String>,
    pub referenced_relation: String,
    pub referenced_columns: Vec<String>,
    #[serde(default)]
    pub on_update: FkAction,
    #[serde(default)]
    pub on_delete: FkAction,
}
