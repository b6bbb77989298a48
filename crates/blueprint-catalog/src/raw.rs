//! Catalog document as exported from a database engine.
//!
//! Types are kept as the engine spells them; normalization happens in the
//! mapper.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Root of a raw catalog document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RawCatalog {
    /// Engine identifier: `postgres`, `mysql` or `sqlite`. Falls back to the
    /// reader's configured engine when absent.
    #[serde(default)]
    pub engine: Option<String>,
    pub database: String,
    pub schemas: Vec<RawSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RawSchema {
    pub name: String,
    #[serde(default)]
    pub relations: Vec<RawRelation>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RawRelationKind {
    #[default]
    Table,
    View,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RawRelation {
    pub name: String,
    #[serde(default)]
    pub kind: RawRelationKind,
    pub columns: Vec<RawColumn>,
    #[serde(default)]
    pub indexes: Vec<RawIndex>,
    #[serde(default)]
    pub foreign_keys: Vec<RawForeignKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RawColumn {
    pub name: String,
    /// Engine type, e.g. `character varying(255)` or `int(10) unsigned`.
    pub data_type: String,
    #[serde(default = "default_true")]
    pub is_nullable: bool,
    /// Default expression, if any.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub is_autoincrement: bool,
    #[serde(default)]
    pub character_max_length: Option<i32>,
    #[serde(default)]
    pub numeric_precision: Option<i32>,
    #[serde(default)]
    pub numeric_scale: Option<i32>,
    /// Explicit signedness; takes precedence over the type text.
    #[serde(default)]
    pub is_unsigned: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RawIndex {
    pub name: String,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_primary: bool,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RawForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub referenced_schema: Option<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    /// Referential action as written by the engine, e.g. `CASCADE` or `SET NULL`.
    #[serde(default)]
    pub on_update: Option<String>,
    #[serde(default)]
    pub on_delete: Option<String>,
}

fn default_true() -> bool {
    true
}
