//! Relations and the column-owner capability they share.

use std::collections::HashSet;
use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::catalog::RelationKind;
use crate::error::{Error, Result};
use crate::ids::{ColumnId, ForeignKeyId, IndexId, RelationId, SchemaId};
use crate::schema::SchemaBlueprint;

/// Name-addressable identifiers kept in insertion order.
#[derive(Debug, Clone)]
pub struct NamedIds<T> {
    by_name: IndexMap<String, T>,
    ids: HashSet<T>,
}

impl<T> Default for NamedIds<T> {
    fn default() -> Self {
        Self {
            by_name: IndexMap::new(),
            ids: HashSet::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> NamedIds<T> {
    /// Returns false, leaving the set untouched, when `name` is taken.
    pub(crate) fn insert(&mut self, name: &str, id: T) -> bool {
        if self.by_name.contains_key(name) {
            return false;
        }
        self.by_name.insert(name.to_string(), id);
        self.ids.insert(id);
        true
    }

    pub fn get(&self, name: &str) -> Option<T> {
        self.by_name.get(name).copied()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn contains_id(&self, id: T) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = T> + '_ {
        self.by_name.values().copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_name.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, T)> + '_ {
        self.by_name.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl<T: Serialize> Serialize for NamedIds<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.by_name.serialize(serializer)
    }
}

/// Indexes and foreign keys owned by a relation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConstraintSet {
    indexes: NamedIds<IndexId>,
    foreign_keys: NamedIds<ForeignKeyId>,
}

impl ConstraintSet {
    pub fn indexes(&self) -> &NamedIds<IndexId> {
        &self.indexes
    }

    pub fn foreign_keys(&self) -> &NamedIds<ForeignKeyId> {
        &self.foreign_keys
    }

    pub(crate) fn insert_index(&mut self, name: &str, id: IndexId) -> bool {
        self.indexes.insert(name, id)
    }

    pub(crate) fn insert_foreign_key(&mut self, name: &str, id: ForeignKeyId) -> bool {
        self.foreign_keys.insert(name, id)
    }
}

/// Capability shared by every relation that can hold columns.
///
/// Index and foreign-key ownership is an optional extension exposed through
/// [`ColumnOwner::constraints`]; callers check it instead of matching on the
/// concrete relation type.
pub trait ColumnOwner {
    fn relation_id(&self) -> RelationId;
    fn schema_id(&self) -> SchemaId;
    fn name(&self) -> &str;
    /// Dotted path `database.schema.relation`.
    fn unique_name(&self) -> &str;
    fn kind(&self) -> RelationKind;
    fn columns(&self) -> &NamedIds<ColumnId>;
    fn constraints(&self) -> Option<&ConstraintSet>;

    fn column_id(&self, name: &str) -> Option<ColumnId> {
        self.columns().get(name)
    }

    fn column_names(&self) -> Vec<&str> {
        self.columns().names().collect()
    }

    fn supports_constraints(&self) -> bool {
        self.constraints().is_some()
    }

    fn index_names(&self) -> Vec<&str> {
        self.constraints()
            .map(|set| set.indexes().names().collect())
            .unwrap_or_default()
    }

    fn foreign_key_names(&self) -> Vec<&str> {
        self.constraints()
            .map(|set| set.foreign_keys().names().collect())
            .unwrap_or_default()
    }
}

fn relation_unique_name(schema: &SchemaBlueprint, name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(Error::InvalidBlueprint(format!(
            "relation name must not be empty in schema {}",
            schema.unique_name()
        )));
    }
    Ok(format!("{}.{}", schema.unique_name(), name))
}

/// A base table. Always owns indexes and foreign keys.
#[derive(Debug, Clone, Serialize)]
pub struct TableBlueprint {
    id: RelationId,
    schema: SchemaId,
    name: String,
    unique_name: String,
    columns: NamedIds<ColumnId>,
    constraints: ConstraintSet,
}

impl TableBlueprint {
    pub fn new(id: RelationId, schema: &SchemaBlueprint, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let unique_name = relation_unique_name(schema, &name)?;
        Ok(Self {
            id,
            schema: schema.id(),
            name,
            unique_name,
            columns: NamedIds::default(),
            constraints: ConstraintSet::default(),
        })
    }
}

impl ColumnOwner for TableBlueprint {
    fn relation_id(&self) -> RelationId {
        self.id
    }

    fn schema_id(&self) -> SchemaId {
        self.schema
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn unique_name(&self) -> &str {
        &self.unique_name
    }

    fn kind(&self) -> RelationKind {
        RelationKind::Table
    }

    fn columns(&self) -> &NamedIds<ColumnId> {
        &self.columns
    }

    fn constraints(&self) -> Option<&ConstraintSet> {
        Some(&self.constraints)
    }
}

/// A view. Owns indexes and foreign keys only when the engine allows it.
#[derive(Debug, Clone, Serialize)]
pub struct ViewBlueprint {
    id: RelationId,
    schema: SchemaId,
    name: String,
    unique_name: String,
    columns: NamedIds<ColumnId>,
    constraints: Option<ConstraintSet>,
}

impl ViewBlueprint {
    pub fn new(
        id: RelationId,
        schema: &SchemaBlueprint,
        name: impl Into<String>,
        supports_constraints: bool,
    ) -> Result<Self> {
        let name = name.into();
        let unique_name = relation_unique_name(schema, &name)?;
        Ok(Self {
            id,
            schema: schema.id(),
            name,
            unique_name,
            columns: NamedIds::default(),
            constraints: supports_constraints.then(ConstraintSet::default),
        })
    }
}

impl ColumnOwner for ViewBlueprint {
    fn relation_id(&self) -> RelationId {
        self.id
    }

    fn schema_id(&self) -> SchemaId {
        self.schema
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn unique_name(&self) -> &str {
        &self.unique_name
    }

    fn kind(&self) -> RelationKind {
        RelationKind::View
    }

    fn columns(&self) -> &NamedIds<ColumnId> {
        &self.columns
    }

    fn constraints(&self) -> Option<&ConstraintSet> {
        self.constraints.as_ref()
    }
}

/// Any relation stored in a database blueprint.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationBlueprint {
    Table(TableBlueprint),
    View(ViewBlueprint),
}

impl RelationBlueprint {
    pub fn as_table(&self) -> Option<&TableBlueprint> {
        match self {
            RelationBlueprint::Table(table) => Some(table),
            RelationBlueprint::View(_) => None,
        }
    }

    pub fn as_view(&self) -> Option<&ViewBlueprint> {
        match self {
            RelationBlueprint::View(view) => Some(view),
            RelationBlueprint::Table(_) => None,
        }
    }

    fn owner(&self) -> &dyn ColumnOwner {
        match self {
            RelationBlueprint::Table(table) => table,
            RelationBlueprint::View(view) => view,
        }
    }

    pub(crate) fn insert_column(&mut self, name: &str, id: ColumnId) -> bool {
        match self {
            RelationBlueprint::Table(table) => table.columns.insert(name, id),
            RelationBlueprint::View(view) => view.columns.insert(name, id),
        }
    }

    pub(crate) fn constraints_mut(&mut self) -> Option<&mut ConstraintSet> {
        match self {
            RelationBlueprint::Table(table) => Some(&mut table.constraints),
            RelationBlueprint::View(view) => view.constraints.as_mut(),
        }
    }
}

impl ColumnOwner for RelationBlueprint {
    fn relation_id(&self) -> RelationId {
        self.owner().relation_id()
    }

    fn schema_id(&self) -> SchemaId {
        self.owner().schema_id()
    }

    fn name(&self) -> &str {
        self.owner().name()
    }

    fn unique_name(&self) -> &str {
        self.owner().unique_name()
    }

    fn kind(&self) -> RelationKind {
        self.owner().kind()
    }

    fn columns(&self) -> &NamedIds<ColumnId> {
        self.owner().columns()
    }

    fn constraints(&self) -> Option<&ConstraintSet> {
        self.owner().constraints()
    }
}
