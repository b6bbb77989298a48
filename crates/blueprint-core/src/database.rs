use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::column::ColumnBlueprint;
use crate::error::{Error, LinkError, Result};
use crate::foreign_key::ForeignKeyBlueprint;
use crate::ids::{ColumnId, ForeignKeyId, IndexId, RelationId, SchemaId};
use crate::index::IndexBlueprint;
use crate::owner::{ColumnOwner, ConstraintSet, NamedIds, RelationBlueprint};
use crate::schema::SchemaBlueprint;
use crate::types::ColumnAttributes;

/// Root of the blueprint graph for one database.
///
/// Entities live in per-kind arenas and refer to each other through ids.
/// Once returned by the linker the graph is only handed out by shared
/// reference.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseBlueprint {
    name: String,
    schema_names: NamedIds<SchemaId>,
    schemas: Vec<SchemaBlueprint>,
    relations: Vec<RelationBlueprint>,
    columns: Vec<ColumnBlueprint>,
    indexes: Vec<IndexBlueprint>,
    foreign_keys: Vec<ForeignKeyBlueprint>,
    link_errors: Vec<LinkError>,
    #[serde(skip)]
    relation_names: HashSet<String>,
    #[serde(skip)]
    column_lookup: HashMap<String, ColumnId>,
    #[serde(skip)]
    index_lookup: HashMap<String, IndexId>,
    #[serde(skip)]
    foreign_key_lookup: HashMap<String, ForeignKeyId>,
}

impl DatabaseBlueprint {
    pub(crate) fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidBlueprint(
                "database name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name,
            schema_names: NamedIds::default(),
            schemas: Vec::new(),
            relations: Vec::new(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            link_errors: Vec::new(),
            relation_names: HashSet::new(),
            column_lookup: HashMap::new(),
            index_lookup: HashMap::new(),
            foreign_key_lookup: HashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The database name is the root of every unique name in the graph.
    pub fn unique_name(&self) -> &str {
        &self.name
    }

    pub fn schemas(&self) -> impl Iterator<Item = &SchemaBlueprint> + '_ {
        self.schemas.iter()
    }

    pub fn schema(&self, id: SchemaId) -> Option<&SchemaBlueprint> {
        self.schemas.get(id.0)
    }

    pub fn find_schema(&self, name: &str) -> Option<&SchemaBlueprint> {
        self.schema_names.get(name).and_then(|id| self.schema(id))
    }

    pub fn relations(&self) -> impl Iterator<Item = &RelationBlueprint> + '_ {
        self.relations.iter()
    }

    pub fn relation(&self, id: RelationId) -> Option<&RelationBlueprint> {
        self.relations.get(id.0)
    }

    /// Relations of `schema` in declaration order.
    pub fn relations_in<'a>(
        &'a self,
        schema: &'a SchemaBlueprint,
    ) -> impl Iterator<Item = &'a RelationBlueprint> + 'a {
        schema.relations().ids().filter_map(move |id| self.relation(id))
    }

    pub fn find_relation(&self, schema: &str, name: &str) -> Option<&RelationBlueprint> {
        self.find_schema(schema)
            .and_then(|schema| schema.relation_id(name))
            .and_then(|id| self.relation(id))
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnBlueprint> + '_ {
        self.columns.iter()
    }

    pub fn column(&self, id: ColumnId) -> Option<&ColumnBlueprint> {
        self.columns.get(id.0)
    }

    /// Columns of `owner` in declaration order.
    pub fn columns_of<'a>(
        &'a self,
        owner: &'a (impl ColumnOwner + ?Sized),
    ) -> impl Iterator<Item = &'a ColumnBlueprint> + 'a {
        owner.columns().ids().filter_map(move |id| self.column(id))
    }

    pub fn column_of(&self, owner: &(impl ColumnOwner + ?Sized), name: &str) -> Option<&ColumnBlueprint> {
        owner.column_id(name).and_then(|id| self.column(id))
    }

    /// Look a column up by its dotted `database.schema.relation.column` path.
    pub fn find_column(&self, unique_name: &str) -> Option<&ColumnBlueprint> {
        self.column_lookup
            .get(unique_name)
            .and_then(|id| self.column(*id))
    }

    pub fn indexes(&self) -> impl Iterator<Item = &IndexBlueprint> + '_ {
        self.indexes.iter()
    }

    pub fn index(&self, id: IndexId) -> Option<&IndexBlueprint> {
        self.indexes.get(id.0)
    }

    pub fn indexes_of<'a>(
        &'a self,
        owner: &'a (impl ColumnOwner + ?Sized),
    ) -> impl Iterator<Item = &'a IndexBlueprint> + 'a {
        owner
            .constraints()
            .into_iter()
            .flat_map(|set| set.indexes().ids())
            .filter_map(move |id| self.index(id))
    }

    pub fn find_index(&self, unique_name: &str) -> Option<&IndexBlueprint> {
        self.index_lookup
            .get(unique_name)
            .and_then(|id| self.index(*id))
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKeyBlueprint> + '_ {
        self.foreign_keys.iter()
    }

    pub fn foreign_key(&self, id: ForeignKeyId) -> Option<&ForeignKeyBlueprint> {
        self.foreign_keys.get(id.0)
    }

    /// Foreign keys declared by `owner`.
    pub fn foreign_keys_of<'a>(
        &'a self,
        owner: &'a (impl ColumnOwner + ?Sized),
    ) -> impl Iterator<Item = &'a ForeignKeyBlueprint> + 'a {
        owner
            .constraints()
            .into_iter()
            .flat_map(|set| set.foreign_keys().ids())
            .filter_map(move |id| self.foreign_key(id))
    }

    pub fn find_foreign_key(&self, unique_name: &str) -> Option<&ForeignKeyBlueprint> {
        self.foreign_key_lookup
            .get(unique_name)
            .and_then(|id| self.foreign_key(*id))
    }

    /// Constraints the linker could not install.
    pub fn link_errors(&self) -> &[LinkError] {
        &self.link_errors
    }

    /// Link errors raised by constraints declared on `relation_unique_name`.
    pub fn link_errors_for<'a>(
        &'a self,
        relation_unique_name: &'a str,
    ) -> impl Iterator<Item = &'a LinkError> + 'a {
        self.link_errors
            .iter()
            .filter(move |error| error.relation == relation_unique_name)
    }

    /// True when every declared constraint was linked.
    pub fn is_complete(&self) -> bool {
        self.link_errors.is_empty()
    }

    pub(crate) fn add_schema(&mut self, name: &str) -> Result<SchemaId> {
        let id = SchemaId(self.schemas.len());
        let schema = SchemaBlueprint::new(id, &self.name, name)?;
        if !self.schema_names.insert(name, id) {
            return Err(Error::DuplicateName(schema.unique_name().to_string()));
        }
        self.schemas.push(schema);
        Ok(id)
    }

    pub(crate) fn add_relation(
        &mut self,
        schema: SchemaId,
        build: impl FnOnce(RelationId, &SchemaBlueprint) -> Result<RelationBlueprint>,
    ) -> Result<RelationId> {
        let id = RelationId(self.relations.len());
        let owner = self
            .schemas
            .get_mut(schema.0)
            .ok_or_else(|| Error::Other(format!("unknown schema id {}", schema.0)))?;
        let relation = build(id, &*owner)?;
        if self.relation_names.contains(relation.unique_name())
            || !owner.insert_relation(relation.name(), id)
        {
            return Err(Error::DuplicateName(relation.unique_name().to_string()));
        }
        self.relation_names.insert(relation.unique_name().to_string());
        self.relations.push(relation);
        Ok(id)
    }

    pub(crate) fn add_column(
        &mut self,
        relation: RelationId,
        name: &str,
        attributes: ColumnAttributes,
    ) -> Result<ColumnId> {
        let id = ColumnId(self.columns.len());
        let owner = self
            .relations
            .get_mut(relation.0)
            .ok_or_else(|| Error::Other(format!("unknown relation id {}", relation.0)))?;
        let column = ColumnBlueprint::new(id, &*owner, name, attributes)?;
        if self.column_lookup.contains_key(column.unique_name()) || !owner.insert_column(name, id) {
            return Err(Error::DuplicateName(column.unique_name().to_string()));
        }
        self.column_lookup.insert(column.unique_name().to_string(), id);
        self.columns.push(column);
        Ok(id)
    }

    pub(crate) fn next_index_id(&self) -> IndexId {
        IndexId(self.indexes.len())
    }

    pub(crate) fn next_foreign_key_id(&self) -> ForeignKeyId {
        ForeignKeyId(self.foreign_keys.len())
    }

    /// Store an index on its owner without touching the covered columns.
    pub(crate) fn insert_index(&mut self, index: IndexBlueprint) -> Result<IndexId> {
        let id = index.id();
        debug_assert_eq!(id, self.next_index_id());
        if self.index_lookup.contains_key(index.unique_name()) {
            return Err(Error::DuplicateName(index.unique_name().to_string()));
        }
        let constraints = self.constraints_mut(index.owner(), index.unique_name())?;
        if !constraints.insert_index(index.name(), id) {
            return Err(Error::DuplicateName(index.unique_name().to_string()));
        }
        self.index_lookup.insert(index.unique_name().to_string(), id);
        self.indexes.push(index);
        Ok(id)
    }

    /// Store a foreign key on its declaring relation without touching columns.
    pub(crate) fn insert_foreign_key(&mut self, foreign_key: ForeignKeyBlueprint) -> Result<ForeignKeyId> {
        let id = foreign_key.id();
        debug_assert_eq!(id, self.next_foreign_key_id());
        if self.foreign_key_lookup.contains_key(foreign_key.unique_name()) {
            return Err(Error::DuplicateName(foreign_key.unique_name().to_string()));
        }
        let constraints = self.constraints_mut(foreign_key.owner(), foreign_key.unique_name())?;
        if !constraints.insert_foreign_key(foreign_key.name(), id) {
            return Err(Error::DuplicateName(foreign_key.unique_name().to_string()));
        }
        self.foreign_key_lookup
            .insert(foreign_key.unique_name().to_string(), id);
        self.foreign_keys.push(foreign_key);
        Ok(id)
    }

    /// Register an index on every column it covers.
    pub(crate) fn wire_index(&mut self, id: IndexId) {
        let Some(index) = self.indexes.get(id.0) else {
            return;
        };
        for column in index.columns() {
            if let Some(column) = self.columns.get_mut(column.0) {
                column.add_index_reference(index);
            }
        }
    }

    /// Register a foreign key on both of its column lists.
    pub(crate) fn wire_foreign_key(&mut self, id: ForeignKeyId) {
        let Some(foreign_key) = self.foreign_keys.get(id.0) else {
            return;
        };
        for (referencing, referenced) in foreign_key.column_pairs() {
            if let Some(column) = self.columns.get_mut(referencing.0) {
                column.add_referenced_foreign_key(foreign_key);
            }
            if let Some(column) = self.columns.get_mut(referenced.0) {
                column.add_referencing_foreign_key(foreign_key);
            }
        }
    }

    pub(crate) fn push_link_error(&mut self, error: LinkError) {
        self.link_errors.push(error);
    }

    fn constraints_mut(
        &mut self,
        relation: RelationId,
        constraint: &str,
    ) -> Result<&mut ConstraintSet> {
        self.relations
            .get_mut(relation.0)
            .and_then(RelationBlueprint::constraints_mut)
            .ok_or_else(|| {
                Error::Unsupported(format!(
                    "{constraint} is declared on a relation that cannot own constraints"
                ))
            })
    }
}
