use serde::Serialize;

use crate::error::{Error, Result};
use crate::ids::{RelationId, SchemaId};
use crate::owner::NamedIds;

/// A named group of tables and views within one database.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaBlueprint {
    id: SchemaId,
    name: String,
    unique_name: String,
    relations: NamedIds<RelationId>,
}

impl SchemaBlueprint {
    pub fn new(id: SchemaId, database: &str, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidBlueprint(format!(
                "schema name must not be empty in database {database}"
            )));
        }
        Ok(Self {
            id,
            unique_name: format!("{database}.{name}"),
            name,
            relations: NamedIds::default(),
        })
    }

    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    pub fn relation_id(&self, name: &str) -> Option<RelationId> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> &NamedIds<RelationId> {
        &self.relations
    }

    pub(crate) fn insert_relation(&mut self, name: &str, id: RelationId) -> bool {
        self.relations.insert(name, id)
    }
}
