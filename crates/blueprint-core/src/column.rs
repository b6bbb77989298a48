use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::foreign_key::ForeignKeyBlueprint;
use crate::ids::{ColumnId, ForeignKeyId, IndexId, RelationId};
use crate::index::IndexBlueprint;
use crate::owner::ColumnOwner;
use crate::types::{ColumnAttributes, DataType};

/// What a column remembers about an index covering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexReference {
    pub index: IndexId,
    pub is_unique: bool,
}

/// What a column remembers about a foreign key on either side of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyReference {
    pub foreign_key: ForeignKeyId,
    pub name: String,
    /// Name of the relation declaring the constraint.
    pub referencing_object_name: String,
    pub referenced_table_name: String,
}

impl ForeignKeyReference {
    fn from_blueprint(foreign_key: &ForeignKeyBlueprint) -> Self {
        Self {
            foreign_key: foreign_key.id(),
            name: foreign_key.name().to_string(),
            referencing_object_name: foreign_key.referencing_object_name().to_string(),
            referenced_table_name: foreign_key.referenced_table_name().to_string(),
        }
    }
}

/// One column with its normalized metadata and resolved relationships.
///
/// The `add_*` methods only touch this column's own reference maps; the
/// linker is responsible for wiring both ends of a relationship.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnBlueprint {
    id: ColumnId,
    owner: RelationId,
    column_name: String,
    unique_name: String,
    #[serde(flatten)]
    attributes: ColumnAttributes,
    /// Keyed by index unique name.
    index_references: BTreeMap<String, IndexReference>,
    /// Constraints declared on this column, keyed by constraint unique name.
    referenced_foreign_keys: BTreeMap<String, ForeignKeyReference>,
    /// Constraints elsewhere pointing at this column, keyed by constraint unique name.
    referencing_foreign_keys: BTreeMap<String, ForeignKeyReference>,
}

impl ColumnBlueprint {
    pub fn new(
        id: ColumnId,
        owner: &(impl ColumnOwner + ?Sized),
        column_name: impl Into<String>,
        attributes: ColumnAttributes,
    ) -> Result<Self> {
        let column_name = column_name.into();
        if column_name.is_empty() {
            return Err(Error::InvalidBlueprint(format!(
                "column name must not be empty on {}",
                owner.unique_name()
            )));
        }

        let unique_name = format!("{}.{}", owner.unique_name(), column_name);
        attributes.validate(&unique_name)?;

        Ok(Self {
            id,
            owner: owner.relation_id(),
            column_name,
            unique_name,
            attributes,
            index_references: BTreeMap::new(),
            referenced_foreign_keys: BTreeMap::new(),
            referencing_foreign_keys: BTreeMap::new(),
        })
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    /// The table or view owning this column.
    pub fn owner(&self) -> RelationId {
        self.owner
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    pub fn attributes(&self) -> &ColumnAttributes {
        &self.attributes
    }

    pub fn data_type(&self) -> &DataType {
        &self.attributes.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.attributes.is_nullable
    }

    pub fn has_default(&self) -> bool {
        self.attributes.has_default
    }

    pub fn is_autoincrement(&self) -> bool {
        self.attributes.is_autoincrement
    }

    pub fn maximum_characters(&self) -> i32 {
        self.attributes.maximum_characters
    }

    pub fn numeric_precision(&self) -> i32 {
        self.attributes.numeric_precision
    }

    pub fn numeric_scale(&self) -> i32 {
        self.attributes.numeric_scale
    }

    pub fn is_unsigned(&self) -> Option<bool> {
        self.attributes.is_unsigned
    }

    pub fn index_references(&self) -> &BTreeMap<String, IndexReference> {
        &self.index_references
    }

    pub fn referenced_foreign_keys(&self) -> &BTreeMap<String, ForeignKeyReference> {
        &self.referenced_foreign_keys
    }

    pub fn referencing_foreign_keys(&self) -> &BTreeMap<String, ForeignKeyReference> {
        &self.referencing_foreign_keys
    }

    pub fn add_index_reference(&mut self, index: &IndexBlueprint) -> &mut Self {
        self.index_references.insert(
            index.unique_name().to_string(),
            IndexReference {
                index: index.id(),
                is_unique: index.is_unique(),
            },
        );
        self
    }

    pub fn add_referenced_foreign_key(&mut self, foreign_key: &ForeignKeyBlueprint) -> &mut Self {
        self.referenced_foreign_keys.insert(
            foreign_key.unique_name().to_string(),
            ForeignKeyReference::from_blueprint(foreign_key),
        );
        self
    }

    pub fn add_referencing_foreign_key(&mut self, foreign_key: &ForeignKeyBlueprint) -> &mut Self {
        self.referencing_foreign_keys.insert(
            foreign_key.unique_name().to_string(),
            ForeignKeyReference::from_blueprint(foreign_key),
        );
        self
    }

    pub fn is_included_in_index(&self) -> bool {
        !self.index_references.is_empty()
    }

    pub fn is_included_in_unique_index(&self) -> bool {
        self.index_references.values().any(|index| index.is_unique)
    }

    /// True when a constraint on this column points at another relation,
    /// optionally restricted to targets named `table`.
    pub fn references_another_table(&self, table: Option<&str>) -> bool {
        match table {
            None => !self.referenced_foreign_keys.is_empty(),
            Some(table) => self
                .referenced_foreign_keys
                .values()
                .any(|fk| fk.referenced_table_name == table),
        }
    }

    /// True when a constraint elsewhere points at this column, optionally
    /// restricted to constraints declared by `table`.
    pub fn referenced_by_another_table(&self, table: Option<&str>) -> bool {
        match table {
            None => !self.referencing_foreign_keys.is_empty(),
            Some(table) => self
                .referencing_foreign_keys
                .values()
                .any(|fk| fk.referencing_object_name == table),
        }
    }

    pub fn has_character_limit(&self) -> bool {
        self.attributes.maximum_characters > -1
    }

    /// Whether signedness was declared at all, regardless of its value.
    pub fn has_is_unsigned(&self) -> bool {
        self.attributes.is_unsigned.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SchemaId;
    use crate::owner::{RelationBlueprint, TableBlueprint};
    use crate::schema::SchemaBlueprint;

    fn users(columns: &[&str]) -> RelationBlueprint {
        let schema = SchemaBlueprint::new(SchemaId(0), "app", "public").unwrap();
        let mut relation =
            RelationBlueprint::Table(TableBlueprint::new(RelationId(0), &schema, "users").unwrap());
        for (position, name) in columns.iter().enumerate() {
            relation.insert_column(name, ColumnId(position));
        }
        relation
    }

    fn column(owner: &RelationBlueprint, id: usize, name: &str) -> ColumnBlueprint {
        ColumnBlueprint::new(
            ColumnId(id),
            owner,
            name,
            ColumnAttributes::new(DataType::Integer),
        )
        .unwrap()
    }

    #[test]
    fn composes_unique_name_from_owner() {
        let table = users(&["id"]);
        let id = column(&table, 0, "id");
        assert_eq!(id.unique_name(), "app.public.users.id");
        assert_eq!(id.owner(), RelationId(0));
    }

    #[test]
    fn rejects_empty_column_name() {
        let table = users(&[]);
        let err = ColumnBlueprint::new(
            ColumnId(0),
            &table,
            "",
            ColumnAttributes::new(DataType::Text),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidBlueprint(_)));
    }

    #[test]
    fn empty_index_set_is_not_unique() {
        let table = users(&["id"]);
        let id = column(&table, 0, "id");
        assert!(!id.is_included_in_index());
        assert!(!id.is_included_in_unique_index());
    }

    #[test]
    fn index_references_are_idempotent() {
        let table = users(&["id"]);
        let mut id = column(&table, 0, "id");
        let index =
            IndexBlueprint::new(IndexId(0), &table, "users_pkey", true, vec![ColumnId(0)]).unwrap();

        id.add_index_reference(&index).add_index_reference(&index);

        assert_eq!(id.index_references().len(), 1);
        assert!(id.index_references().contains_key("app.public.users.users_pkey"));
        assert!(id.is_included_in_index());
        assert!(id.is_included_in_unique_index());
    }

    #[test]
    fn foreign_key_references_are_idempotent() {
        let table = users(&["id", "manager_id"]);
        let mut id = column(&table, 0, "id");
        let mut manager_id = column(&table, 1, "manager_id");
        let fk = ForeignKeyBlueprint::new(
            ForeignKeyId(0),
            &table,
            "users_manager_id_fkey",
            vec![ColumnId(1)],
            &table,
            vec![ColumnId(0)],
        )
        .unwrap();

        manager_id
            .add_referenced_foreign_key(&fk)
            .add_referenced_foreign_key(&fk);
        id.add_referencing_foreign_key(&fk)
            .add_referencing_foreign_key(&fk);

        assert_eq!(manager_id.referenced_foreign_keys().len(), 1);
        assert!(manager_id.referencing_foreign_keys().is_empty());
        assert_eq!(id.referencing_foreign_keys().len(), 1);
        assert!(
            id.referencing_foreign_keys()
                .contains_key("app.public.users.users_manager_id_fkey")
        );
        assert!(manager_id.references_another_table(Some("users")));
    }

    #[test]
    fn non_unique_index_does_not_make_column_unique() {
        let table = users(&["id", "email"]);
        let mut email = column(&table, 1, "email");
        let index =
            IndexBlueprint::new(IndexId(0), &table, "users_email_idx", false, vec![ColumnId(1)])
                .unwrap();

        email.add_index_reference(&index);

        assert!(email.is_included_in_index());
        assert!(!email.is_included_in_unique_index());
    }

    #[test]
    fn signedness_presence_is_tri_state() {
        let table = users(&[]);
        let mut attributes = ColumnAttributes::new(DataType::Integer);
        let unknown = ColumnBlueprint::new(ColumnId(0), &table, "a", attributes.clone()).unwrap();
        attributes.is_unsigned = Some(false);
        let signed = ColumnBlueprint::new(ColumnId(1), &table, "b", attributes).unwrap();

        assert!(!unknown.has_is_unsigned());
        assert!(signed.has_is_unsigned());
        assert_eq!(signed.is_unsigned(), Some(false));
    }

    #[test]
    fn character_limit_follows_sentinel() {
        let table = users(&[]);
        let mut attributes = ColumnAttributes::new(DataType::String);
        let unlimited = ColumnBlueprint::new(ColumnId(0), &table, "a", attributes.clone()).unwrap();
        attributes.maximum_characters = 255;
        let limited = ColumnBlueprint::new(ColumnId(1), &table, "b", attributes).unwrap();

        assert!(!unlimited.has_character_limit());
        assert!(limited.has_character_limit());
    }
}
