use serde::Serialize;

use crate::error::{Error, Result};
use crate::ids::{ColumnId, IndexId, RelationId};
use crate::owner::ColumnOwner;

/// An index and the ordered columns it covers.
#[derive(Debug, Clone, Serialize)]
pub struct IndexBlueprint {
    id: IndexId,
    owner: RelationId,
    name: String,
    unique_name: String,
    is_unique: bool,
    is_primary: bool,
    columns: Vec<ColumnId>,
}

impl IndexBlueprint {
    /// Build an index over columns already registered on `owner`.
    ///
    /// Column order is preserved; it matters for composite indexes.
    pub fn new(
        id: IndexId,
        owner: &(impl ColumnOwner + ?Sized),
        name: impl Into<String>,
        is_unique: bool,
        columns: Vec<ColumnId>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidBlueprint(format!(
                "index name must not be empty on {}",
                owner.unique_name()
            )));
        }

        let unique_name = format!("{}.{}", owner.unique_name(), name);
        if columns.is_empty() {
            return Err(Error::InvalidBlueprint(format!(
                "index {unique_name} covers no columns"
            )));
        }
        if let Some(stray) = columns.iter().find(|id| !owner.columns().contains_id(**id)) {
            return Err(Error::InvalidBlueprint(format!(
                "index {unique_name} covers column #{} which {} does not own",
                stray.index(),
                owner.unique_name()
            )));
        }

        Ok(Self {
            id,
            owner: owner.relation_id(),
            name,
            unique_name,
            is_unique,
            is_primary: false,
            columns,
        })
    }

    /// Mark the index as backing the primary key. Primary keys are unique.
    pub fn primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self.is_unique |= is_primary;
        self
    }

    pub fn id(&self) -> IndexId {
        self.id
    }

    pub fn owner(&self) -> RelationId {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    pub fn is_unique(&self) -> bool {
        self.is_unique
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    /// True when the index covers exactly `columns`, in any order.
    pub fn covers_exactly(&self, columns: &[ColumnId]) -> bool {
        self.columns.len() == columns.len() && columns.iter().all(|id| self.columns.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SchemaId;
    use crate::owner::{RelationBlueprint, TableBlueprint};
    use crate::schema::SchemaBlueprint;

    fn orders() -> RelationBlueprint {
        let schema = SchemaBlueprint::new(SchemaId(0), "app", "public").unwrap();
        let mut relation = RelationBlueprint::Table(
            TableBlueprint::new(RelationId(3), &schema, "orders").unwrap(),
        );
        relation.insert_column("id", ColumnId(10));
        relation.insert_column("user_id", ColumnId(11));
        relation
    }

    #[test]
    fn rejects_empty_column_list() {
        let err = IndexBlueprint::new(IndexId(0), &orders(), "orders_empty", false, Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("covers no columns"));
    }

    #[test]
    fn rejects_columns_of_other_relations() {
        let err = IndexBlueprint::new(IndexId(0), &orders(), "orders_bad", false, vec![ColumnId(1)])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBlueprint(_)));
    }

    #[test]
    fn keeps_column_order_and_primary_implies_unique() {
        let index = IndexBlueprint::new(
            IndexId(0),
            &orders(),
            "orders_pkey",
            false,
            vec![ColumnId(11), ColumnId(10)],
        )
        .unwrap()
        .primary(true);

        assert_eq!(index.unique_name(), "app.public.orders.orders_pkey");
        assert_eq!(index.columns(), &[ColumnId(11), ColumnId(10)]);
        assert!(index.is_unique());
        assert!(index.covers_exactly(&[ColumnId(10), ColumnId(11)]));
        assert!(!index.covers_exactly(&[ColumnId(10)]));
    }
}
