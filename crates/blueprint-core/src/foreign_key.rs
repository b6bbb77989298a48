use serde::Serialize;

use crate::error::{Error, Result};
use crate::ids::{ColumnId, ForeignKeyId, RelationId};
use crate::owner::ColumnOwner;
use crate::types::FkAction;

/// A foreign key with both of its column lists resolved.
///
/// Column `i` of the referencing list maps to column `i` of the referenced
/// list.
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKeyBlueprint {
    id: ForeignKeyId,
    owner: RelationId,
    name: String,
    unique_name: String,
    referencing_object_name: String,
    referencing_columns: Vec<ColumnId>,
    referenced_relation: RelationId,
    referenced_table_name: String,
    referenced_unique_name: String,
    referenced_columns: Vec<ColumnId>,
    on_update: FkAction,
    on_delete: FkAction,
}

impl ForeignKeyBlueprint {
    pub fn new(
        id: ForeignKeyId,
        referencing: &(impl ColumnOwner + ?Sized),
        name: impl Into<String>,
        referencing_columns: Vec<ColumnId>,
        referenced: &(impl ColumnOwner + ?Sized),
        referenced_columns: Vec<ColumnId>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidBlueprint(format!(
                "foreign key name must not be empty on {}",
                referencing.unique_name()
            )));
        }

        let unique_name = format!("{}.{}", referencing.unique_name(), name);
        check_column_lists(&unique_name, referencing_columns.len(), referenced_columns.len())?;

        for (owner, columns) in [
            (referencing.columns(), &referencing_columns),
            (referenced.columns(), &referenced_columns),
        ] {
            if let Some(stray) = columns.iter().find(|id| !owner.contains_id(**id)) {
                return Err(Error::InvalidBlueprint(format!(
                    "foreign key {unique_name} lists column #{} outside its relation",
                    stray.index()
                )));
            }
        }

        Ok(Self {
            id,
            owner: referencing.relation_id(),
            name,
            unique_name,
            referencing_object_name: referencing.name().to_string(),
            referencing_columns,
            referenced_relation: referenced.relation_id(),
            referenced_table_name: referenced.name().to_string(),
            referenced_unique_name: referenced.unique_name().to_string(),
            referenced_columns,
            on_update: FkAction::NoAction,
            on_delete: FkAction::NoAction,
        })
    }

    pub fn with_actions(mut self, on_update: FkAction, on_delete: FkAction) -> Self {
        self.on_update = on_update;
        self.on_delete = on_delete;
        self
    }

    pub fn id(&self) -> ForeignKeyId {
        self.id
    }

    /// The relation declaring the constraint.
    pub fn owner(&self) -> RelationId {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    pub fn referencing_object_name(&self) -> &str {
        &self.referencing_object_name
    }

    pub fn referencing_columns(&self) -> &[ColumnId] {
        &self.referencing_columns
    }

    pub fn referenced_relation(&self) -> RelationId {
        self.referenced_relation
    }

    pub fn referenced_table_name(&self) -> &str {
        &self.referenced_table_name
    }

    pub fn referenced_unique_name(&self) -> &str {
        &self.referenced_unique_name
    }

    pub fn referenced_columns(&self) -> &[ColumnId] {
        &self.referenced_columns
    }

    pub fn on_update(&self) -> FkAction {
        self.on_update
    }

    pub fn on_delete(&self) -> FkAction {
        self.on_delete
    }

    /// `(referencing, referenced)` column pairs in declaration order.
    pub fn column_pairs(&self) -> impl Iterator<Item = (ColumnId, ColumnId)> + '_ {
        self.referencing_columns
            .iter()
            .copied()
            .zip(self.referenced_columns.iter().copied())
    }

    pub fn is_self_referencing(&self) -> bool {
        self.owner == self.referenced_relation
    }
}

/// Reject empty or length-mismatched column lists.
pub(crate) fn check_column_lists(
    constraint: &str,
    referencing: usize,
    referenced: usize,
) -> Result<()> {
    if referencing == 0 || referenced == 0 {
        return Err(Error::InvalidBlueprint(format!(
            "foreign key {constraint} must list at least one column on each side"
        )));
    }
    if referencing != referenced {
        return Err(Error::InvalidBlueprint(format!(
            "foreign key {constraint} maps {referencing} column(s) onto {referenced}"
        )));
    }
    Ok(())
}
