use serde::Serialize;

use crate::database::DatabaseBlueprint;
use crate::foreign_key::ForeignKeyBlueprint;
use crate::ids::{ColumnId, ForeignKeyId, RelationId};

/// Cardinality of a relationship as seen from one relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// The relation declares the foreign key.
    BelongsTo,
    /// Another relation points here through uniquely indexed columns.
    HasOne,
    HasMany,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub foreign_key: ForeignKeyId,
    /// The relation on the other end.
    pub related: RelationId,
    pub local_columns: Vec<ColumnId>,
    pub related_columns: Vec<ColumnId>,
}

impl DatabaseBlueprint {
    /// Relationships of `relation` derived from linked foreign keys.
    ///
    /// Outgoing keys come first, then incoming ones, each in link order. A
    /// self-referencing key shows up on both sides.
    pub fn relationships(&self, relation: RelationId) -> Vec<Relationship> {
        let outgoing = self
            .foreign_keys()
            .filter(|fk| fk.owner() == relation)
            .map(|fk| Relationship {
                kind: RelationshipKind::BelongsTo,
                foreign_key: fk.id(),
                related: fk.referenced_relation(),
                local_columns: fk.referencing_columns().to_vec(),
                related_columns: fk.referenced_columns().to_vec(),
            });

        let incoming = self
            .foreign_keys()
            .filter(|fk| fk.referenced_relation() == relation)
            .map(|fk| Relationship {
                kind: if self.is_uniquely_indexed(fk) {
                    RelationshipKind::HasOne
                } else {
                    RelationshipKind::HasMany
                },
                foreign_key: fk.id(),
                related: fk.owner(),
                local_columns: fk.referenced_columns().to_vec(),
                related_columns: fk.referencing_columns().to_vec(),
            });

        outgoing.chain(incoming).collect()
    }

    fn is_uniquely_indexed(&self, fk: &ForeignKeyBlueprint) -> bool {
        self.relation(fk.owner()).is_some_and(|owner| {
            self.indexes_of(owner)
                .any(|index| index.is_unique() && index.covers_exactly(fk.referencing_columns()))
        })
    }
}
