//! Stable arena identifiers for blueprint entities.
//!
//! Identifiers are positions in the arenas of one [`crate::DatabaseBlueprint`]
//! and are only meaningful within the graph that issued them.

use serde::Serialize;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the entity in its arena.
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Identifier of a [`crate::SchemaBlueprint`].
    SchemaId
);
arena_id!(
    /// Identifier of a table or view.
    RelationId
);
arena_id!(
    /// Identifier of a [`crate::ColumnBlueprint`].
    ColumnId
);
arena_id!(
    /// Identifier of an [`crate::IndexBlueprint`].
    IndexId
);
arena_id!(
    /// Identifier of a [`crate::ForeignKeyBlueprint`].
    ForeignKeyId
);
