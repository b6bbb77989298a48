use blueprint_core::{
    BlueprintOptions, CatalogSnapshot, ColumnMetadata, ForeignKeyMetadata, IndexMetadata,
    RelationKind, RelationMetadata, SchemaMetadata,
};
use tracing::debug;

use crate::engine::{Engine, detect_unsigned, parse_action};
use crate::error::{CatalogError, Result};
use crate::raw::{RawCatalog, RawColumn, RawForeignKey, RawIndex, RawRelation, RawRelationKind};

/// Normalize a raw catalog into the snapshot consumed by the linker.
///
/// The engine named by the document wins over `fallback`. Schemas are sorted
/// by name; relations keep the order of the document.
pub fn map_catalog(
    raw: RawCatalog,
    fallback: Option<Engine>,
    options: &BlueprintOptions,
) -> Result<CatalogSnapshot> {
    let engine = match raw.engine.as_deref() {
        Some(name) => name.parse::<Engine>()?,
        None => fallback.ok_or(CatalogError::MissingEngine)?,
    };

    let mut schemas: Vec<SchemaMetadata> = raw
        .schemas
        .into_iter()
        .filter(|schema| options.includes_schema(&schema.name))
        .map(|schema| SchemaMetadata {
            relations: map_relations(engine, &schema.name, schema.relations, options),
            name: schema.name,
        })
        .collect();
    schemas.sort_by(|left, right| left.name.cmp(&right.name));

    debug!(
        engine = %engine,
        database = %raw.database,
        schemas = schemas.len(),
        "catalog mapped"
    );

    Ok(CatalogSnapshot {
        database: raw.database,
        schemas,
    })
}

fn map_relations(
    engine: Engine,
    schema: &str,
    raw: Vec<RawRelation>,
    options: &BlueprintOptions,
) -> Vec<RelationMetadata> {
    raw.into_iter()
        .map(|relation| RelationMetadata {
            name: relation.name,
            kind: match relation.kind {
                RawRelationKind::Table => RelationKind::Table,
                RawRelationKind::View => RelationKind::View,
            },
            columns: relation
                .columns
                .into_iter()
                .map(|column| map_column(engine, column))
                .collect(),
            indexes: relation.indexes.into_iter().map(map_index).collect(),
            foreign_keys: relation
                .foreign_keys
                .into_iter()
                .map(map_foreign_key)
                .collect(),
        })
        .filter(|relation| options.includes_relation(schema, relation))
        .collect()
}

/// Signedness is only kept for numeric types.
pub fn map_column(engine: Engine, raw: RawColumn) -> ColumnMetadata {
    let data_type = engine.normalize_type(&raw.data_type);
    let is_unsigned = data_type
        .is_numeric()
        .then(|| detect_unsigned(raw.is_unsigned, &raw.data_type))
        .flatten();
    ColumnMetadata {
        data_type,
        is_unsigned,
        name: raw.name,
        is_nullable: raw.is_nullable,
        has_default: raw.default.is_some(),
        is_autoincrement: raw.is_autoincrement,
        length: raw.character_max_length,
        precision: raw.numeric_precision,
        scale: raw.numeric_scale,
    }
}

pub fn map_index(raw: RawIndex) -> IndexMetadata {
    IndexMetadata {
        name: raw.name,
        is_unique: raw.is_unique || raw.is_primary,
        is_primary: raw.is_primary,
        columns: raw.columns,
    }
}

pub fn map_foreign_key(raw: RawForeignKey) -> ForeignKeyMetadata {
    ForeignKeyMetadata {
        on_update: parse_action(raw.on_update.as_deref()),
        on_delete: parse_action(raw.on_delete.as_deref()),
        name: raw.name,
        columns: raw.columns,
        referenced_schema: raw.referenced_schema,
        referenced_relation: raw.referenced_table,
        referenced_columns: raw.referenced_columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::DataType;

    fn column(name: &str, data_type: &str) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            data_type: data_type.to_string(),
            is_nullable: true,
            default: None,
            is_autoincrement: false,
            character_max_length: None,
            numeric_precision: None,
            numeric_scale: None,
            is_unsigned: None,
        }
    }

    fn catalog(engine: &str) -> RawCatalog {
        RawCatalog {
            engine: Some(engine.to_string()),
            database: "shop".to_string(),
            schemas: vec![
                crate::raw::RawSchema {
                    name: "sales".to_string(),
                    relations: vec![RawRelation {
                        name: "orders".to_string(),
                        kind: RawRelationKind::Table,
                        columns: vec![column("id", "int(10) unsigned")],
                        indexes: Vec::new(),
                        foreign_keys: Vec::new(),
                    }],
                },
                crate::raw::RawSchema {
                    name: "audit".to_string(),
                    relations: vec![RawRelation {
                        name: "order_history".to_string(),
                        kind: RawRelationKind::View,
                        columns: vec![column("id", "int")],
                        indexes: Vec::new(),
                        foreign_keys: Vec::new(),
                    }],
                },
            ],
        }
    }

    #[test]
    fn sorts_schemas_and_normalizes_columns() {
        let snapshot = map_catalog(catalog("mysql"), None, &BlueprintOptions::default()).unwrap();

        let names: Vec<&str> = snapshot.schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["audit", "sales"]);

        let id = &snapshot.schemas[1].relations[0].columns[0];
        assert_eq!(id.data_type, DataType::Integer);
        assert_eq!(id.is_unsigned, Some(true));
        assert_eq!(id.length, None);
        assert_eq!(id.attributes().maximum_characters, -1);
    }

    #[test]
    fn applies_relation_filters() {
        let options = BlueprintOptions {
            include_views: false,
            ..BlueprintOptions::default()
        };
        let snapshot = map_catalog(catalog("mysql"), None, &options).unwrap();
        assert!(snapshot.schemas[0].relations.is_empty());
        assert_eq!(snapshot.schemas[1].relations.len(), 1);
    }

    #[test]
    fn rejects_unknown_engine() {
        let err =
            map_catalog(catalog("oracle"), Some(Engine::Postgres), &BlueprintOptions::default())
                .unwrap_err();
        assert!(err.to_string().contains("unsupported engine"));
    }

    #[test]
    fn configured_engine_fills_the_gap() {
        let mut raw = catalog("mysql");
        raw.engine = None;
        let err = map_catalog(raw.clone(), None, &BlueprintOptions::default()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingEngine));

        let snapshot = map_catalog(raw, Some(Engine::Postgres), &BlueprintOptions::default())
            .unwrap();
        let id = &snapshot.schemas[1].relations[0].columns[0];
        assert_eq!(id.data_type, DataType::Other("int(10) unsigned".to_string()));
    }

    #[test]
    fn signedness_is_dropped_for_non_numeric_types() {
        let mut note = column("note", "varchar(140)");
        note.is_unsigned = Some(true);
        let note = map_column(Engine::Mysql, note);
        assert_eq!(note.data_type, DataType::String);
        assert_eq!(note.is_unsigned, None);

        let mut total = column("total", "decimal(10,2)");
        total.is_unsigned = Some(false);
        assert_eq!(map_column(Engine::Mysql, total).is_unsigned, Some(false));
    }

    #[test]
    fn primary_indexes_are_unique() {
        let index = map_index(RawIndex {
            name: "orders_pkey".to_string(),
            is_unique: false,
            is_primary: true,
            columns: vec!["id".to_string()],
        });
        assert!(index.is_unique);
    }
}
