//! Three-pass construction of a [`DatabaseBlueprint`] from catalog metadata.
//!
//! 1. schemas, relations and columns, without cross references;
//! 2. indexes, registered on the columns they cover;
//! 3. foreign keys, resolved by name against the graph built in pass 1.
//!
//! The order in which the catalog lists relations never matters: every name
//! is addressable before the first cross reference is attempted.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::catalog::{CatalogSnapshot, ForeignKeyMetadata, RelationKind, RelationMetadata};
use crate::database::DatabaseBlueprint;
use crate::error::{Error, LinkError, LinkErrorCode, Result};
use crate::foreign_key::{ForeignKeyBlueprint, check_column_lists};
use crate::ids::{ColumnId, RelationId};
use crate::index::IndexBlueprint;
use crate::options::BlueprintOptions;
use crate::owner::{ColumnOwner, RelationBlueprint, TableBlueprint, ViewBlueprint};

const OUT_OF_SCOPE_HINT: &str =
    "the target may live outside the introspected scope or be excluded by options";

/// Build and link the blueprint of one database.
///
/// Malformed metadata and duplicate names abort the build. Foreign keys
/// whose targets cannot be resolved are left out and reported through
/// [`DatabaseBlueprint::link_errors`].
pub fn link(snapshot: &CatalogSnapshot, options: &BlueprintOptions) -> Result<DatabaseBlueprint> {
    let mut linker = Linker {
        graph: DatabaseBlueprint::new(&snapshot.database)?,
        options,
        pending: Vec::new(),
    };

    linker.create_entities(snapshot)?;
    linker.create_indexes()?;
    linker.create_foreign_keys()?;

    let graph = linker.graph;
    info!(
        database = %graph.name(),
        schemas = graph.schemas().count(),
        relations = graph.relations().count(),
        columns = graph.columns().count(),
        indexes = graph.indexes().count(),
        foreign_keys = graph.foreign_keys().count(),
        link_errors = graph.link_errors().len(),
        "blueprint linked"
    );
    Ok(graph)
}

struct PendingRelation<'a> {
    id: RelationId,
    metadata: &'a RelationMetadata,
}

struct Linker<'a> {
    graph: DatabaseBlueprint,
    options: &'a BlueprintOptions,
    pending: Vec<PendingRelation<'a>>,
}

impl<'a> Linker<'a> {
    fn create_entities(&mut self, snapshot: &'a CatalogSnapshot) -> Result<()> {
        let mut schemas = Vec::new();
        for schema in &snapshot.schemas {
            if !self.options.includes_schema(&schema.name) {
                debug!(schema = %schema.name, "schema excluded by options");
                continue;
            }
            schemas.push((self.graph.add_schema(&schema.name)?, schema));
        }

        for (schema_id, schema) in schemas {
            for relation in &schema.relations {
                if !self.options.includes_relation(&schema.name, relation) {
                    debug!(schema = %schema.name, relation = %relation.name, "relation excluded by options");
                    continue;
                }

                let view_constraints = self.options.supports_constraints(RelationKind::View);
                let id = self.graph.add_relation(schema_id, |id, owner| {
                    Ok(match relation.kind {
                        RelationKind::Table => {
                            RelationBlueprint::Table(TableBlueprint::new(id, owner, &relation.name)?)
                        }
                        RelationKind::View => RelationBlueprint::View(ViewBlueprint::new(
                            id,
                            owner,
                            &relation.name,
                            view_constraints,
                        )?),
                    })
                })?;
                self.pending.push(PendingRelation {
                    id,
                    metadata: relation,
                });
            }
        }

        for pending in &self.pending {
            for column in &pending.metadata.columns {
                self.graph
                    .add_column(pending.id, &column.name, column.attributes())?;
            }
        }

        debug!(
            pass = "entities",
            schemas = self.graph.schemas().count(),
            relations = self.pending.len(),
            columns = self.graph.columns().count(),
            "linker pass finished"
        );
        Ok(())
    }

    fn create_indexes(&mut self) -> Result<()> {
        for pending in &self.pending {
            let mut declared = HashSet::new();
            for index in &pending.metadata.indexes {
                let relation = relation_of(&self.graph, pending.id)?;
                let constraint = declare(relation, "index", &index.name, &mut declared)?;
                if index.columns.is_empty() {
                    return Err(Error::InvalidBlueprint(format!(
                        "index {constraint} covers no columns"
                    )));
                }
                let columns = local_columns(relation, "index", &index.name, &index.columns)?;

                if !relation.supports_constraints() {
                    let error = unsupported_on(relation, &index.name, "index");
                    record(&mut self.graph, error);
                    continue;
                }

                let blueprint = IndexBlueprint::new(
                    self.graph.next_index_id(),
                    relation,
                    &index.name,
                    index.is_unique,
                    columns,
                )?
                .primary(index.is_primary);

                let id = self.graph.insert_index(blueprint)?;
                self.graph.wire_index(id);
            }
        }

        debug!(
            pass = "indexes",
            indexes = self.graph.indexes().count(),
            "linker pass finished"
        );
        Ok(())
    }

    fn create_foreign_keys(&mut self) -> Result<()> {
        for pending in &self.pending {
            let mut declared = HashSet::new();
            for foreign_key in &pending.metadata.foreign_keys {
                let relation = relation_of(&self.graph, pending.id)?;
                let constraint = declare(relation, "foreign key", &foreign_key.name, &mut declared)?;
                check_column_lists(
                    &constraint,
                    foreign_key.columns.len(),
                    foreign_key.referenced_columns.len(),
                )?;
                let referencing =
                    local_columns(relation, "foreign key", &foreign_key.name, &foreign_key.columns)?;

                if !relation.supports_constraints() {
                    let error = unsupported_on(relation, &foreign_key.name, "foreign key");
                    record(&mut self.graph, error);
                    continue;
                }

                let resolved = resolve_target(&self.graph, relation, foreign_key, &constraint)
                    .and_then(|target| {
                        let columns = target_columns(relation, target, foreign_key, &constraint)?;
                        Ok((target, columns))
                    });
                let (target, referenced) = match resolved {
                    Ok(resolved) => resolved,
                    Err(error) => {
                        record(&mut self.graph, error);
                        continue;
                    }
                };

                let blueprint = ForeignKeyBlueprint::new(
                    self.graph.next_foreign_key_id(),
                    relation,
                    &foreign_key.name,
                    referencing,
                    target,
                    referenced,
                )?
                .with_actions(foreign_key.on_update, foreign_key.on_delete);

                let id = self.graph.insert_foreign_key(blueprint)?;
                self.graph.wire_foreign_key(id);
            }
        }

        debug!(
            pass = "foreign_keys",
            foreign_keys = self.graph.foreign_keys().count(),
            link_errors = self.graph.link_errors().len(),
            "linker pass finished"
        );
        Ok(())
    }
}

fn record(graph: &mut DatabaseBlueprint, error: LinkError) {
    warn!(
        code = %error.code,
        constraint = %error.constraint,
        error = %error.message,
        "constraint left unlinked"
    );
    graph.push_link_error(error);
}

/// Validate a constraint name and claim it on its relation. Returns the
/// constraint's unique name.
fn declare<'m>(
    relation: &RelationBlueprint,
    kind: &str,
    name: &'m str,
    declared: &mut HashSet<&'m str>,
) -> Result<String> {
    if name.is_empty() {
        return Err(Error::InvalidBlueprint(format!(
            "{kind} name must not be empty on {}",
            relation.unique_name()
        )));
    }
    let constraint = format!("{}.{name}", relation.unique_name());
    if !declared.insert(name) {
        return Err(Error::DuplicateName(constraint));
    }
    Ok(constraint)
}

fn relation_of(graph: &DatabaseBlueprint, id: RelationId) -> Result<&RelationBlueprint> {
    graph
        .relation(id)
        .ok_or_else(|| Error::Other(format!("relation id {} vanished during linking", id.index())))
}

/// Resolve column names on the declaring relation. A miss is malformed input.
fn local_columns(
    relation: &RelationBlueprint,
    kind: &str,
    constraint: &str,
    names: &[String],
) -> Result<Vec<ColumnId>> {
    names
        .iter()
        .map(|name| {
            relation.column_id(name).ok_or_else(|| {
                Error::InvalidBlueprint(format!(
                    "{kind} {}.{constraint} lists unknown column {name}",
                    relation.unique_name()
                ))
            })
        })
        .collect()
}

fn unsupported_on(relation: &RelationBlueprint, constraint: &str, kind: &str) -> LinkError {
    LinkError::new(
        LinkErrorCode::UnsupportedConstraint,
        relation.unique_name(),
        format!("{}.{constraint}", relation.unique_name()),
        format!("{kind} declared on a view that cannot own constraints"),
        Some("enable view_constraints when the engine supports them".to_string()),
    )
}

fn resolve_target<'g>(
    graph: &'g DatabaseBlueprint,
    relation: &RelationBlueprint,
    foreign_key: &ForeignKeyMetadata,
    constraint: &str,
) -> std::result::Result<&'g RelationBlueprint, LinkError> {
    let target = &foreign_key.referenced_relation;
    let unknown_relation = |searched: &str| {
        LinkError::new(
            LinkErrorCode::UnknownRelation,
            relation.unique_name(),
            constraint,
            format!("referenced relation {target} not found in {searched}"),
            Some(OUT_OF_SCOPE_HINT.to_string()),
        )
    };

    if let Some(schema_name) = &foreign_key.referenced_schema {
        let schema = graph.find_schema(schema_name).ok_or_else(|| {
            LinkError::new(
                LinkErrorCode::UnknownSchema,
                relation.unique_name(),
                constraint,
                format!("referenced schema {schema_name} is not part of the blueprint"),
                Some(OUT_OF_SCOPE_HINT.to_string()),
            )
        })?;
        return schema
            .relation_id(target)
            .and_then(|id| graph.relation(id))
            .ok_or_else(|| unknown_relation(schema.unique_name()));
    }

    let home = relation.schema_id();
    if let Some(found) = graph
        .schema(home)
        .and_then(|schema| schema.relation_id(target))
        .and_then(|id| graph.relation(id))
    {
        return Ok(found);
    }

    let candidates: Vec<&RelationBlueprint> = graph
        .schemas()
        .filter(|schema| schema.id() != home)
        .filter_map(|schema| schema.relation_id(target))
        .filter_map(|id| graph.relation(id))
        .collect();

    match candidates.as_slice() {
        [] => Err(unknown_relation(graph.unique_name())),
        [single] => Ok(*single),
        many => {
            let names: Vec<&str> = many.iter().map(|candidate| candidate.unique_name()).collect();
            Err(LinkError::new(
                LinkErrorCode::AmbiguousRelation,
                relation.unique_name(),
                constraint,
                format!("referenced relation {target} matches {}", names.join(", ")),
                Some("set referenced_schema on the foreign key".to_string()),
            ))
        }
    }
}

fn target_columns(
    relation: &RelationBlueprint,
    target: &RelationBlueprint,
    foreign_key: &ForeignKeyMetadata,
    constraint: &str,
) -> std::result::Result<Vec<ColumnId>, LinkError> {
    foreign_key
        .referenced_columns
        .iter()
        .map(|name| {
            target.column_id(name).ok_or_else(|| {
                LinkError::new(
                    LinkErrorCode::UnknownColumn,
                    relation.unique_name(),
                    constraint,
                    format!("referenced column {name} not found on {}", target.unique_name()),
                    None,
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMetadata, IndexMetadata, SchemaMetadata};
    use crate::types::{DataType, FkAction};

    fn column(name: &str) -> ColumnMetadata {
        ColumnMetadata {
            name: name.to_string(),
            data_type: DataType::Integer,
            is_nullable: false,
            has_default: false,
            is_autoincrement: false,
            length: None,
            precision: Some(32),
            scale: Some(0),
            is_unsigned: None,
        }
    }

    fn foreign_key(
        name: &str,
        columns: &[&str],
        schema: Option<&str>,
        target: &str,
        target_columns: &[&str],
    ) -> ForeignKeyMetadata {
        ForeignKeyMetadata {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            referenced_schema: schema.map(str::to_string),
            referenced_relation: target.to_string(),
            referenced_columns: target_columns.iter().map(|c| c.to_string()).collect(),
            on_update: FkAction::NoAction,
            on_delete: FkAction::NoAction,
        }
    }

    fn relation(name: &str, kind: RelationKind, columns: &[&str]) -> RelationMetadata {
        RelationMetadata {
            name: name.to_string(),
            kind,
            columns: columns.iter().map(|c| column(c)).collect(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    fn snapshot(schemas: Vec<(&str, Vec<RelationMetadata>)>) -> CatalogSnapshot {
        CatalogSnapshot {
            database: "app".to_string(),
            schemas: schemas
                .into_iter()
                .map(|(name, relations)| SchemaMetadata {
                    name: name.to_string(),
                    relations,
                })
                .collect(),
        }
    }

    #[test]
    fn foreign_keys_resolve_regardless_of_declaration_order() {
        let mut orders = relation("orders", RelationKind::Table, &["id", "user_id"]);
        orders.foreign_keys.push(foreign_key(
            "orders_user_id_fkey",
            &["user_id"],
            None,
            "users",
            &["id"],
        ));
        let users = relation("users", RelationKind::Table, &["id"]);

        let graph = link(
            &snapshot(vec![("public", vec![orders, users])]),
            &BlueprintOptions::default(),
        )
        .unwrap();

        assert!(graph.is_complete());
        let user_id = graph.find_column("app.public.orders.user_id").unwrap();
        assert!(user_id.references_another_table(Some("users")));
    }

    #[test]
    fn unqualified_targets_fall_back_to_other_schemas() {
        let mut orders = relation("orders", RelationKind::Table, &["id", "customer_id"]);
        orders.foreign_keys.push(foreign_key(
            "orders_customer_fkey",
            &["customer_id"],
            None,
            "customers",
            &["id"],
        ));

        let graph = link(
            &snapshot(vec![
                ("sales", vec![orders]),
                ("crm", vec![relation("customers", RelationKind::Table, &["id"])]),
            ]),
            &BlueprintOptions::default(),
        )
        .unwrap();

        let fk = graph
            .find_foreign_key("app.sales.orders.orders_customer_fkey")
            .unwrap();
        assert_eq!(fk.referenced_unique_name(), "app.crm.customers");
        let id = graph.find_column("app.crm.customers.id").unwrap();
        assert!(id.referenced_by_another_table(Some("orders")));
    }

    #[test]
    fn ambiguous_targets_are_reported() {
        let mut orders = relation("orders", RelationKind::Table, &["id", "event_id"]);
        orders.foreign_keys.push(foreign_key(
            "orders_event_fkey",
            &["event_id"],
            None,
            "events",
            &["id"],
        ));

        let graph = link(
            &snapshot(vec![
                ("sales", vec![orders]),
                ("audit", vec![relation("events", RelationKind::Table, &["id"])]),
                ("ops", vec![relation("events", RelationKind::Table, &["id"])]),
            ]),
            &BlueprintOptions::default(),
        )
        .unwrap();

        assert_eq!(graph.link_errors().len(), 1);
        assert_eq!(graph.link_errors()[0].code, LinkErrorCode::AmbiguousRelation);
        assert_eq!(graph.foreign_keys().count(), 0);
    }

    #[test]
    fn qualified_target_in_unknown_schema_is_reported() {
        let mut orders = relation("orders", RelationKind::Table, &["id", "user_id"]);
        orders.foreign_keys.push(foreign_key(
            "orders_user_fkey",
            &["user_id"],
            Some("identity"),
            "users",
            &["id"],
        ));

        let graph = link(
            &snapshot(vec![("public", vec![orders])]),
            &BlueprintOptions::default(),
        )
        .unwrap();

        assert_eq!(graph.link_errors()[0].code, LinkErrorCode::UnknownSchema);
        assert_eq!(
            graph.link_errors_for("app.public.orders").count(),
            1
        );
    }

    #[test]
    fn unknown_referenced_column_is_reported() {
        let mut orders = relation("orders", RelationKind::Table, &["id", "user_id"]);
        orders.foreign_keys.push(foreign_key(
            "orders_user_fkey",
            &["user_id"],
            None,
            "users",
            &["uuid"],
        ));

        let graph = link(
            &snapshot(vec![(
                "public",
                vec![orders, relation("users", RelationKind::Table, &["id"])],
            )]),
            &BlueprintOptions::default(),
        )
        .unwrap();

        assert_eq!(graph.link_errors()[0].code, LinkErrorCode::UnknownColumn);
        let user_id = graph.find_column("app.public.orders.user_id").unwrap();
        assert!(!user_id.references_another_table(None));
    }

    #[test]
    fn missing_local_column_fails_the_build() {
        let mut orders = relation("orders", RelationKind::Table, &["id"]);
        orders.foreign_keys.push(foreign_key(
            "orders_user_fkey",
            &["user_id"],
            None,
            "users",
            &["id"],
        ));

        let err = link(
            &snapshot(vec![(
                "public",
                vec![orders, relation("users", RelationKind::Table, &["id"])],
            )]),
            &BlueprintOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidBlueprint(_)));
    }

    #[test]
    fn mismatched_foreign_key_lists_fail_before_resolution() {
        let mut orders = relation("orders", RelationKind::Table, &["id", "user_id"]);
        orders.foreign_keys.push(foreign_key(
            "orders_user_fkey",
            &["user_id"],
            None,
            "ghost",
            &["id", "tenant_id"],
        ));

        let err = link(
            &snapshot(vec![("public", vec![orders])]),
            &BlueprintOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("maps 1 column(s) onto 2"));
    }

    #[test]
    fn view_constraints_depend_on_options() {
        let mut view = relation("active_users", RelationKind::View, &["id"]);
        view.indexes.push(IndexMetadata {
            name: "active_users_id_idx".to_string(),
            is_unique: true,
            is_primary: false,
            columns: vec!["id".to_string()],
        });
        let catalog = snapshot(vec![("public", vec![view])]);

        let plain = link(&catalog, &BlueprintOptions::default()).unwrap();
        assert_eq!(
            plain.link_errors()[0].code,
            LinkErrorCode::UnsupportedConstraint
        );
        assert_eq!(plain.indexes().count(), 0);

        let keyed = link(
            &catalog,
            &BlueprintOptions {
                view_constraints: true,
                ..BlueprintOptions::default()
            },
        )
        .unwrap();
        assert!(keyed.is_complete());
        assert!(
            keyed
                .find_column("app.public.active_users.id")
                .unwrap()
                .is_included_in_unique_index()
        );
    }

    #[test]
    fn malformed_view_constraints_fail_even_without_support() {
        let mut empty_index = relation("active_users", RelationKind::View, &["id"]);
        empty_index.indexes.push(IndexMetadata {
            name: "active_users_empty_idx".to_string(),
            is_unique: false,
            is_primary: false,
            columns: Vec::new(),
        });
        let err = link(
            &snapshot(vec![("public", vec![empty_index])]),
            &BlueprintOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("covers no columns"));

        let mut uneven_fk = relation("active_users", RelationKind::View, &["id"]);
        uneven_fk.foreign_keys.push(foreign_key(
            "active_users_fkey",
            &["id"],
            None,
            "users",
            &["id", "tenant_id"],
        ));
        let err = link(
            &snapshot(vec![(
                "public",
                vec![uneven_fk, relation("users", RelationKind::Table, &["id", "tenant_id"])],
            )]),
            &BlueprintOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidBlueprint(_)));
    }

    #[test]
    fn duplicate_foreign_key_names_fail_before_resolution() {
        let mut orders = relation("orders", RelationKind::Table, &["id", "parent_id"]);
        orders
            .foreign_keys
            .push(foreign_key("dup", &["parent_id"], None, "ghost", &["id"]));
        orders
            .foreign_keys
            .push(foreign_key("dup", &["parent_id"], None, "orders", &["id"]));

        let err = link(
            &snapshot(vec![("public", vec![orders])]),
            &BlueprintOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(name) if name == "app.public.orders.dup"));
    }

    #[test]
    fn duplicate_index_names_fail_on_views_without_support() {
        let mut view = relation("active_users", RelationKind::View, &["id"]);
        for _ in 0..2 {
            view.indexes.push(IndexMetadata {
                name: "active_users_id_idx".to_string(),
                is_unique: false,
                is_primary: false,
                columns: vec!["id".to_string()],
            });
        }

        let err = link(
            &snapshot(vec![("public", vec![view])]),
            &BlueprintOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
    }

    #[test]
    fn excluded_relations_become_unresolved_targets() {
        let mut orders = relation("orders", RelationKind::Table, &["id", "user_id"]);
        orders.foreign_keys.push(foreign_key(
            "orders_user_fkey",
            &["user_id"],
            None,
            "users",
            &["id"],
        ));
        let options = BlueprintOptions {
            exclude_relations: vec!["users".to_string()],
            ..BlueprintOptions::default()
        };

        let graph = link(
            &snapshot(vec![(
                "public",
                vec![orders, relation("users", RelationKind::Table, &["id"])],
            )]),
            &options,
        )
        .unwrap();

        assert!(graph.find_relation("public", "users").is_none());
        assert_eq!(graph.link_errors()[0].code, LinkErrorCode::UnknownRelation);
    }
}
