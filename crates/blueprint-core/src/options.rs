use serde::{Deserialize, Serialize};

use crate::catalog::{RelationKind, RelationMetadata};

/// Options that control which catalog entries become part of a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueprintOptions {
    /// Schema include list. `None` keeps every schema.
    pub schemas: Option<Vec<String>>,
    /// Relations to leave out, as `relation` or `schema.relation`.
    pub exclude_relations: Vec<String>,
    pub include_views: bool,
    /// Whether the engine allows indexes and foreign keys on views.
    pub view_constraints: bool,
}

impl Default for BlueprintOptions {
    fn default() -> Self {
        Self {
            schemas: None,
            exclude_relations: Vec::new(),
            include_views: true,
            view_constraints: false,
        }
    }
}

impl BlueprintOptions {
    pub fn includes_schema(&self, schema: &str) -> bool {
        match &self.schemas {
            Some(list) => list.iter().any(|item| item == schema),
            None => true,
        }
    }

    pub fn includes_relation(&self, schema: &str, relation: &RelationMetadata) -> bool {
        if relation.kind == RelationKind::View && !self.include_views {
            return false;
        }

        !self.exclude_relations.iter().any(|pattern| {
            match pattern.split_once('.') {
                Some((schema_part, relation_part)) => {
                    schema_part == schema && relation_part == relation.name
                }
                None => pattern == &relation.name,
            }
        })
    }

    /// Whether a relation of `kind` may own indexes and foreign keys.
    pub fn supports_constraints(&self, kind: RelationKind) -> bool {
        match kind {
            RelationKind::Table => true,
            RelationKind::View => self.view_constraints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(name: &str, kind: RelationKind) -> RelationMetadata {
        RelationMetadata {
            name: name.to_string(),
            kind,
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    #[test]
    fn exclusions_match_bare_and_qualified_names() {
        let opts = BlueprintOptions {
            exclude_relations: vec!["audit_log".to_string(), "billing.invoices".to_string()],
            ..BlueprintOptions::default()
        };

        assert!(!opts.includes_relation("public", &relation("audit_log", RelationKind::Table)));
        assert!(!opts.includes_relation("billing", &relation("invoices", RelationKind::Table)));
        assert!(opts.includes_relation("public", &relation("invoices", RelationKind::Table)));
    }

    #[test]
    fn views_follow_include_flag() {
        let opts = BlueprintOptions {
            include_views: false,
            ..BlueprintOptions::default()
        };
        assert!(!opts.includes_relation("public", &relation("active_users", RelationKind::View)));
        assert!(!opts.supports_constraints(RelationKind::View));
        assert!(opts.supports_constraints(RelationKind::Table));
    }

    #[test]
    fn schema_list_restricts_schemas() {
        let opts = BlueprintOptions {
            schemas: Some(vec!["public".to_string()]),
            ..BlueprintOptions::default()
        };
        assert!(opts.includes_schema("public"));
        assert!(!opts.includes_schema("audit"));
    }
}
