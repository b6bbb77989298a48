use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::database::DatabaseBlueprint;
use crate::owner::ColumnOwner;

/// Node and edge counts of the foreign key dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DependencySummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Load order of relations implied by linked foreign keys.
///
/// Referenced relations come before the relations referencing them. When the
/// graph has a cycle `order` is `None` and `cycle` lists every relation that
/// could not be ordered.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyReport {
    pub summary: DependencySummary,
    pub order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

impl DatabaseBlueprint {
    /// Deterministic dependency order over relation unique names.
    ///
    /// Self-referencing keys do not create edges. Unlinked constraints are
    /// absent from the graph and therefore do not constrain the order.
    pub fn dependency_report(&self) -> DependencyReport {
        let graph = self.dependents();
        let summary = DependencySummary {
            nodes: graph.len(),
            edges: graph.values().map(BTreeSet::len).sum(),
        };

        match toposort(&graph) {
            Ok(order) => DependencyReport {
                summary,
                order: Some(order),
                cycle: None,
            },
            Err(cycle) => DependencyReport {
                summary,
                order: None,
                cycle: Some(cycle),
            },
        }
    }

    /// Referenced relation -> relations declaring a key onto it.
    fn dependents(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut graph: BTreeMap<&str, BTreeSet<&str>> = self
            .relations()
            .map(|relation| (relation.unique_name(), BTreeSet::new()))
            .collect();

        for foreign_key in self.foreign_keys() {
            if foreign_key.is_self_referencing() {
                continue;
            }
            let Some(referencing) = self.relation(foreign_key.owner()) else {
                continue;
            };
            graph
                .entry(foreign_key.referenced_unique_name())
                .or_default()
                .insert(referencing.unique_name());
        }

        graph
    }
}

fn toposort(graph: &BTreeMap<&str, BTreeSet<&str>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<&str, usize> = graph.keys().map(|node| (*node, 0)).collect();
    for dependents in graph.values() {
        for dependent in dependents {
            *indegree.entry(*dependent).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<&str> = indegree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| *node)
        .collect();
    let mut order = Vec::with_capacity(indegree.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.to_string());
        for dependent in graph.get(node).into_iter().flatten() {
            if let Some(count) = indegree.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if order.len() == indegree.len() {
        Ok(order)
    } else {
        Err(indegree
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(node, _)| node.to_string())
            .collect())
    }
}
