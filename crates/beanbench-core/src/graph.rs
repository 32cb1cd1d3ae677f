use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::schema::EntityGraph;

/// Summary of the reference graph structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceGraphSummary {
    pub nodes: usize,
    /// Distinct owner -> target pairs.
    pub edges: usize,
    /// Entities holding at least one reference to themselves.
    pub self_references: usize,
}

/// Report over entity reference edges.
///
/// Cycles are legal at the definition level; the report only tells
/// consumers whether a dependency order exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceGraphReport {
    pub summary: ReferenceGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic report of reference edges between primary entities.
pub fn build_reference_graph_report(graph: &EntityGraph) -> ReferenceGraphReport {
    let adjacency = build_adjacency(graph);
    let nodes = adjacency.len();
    let edges = adjacency.values().map(|targets| targets.len()).sum();
    let self_references = adjacency
        .iter()
        .filter(|(node, targets)| targets.contains(*node))
        .count();
    let summary = ReferenceGraphSummary {
        nodes,
        edges,
        self_references,
    };

    match toposort(&adjacency) {
        Ok(order) => ReferenceGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => ReferenceGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

// Edges point from the referenced entity to its owner so that the
// topological order lists targets before the entities holding them.
fn build_adjacency(graph: &EntityGraph) -> BTreeMap<String, BTreeSet<String>> {
    let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for entity in graph.primary_entities() {
        adjacency.entry(entity.qualified_name.clone()).or_default();

        for field in entity.reference_fields() {
            let Some(target) = graph.entity(field.target) else {
                continue;
            };
            adjacency
                .entry(target.qualified_name.clone())
                .or_default()
                .insert(entity.qualified_name.clone());
        }
    }

    adjacency
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<&str, usize> =
        graph.keys().map(|node| (node.as_str(), 0)).collect();

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.as_str()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<&str> = indegree
        .iter()
        .filter_map(|(node, count)| (*count == 0).then_some(*node))
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.to_string());

        if let Some(targets) = graph.get(node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target.as_str()) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.as_str());
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        let cycle_nodes = indegree
            .into_iter()
            .filter_map(|(node, count)| (count > 0).then(|| node.to_string()))
            .collect();
        Err(cycle_nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntityRole, Field, ReferenceField};

    #[test]
    fn self_reference_reports_cycle() {
        let mut graph = EntityGraph::new();
        let id = graph.add_entity("Bean0", "bench.beans.Bean0", EntityRole::Primary);
        graph
            .require_mut(id)
            .unwrap()
            .add_field(Field::Reference(ReferenceField::new("beanRef0", id)))
            .unwrap();

        let report = build_reference_graph_report(&graph);
        assert!(report.topo_order.is_none());
        assert_eq!(report.summary.self_references, 1);
        assert!(
            report
                .cycle
                .as_ref()
                .unwrap()
                .contains(&"bench.beans.Bean0".to_string())
        );
    }

    #[test]
    fn targets_are_ordered_before_owners() {
        let mut graph = EntityGraph::new();
        let owner = graph.add_entity("Bean0", "bench.beans.Bean0", EntityRole::Primary);
        let target = graph.add_entity("Bean1", "bench.beans.Bean1", EntityRole::Primary);
        graph
            .require_mut(owner)
            .unwrap()
            .add_field(Field::Reference(ReferenceField::new("beanRef0", target)))
            .unwrap();

        let report = build_reference_graph_report(&graph);
        assert_eq!(report.summary.nodes, 2);
        assert_eq!(report.summary.edges, 1);
        let order = report.topo_order.expect("expected toposort");
        let owner_idx = order
            .iter()
            .position(|item| item == "bench.beans.Bean0")
            .unwrap();
        let target_idx = order
            .iter()
            .position(|item| item == "bench.beans.Bean1")
            .unwrap();
        assert!(target_idx < owner_idx);
    }
}
