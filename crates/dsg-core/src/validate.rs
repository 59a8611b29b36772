//! Connectivity validation: keep the largest island, then require a tree.
//!
//! Distribution models regularly contain stray islands (disconnected
//! secondaries, switched-out sections). Those are dropped without failing the
//! feeder; only the component with the most buses survives, ties going to the
//! component met first in node order. A surviving component that still has a
//! loop rejects the whole feeder, because partitioning is defined on rooted
//! trees only.

use petgraph::algo::is_cyclic_undirected;
use serde::Serialize;
use tracing::warn;

use crate::diagnostics::{Diagnostics, IssueCategory};
use crate::error::{DsgError, DsgResult};
use crate::graph_utils::connected_components;
use crate::DistNetwork;

/// What validation kept and dropped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Connected components found before retention
    pub components: usize,
    pub kept_buses: usize,
    pub dropped_buses: usize,
    pub dropped_edges: usize,
    pub diagnostics: Diagnostics,
}

impl ValidationReport {
    /// Whether largest-component retention dropped anything.
    pub fn is_lossy(&self) -> bool {
        self.dropped_buses > 0
    }
}

/// Retain the largest connected component and require it to be a tree that
/// still contains the SOURCE bus.
pub fn validate_network(network: DistNetwork) -> DsgResult<(DistNetwork, ValidationReport)> {
    if network.bus_count() == 0 {
        return Err(DsgError::EmptyTopology);
    }
    let source_name = network
        .source()
        .map(|idx| network.node(idx).name.clone())
        .ok_or(DsgError::NoSourceBus)?;

    let components = connected_components(&network);
    let mut report = ValidationReport {
        components: components.len(),
        ..ValidationReport::default()
    };

    let retained = if components.len() > 1 {
        let mut largest = &components[0];
        for component in &components[1..] {
            if component.len() > largest.len() {
                largest = component;
            }
        }
        let kept = network.induced(largest);
        report.dropped_buses = network.bus_count() - kept.bus_count();
        report.dropped_edges = network.edge_count() - kept.edge_count();
        warn!(
            components = components.len(),
            kept = kept.bus_count(),
            dropped_buses = report.dropped_buses,
            dropped_edges = report.dropped_edges,
            "topology is disconnected; keeping the largest component"
        );
        report.diagnostics.add(
            IssueCategory::Connectivity,
            format!(
                "kept {} of {} buses from {} components; dropped {} edges",
                kept.bus_count(),
                network.bus_count(),
                components.len(),
                report.dropped_edges
            ),
        );
        kept
    } else {
        network
    };
    report.kept_buses = retained.bus_count();

    if is_cyclic_undirected(retained.graph()) {
        // single component: independent cycles = E - V + 1
        let cycles = retained.edge_count() + 1 - retained.bus_count();
        return Err(DsgError::TopologyCycle { cycles });
    }

    if retained.bus_index(&source_name).is_none() {
        return Err(DsgError::SourceNotFound(source_name));
    }

    Ok((retained, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_network, BusRecord, EdgeRecord, NodeType, TopologyRecords};

    fn records(source: &str, buses: &[&str], lines: &[(&str, &str)]) -> TopologyRecords {
        TopologyRecords {
            source_bus: source.into(),
            buses: buses
                .iter()
                .map(|name| BusRecord::new(*name, 12.47, "ABC"))
                .collect(),
            edges: lines
                .iter()
                .map(|(a, b)| EdgeRecord::line(*a, *b, 3, 400.0, 0.1))
                .collect(),
            injections: vec![],
        }
    }

    #[test]
    fn tree_passes_unchanged() {
        let net = build_network(&records(
            "a",
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("b", "d")],
        ))
        .unwrap();
        let (tree, report) = validate_network(net).unwrap();
        assert_eq!(tree.bus_count(), 4);
        assert_eq!(report.components, 1);
        assert!(!report.is_lossy());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn four_node_ring_is_rejected() {
        let net = build_network(&records(
            "a",
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "a")],
        ))
        .unwrap();
        assert_eq!(
            validate_network(net).unwrap_err(),
            DsgError::TopologyCycle { cycles: 1 }
        );
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let net = build_network(&records("a", &["a", "b"], &[("a", "b"), ("b", "b")])).unwrap();
        assert!(matches!(
            validate_network(net),
            Err(DsgError::TopologyCycle { .. })
        ));
    }

    #[test]
    fn keeps_only_largest_component() {
        // component A: 5 buses, component B: 2 buses
        let net = build_network(&records(
            "a1",
            &["b1", "a1", "a2", "b2", "a3", "a4", "a5"],
            &[
                ("a1", "a2"),
                ("a2", "a3"),
                ("a3", "a4"),
                ("a3", "a5"),
                ("b1", "b2"),
            ],
        ))
        .unwrap();
        let (tree, report) = validate_network(net).unwrap();

        assert_eq!(tree.bus_count(), 5);
        assert_eq!(tree.edge_count(), 4);
        for name in ["a1", "a2", "a3", "a4", "a5"] {
            assert!(tree.bus_index(name).is_some(), "missing {name}");
        }
        assert!(tree.bus_index("b1").is_none());
        assert_eq!(report.components, 2);
        assert_eq!(report.dropped_buses, 2);
        assert_eq!(report.dropped_edges, 1);
        assert_eq!(report.diagnostics.count(IssueCategory::Connectivity), 1);

        let src = tree.source().unwrap();
        assert_eq!(tree.node(src).attrs.node_type, NodeType::Source);
    }

    #[test]
    fn equal_components_keep_first_encountered() {
        let net = build_network(&records(
            "x1",
            &["x1", "y1", "x2", "y2"],
            &[("x1", "x2"), ("y1", "y2")],
        ))
        .unwrap();
        let (tree, _) = validate_network(net).unwrap();
        assert!(tree.bus_index("x1").is_some());
        assert!(tree.bus_index("y1").is_none());
    }

    #[test]
    fn source_outside_retained_component_is_fatal() {
        let net = build_network(&records(
            "s",
            &["s", "t", "a", "b", "c"],
            &[("s", "t"), ("a", "b"), ("b", "c")],
        ))
        .unwrap();
        assert_eq!(
            validate_network(net).unwrap_err(),
            DsgError::SourceNotFound("s".into())
        );
    }

    #[test]
    fn network_without_source_is_rejected() {
        let mut net = DistNetwork::new();
        net.add_bus(crate::DistNode {
            name: "a".into(),
            attrs: crate::NodeAttrs::new(crate::PhaseType::A, 1, 7.2),
        })
        .unwrap();
        let err = validate_network(net).unwrap_err();
        assert_eq!(err, DsgError::NoSourceBus);
        assert_eq!(err.to_string(), "Topology has no bus typed SOURCE");
    }

    #[test]
    fn empty_network_is_rejected() {
        assert_eq!(
            validate_network(DistNetwork::new()).unwrap_err(),
            DsgError::EmptyTopology
        );
    }

    #[test]
    fn cycle_in_retained_component_rejects_after_dropping_islands() {
        let net = build_network(&records(
            "a",
            &["a", "b", "c", "z"],
            &[("a", "b"), ("b", "c"), ("c", "a")],
        ))
        .unwrap();
        assert_eq!(
            validate_network(net).unwrap_err(),
            DsgError::TopologyCycle { cycles: 1 }
        );
    }
}
