//! # dsg-core: Distribution Feeder Topology Core
//!
//! Data structures for turning a distribution feeder into attributed graphs.
//!
//! ## Design Philosophy
//!
//! A feeder is modeled as a **simple undirected graph** where:
//! - **Nodes**: Buses, identified by name, carrying phase/voltage attributes and
//!   aggregated load/generation/capacitor power
//! - **Edges**: Lines (conductors) and transformers, identified by their unordered
//!   bus pair, carrying rating and sequence impedance attributes
//!
//! A validated feeder is a tree rooted at its single SOURCE bus. Downstream
//! crates partition that tree into sub-networks and encode them as feature
//! tensors; every sub-network owns copies of its node and edge records.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dsg_core::*;
//!
//! let mut builder = NetworkBuilder::new("src");
//! builder.add_bus(&BusRecord::new("src", 12.47, "ABC")).unwrap();
//! builder.add_bus(&BusRecord::new("load1", 0.24, "S1S2")).unwrap();
//! builder
//!     .add_edge(&EdgeRecord::transformer("src", "load1", 1, 25.0))
//!     .unwrap();
//! builder.add_injection(&BusInjection::load("load1", 4.2, 1.1)).unwrap();
//!
//! let (network, _diagnostics) = builder.finish().unwrap();
//! let (tree, report) = validate_network(network).unwrap();
//! assert_eq!(report.components, 1);
//! assert_eq!(tree.transformer_count(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`builder`] - Topology records and the staged network builder
//! - [`validate`] - Largest-component retention and tree checks
//! - [`graph_utils`] - Components, statistics and DOT export
//! - [`phase`] - Canonical phase configurations and aliases
//! - [`diagnostics`] - Tolerated issues collected along the way

use std::collections::HashMap;
use std::fmt;

use petgraph::visit::EdgeRef;
use petgraph::{prelude::*, Undirected};
use serde::{Deserialize, Serialize};

pub mod builder;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod phase;
pub mod validate;

pub use builder::{
    build_network, build_with_diagnostics, BusInjection, BusRecord, EdgeRecord, ElectricalParams,
    InjectionKind, NetworkBuilder, TopologyRecords,
};
pub use diagnostics::{Diagnostics, IssueCategory, TopologyIssue};
pub use error::{DsgError, DsgResult};
pub use graph_utils::*;
pub use petgraph::graph::{EdgeIndex, NodeIndex};
pub use phase::{PhaseType, PHASE_ALIASES};
pub use validate::{validate_network, ValidationReport};

/// Highest bus voltage level accepted, in kV
pub const MAX_KV_LEVEL: f64 = 700.0;

/// Role of a bus in the feeder.
///
/// Variant order is the one-hot slot order used by feature encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Source,
    Load,
    Generation,
    LoadAndGeneration,
    Other,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Source,
        NodeType::Load,
        NodeType::Generation,
        NodeType::LoadAndGeneration,
        NodeType::Other,
    ];

    /// Classify a non-source bus from whether it has active generation and
    /// active demand. Reactive-only power does not make a bus a load or a
    /// generator.
    pub fn derive(generation_present: bool, demand_present: bool) -> NodeType {
        match (generation_present, demand_present) {
            (false, false) => NodeType::Other,
            (true, false) => NodeType::Generation,
            (false, true) => NodeType::Load,
            (true, true) => NodeType::LoadAndGeneration,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Source => "SOURCE",
            NodeType::Load => "LOAD",
            NodeType::Generation => "GENERATION",
            NodeType::LoadAndGeneration => "LOAD_AND_GENERATION",
            NodeType::Other => "OTHER",
        }
    }
}

/// Number of phases carried by a line or transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NumPhase {
    One,
    Two,
    Three,
}

impl NumPhase {
    pub const ALL: [NumPhase; 3] = [NumPhase::One, NumPhase::Two, NumPhase::Three];

    pub fn from_count(count: u8) -> Option<NumPhase> {
        match count {
            1 => Some(NumPhase::One),
            2 => Some(NumPhase::Two),
            3 => Some(NumPhase::Three),
            _ => None,
        }
    }

    pub fn count(&self) -> u8 {
        match self {
            NumPhase::One => 1,
            NumPhase::Two => 2,
            NumPhase::Three => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NumPhase::One => "ONE",
            NumPhase::Two => "TWO",
            NumPhase::Three => "THREE",
        }
    }
}

impl TryFrom<u8> for NumPhase {
    type Error = DsgError;

    fn try_from(count: u8) -> Result<Self, Self::Error> {
        NumPhase::from_count(count)
            .ok_or_else(|| DsgError::invalid("edge", "num_phase", format!("{count} is not 1, 2 or 3")))
    }
}

impl From<NumPhase> for u8 {
    fn from(phase: NumPhase) -> Self {
        phase.count()
    }
}

/// Kind of edge between two buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    Transformer,
    #[serde(alias = "line")]
    Conductor,
}

impl EdgeType {
    pub const ALL: [EdgeType; 2] = [EdgeType::Transformer, EdgeType::Conductor];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Transformer => "TRANSFORMER",
            EdgeType::Conductor => "CONDUCTOR",
        }
    }
}

/// Attributes of a bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAttrs {
    pub node_type: NodeType,
    pub phase_type: PhaseType,
    /// Aggregated active load (kW)
    pub active_demand_kw: f64,
    /// Aggregated reactive load (kvar)
    pub reactive_demand_kw: f64,
    /// Aggregated active generation (kW)
    pub active_generation_kw: f64,
    /// Aggregated reactive generation including capacitors (kvar)
    pub reactive_generation_kw: f64,
    /// Number of terminals (phase and neutral nodes) at the bus
    pub num_nodes: u32,
    /// Nominal voltage (kV)
    pub kv_level: f64,
}

impl NodeAttrs {
    /// Attributes with zero power aggregates, classified OTHER until derived.
    pub fn new(phase_type: PhaseType, num_nodes: u32, kv_level: f64) -> Self {
        Self {
            node_type: NodeType::Other,
            phase_type,
            active_demand_kw: 0.0,
            reactive_demand_kw: 0.0,
            active_generation_kw: 0.0,
            reactive_generation_kw: 0.0,
            num_nodes,
            kv_level,
        }
    }

    /// Node type implied by the active power aggregates.
    pub fn derived_node_type(&self) -> NodeType {
        NodeType::derive(self.active_generation_kw != 0.0, self.active_demand_kw != 0.0)
    }

    /// Range checks applied to every bus record.
    pub fn check(&self, entity: &str) -> DsgResult<()> {
        if !(0.0..=MAX_KV_LEVEL).contains(&self.kv_level) {
            return Err(DsgError::invalid(
                entity,
                "kv_level",
                format!("{} is outside [0, {MAX_KV_LEVEL}]", self.kv_level),
            ));
        }
        if self.num_nodes == 0 {
            return Err(DsgError::invalid(entity, "num_nodes", "must be at least 1"));
        }
        let powers = [
            ("active_demand_kw", self.active_demand_kw),
            ("reactive_demand_kw", self.reactive_demand_kw),
            ("active_generation_kw", self.active_generation_kw),
            ("reactive_generation_kw", self.reactive_generation_kw),
        ];
        for (field, value) in powers {
            if !value.is_finite() {
                return Err(DsgError::invalid(entity, field, format!("{value} is not finite")));
            }
        }
        Ok(())
    }
}

/// Attributes of a line or transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeAttrs {
    pub num_phase: NumPhase,
    /// Thermal rating (kVA)
    pub capacity_kva: f64,
    pub edge_type: EdgeType,
    /// Conductor length (miles); zero for transformers
    pub length_miles: f64,
    /// Zero-sequence resistance
    pub r0: f64,
    /// Positive-sequence resistance
    pub r1: f64,
    /// Zero-sequence reactance
    pub x0: f64,
    /// Positive-sequence reactance
    pub x1: f64,
}

impl EdgeAttrs {
    pub fn is_transformer(&self) -> bool {
        self.edge_type == EdgeType::Transformer
    }

    pub fn check(&self, entity: &str) -> DsgResult<()> {
        for (field, value) in [
            ("capacity_kva", self.capacity_kva),
            ("length_miles", self.length_miles),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DsgError::invalid(
                    entity,
                    field,
                    format!("{value} must be a finite non-negative number"),
                ));
            }
        }
        for (field, value) in [("r0", self.r0), ("r1", self.r1), ("x0", self.x0), ("x1", self.x1)] {
            if !value.is_finite() {
                return Err(DsgError::invalid(entity, field, format!("{value} is not finite")));
            }
        }
        Ok(())
    }
}

/// A bus in the feeder graph.
#[derive(Debug, Clone, PartialEq)]
pub struct DistNode {
    pub name: String,
    pub attrs: NodeAttrs,
}

/// A line or transformer in the feeder graph.
///
/// `from_bus`/`to_bus` keep the endpoint order of the originating record;
/// partitioning examines transformer endpoints in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct DistEdge {
    pub from_bus: String,
    pub to_bus: String,
    pub attrs: EdgeAttrs,
}

impl DistEdge {
    pub fn label(&self) -> String {
        format!("{}-{}", self.from_bus, self.to_bus)
    }
}

/// An attributed feeder graph (petgraph `UnGraph<DistNode, DistEdge>`) with a
/// bus-name index.
///
/// Nodes and edges are only added through [`DistNetwork::add_bus`],
/// [`DistNetwork::connect`] and [`DistNetwork::add_edge_between`], which keeps
/// the name index and the simple-graph invariant in sync.
#[derive(Debug, Clone, Default)]
pub struct DistNetwork {
    graph: Graph<DistNode, DistEdge, Undirected>,
    bus_index: HashMap<String, NodeIndex>,
}

impl DistNetwork {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
            bus_index: HashMap::new(),
        }
    }

    /// Read-only view of the underlying graph.
    pub fn graph(&self) -> &Graph<DistNode, DistEdge, Undirected> {
        &self.graph
    }

    pub fn add_bus(&mut self, node: DistNode) -> DsgResult<NodeIndex> {
        if self.bus_index.contains_key(&node.name) {
            return Err(DsgError::DuplicateBus(node.name));
        }
        let name = node.name.clone();
        let idx = self.graph.add_node(node);
        self.bus_index.insert(name, idx);
        Ok(idx)
    }

    /// Connect the edge's named endpoints.
    ///
    /// A second edge between the same pair replaces the first edge's
    /// attributes; the returned flag is `true` in that case.
    pub fn connect(&mut self, edge: DistEdge) -> DsgResult<(EdgeIndex, bool)> {
        let a = self.require_bus(&edge, &edge.from_bus)?;
        let b = self.require_bus(&edge, &edge.to_bus)?;
        Ok(self.add_edge_between(a, b, edge))
    }

    /// Connect two existing nodes, replacing the attributes of an existing edge.
    pub fn add_edge_between(&mut self, a: NodeIndex, b: NodeIndex, edge: DistEdge) -> (EdgeIndex, bool) {
        match self.graph.find_edge(a, b) {
            Some(existing) => {
                self.graph[existing] = edge;
                (existing, true)
            }
            None => (self.graph.add_edge(a, b, edge), false),
        }
    }

    fn require_bus(&self, edge: &DistEdge, bus: &str) -> DsgResult<NodeIndex> {
        self.bus_index
            .get(bus)
            .copied()
            .ok_or_else(|| DsgError::UnknownBus {
                from: edge.from_bus.clone(),
                to: edge.to_bus.clone(),
                bus: bus.to_string(),
            })
    }

    pub fn bus_index(&self, name: &str) -> Option<NodeIndex> {
        self.bus_index.get(name).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &DistNode {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut DistNode {
        &mut self.graph[idx]
    }

    pub fn edge(&self, idx: EdgeIndex) -> &DistEdge {
        &self.graph[idx]
    }

    pub fn bus_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// First bus whose type is SOURCE, in node order.
    pub fn source(&self) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx].attrs.node_type == NodeType::Source)
    }

    pub fn transformer_count(&self) -> usize {
        self.graph
            .edge_weights()
            .filter(|edge| edge.attrs.is_transformer())
            .count()
    }

    /// New network holding copies of the given nodes (kept in this network's
    /// node order) and of every edge with both endpoints kept.
    pub fn induced(&self, keep: &[NodeIndex]) -> DistNetwork {
        let mut kept = vec![false; self.graph.node_count()];
        for idx in keep {
            kept[idx.index()] = true;
        }
        let mut remap = HashMap::with_capacity(keep.len());
        let mut out = DistNetwork::new();
        for idx in self.graph.node_indices().filter(|idx| kept[idx.index()]) {
            let node = self.graph[idx].clone();
            let name = node.name.clone();
            let new_idx = out.graph.add_node(node);
            out.bus_index.insert(name, new_idx);
            remap.insert(idx, new_idx);
        }
        for edge in self.graph.edge_references() {
            if let (Some(&a), Some(&b)) = (remap.get(&edge.source()), remap.get(&edge.target())) {
                out.graph.add_edge(a, b, edge.weight().clone());
            }
        }
        out
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats {
            num_buses: self.graph.node_count(),
            num_edges: self.graph.edge_count(),
            ..NetworkStats::default()
        };
        for node in self.graph.node_weights() {
            stats.total_demand_kw += node.attrs.active_demand_kw;
            stats.total_generation_kw += node.attrs.active_generation_kw;
            match node.attrs.node_type {
                NodeType::Load | NodeType::LoadAndGeneration => stats.num_load_buses += 1,
                _ => {}
            }
            if matches!(
                node.attrs.node_type,
                NodeType::Generation | NodeType::LoadAndGeneration
            ) {
                stats.num_generation_buses += 1;
            }
        }
        stats.num_transformers = self.transformer_count();
        stats
    }
}

/// Statistics about a feeder's size and aggregated power
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_edges: usize,
    pub num_transformers: usize,
    pub num_load_buses: usize,
    pub num_generation_buses: usize,
    pub total_demand_kw: f64,
    pub total_generation_kw: f64,
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} buses, {} edges ({} transformers), {} load buses ({:.1} kW), {} generation buses ({:.1} kW)",
            self.num_buses,
            self.num_edges,
            self.num_transformers,
            self.num_load_buses,
            self.total_demand_kw,
            self.num_generation_buses,
            self.total_generation_kw
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus(name: &str) -> DistNode {
        DistNode {
            name: name.to_string(),
            attrs: NodeAttrs::new(PhaseType::ABC, 3, 12.47),
        }
    }

    fn line(from: &str, to: &str, edge_type: EdgeType) -> DistEdge {
        DistEdge {
            from_bus: from.to_string(),
            to_bus: to.to_string(),
            attrs: EdgeAttrs {
                num_phase: NumPhase::Three,
                capacity_kva: 500.0,
                edge_type,
                length_miles: 0.2,
                r0: 0.3,
                r1: 0.1,
                x0: 0.9,
                x1: 0.4,
            },
        }
    }

    #[test]
    fn test_node_type_derivation_table() {
        assert_eq!(NodeType::derive(false, false), NodeType::Other);
        assert_eq!(NodeType::derive(true, false), NodeType::Generation);
        assert_eq!(NodeType::derive(false, true), NodeType::Load);
        assert_eq!(NodeType::derive(true, true), NodeType::LoadAndGeneration);
    }

    #[test]
    fn test_reactive_only_power_is_not_present() {
        let mut attrs = NodeAttrs::new(PhaseType::A, 1, 7.2);
        attrs.reactive_demand_kw = 12.0;
        attrs.reactive_generation_kw = 50.0;
        assert_eq!(attrs.derived_node_type(), NodeType::Other);
    }

    #[test]
    fn test_network_creation() {
        let mut network = DistNetwork::new();
        network.add_bus(bus("b1")).unwrap();
        network.add_bus(bus("b2")).unwrap();
        let (_, replaced) = network.connect(line("b1", "b2", EdgeType::Conductor)).unwrap();

        assert!(!replaced);
        assert_eq!(network.bus_count(), 2);
        assert_eq!(network.edge_count(), 1);
        let idx = network.bus_index("b2").unwrap();
        assert_eq!(network.node(idx).name, "b2");
    }

    #[test]
    fn test_duplicate_bus_rejected() {
        let mut network = DistNetwork::new();
        network.add_bus(bus("b1")).unwrap();
        assert_eq!(
            network.add_bus(bus("b1")),
            Err(DsgError::DuplicateBus("b1".into()))
        );
    }

    #[test]
    fn test_repeated_pair_replaces_edge() {
        let mut network = DistNetwork::new();
        network.add_bus(bus("b1")).unwrap();
        network.add_bus(bus("b2")).unwrap();
        network.connect(line("b1", "b2", EdgeType::Conductor)).unwrap();
        let (idx, replaced) = network.connect(line("b2", "b1", EdgeType::Transformer)).unwrap();

        assert!(replaced);
        assert_eq!(network.edge_count(), 1);
        assert!(network.edge(idx).attrs.is_transformer());
    }

    #[test]
    fn test_unknown_bus_rejected() {
        let mut network = DistNetwork::new();
        network.add_bus(bus("b1")).unwrap();
        let err = network.connect(line("b1", "ghost", EdgeType::Conductor)).unwrap_err();
        assert!(matches!(err, DsgError::UnknownBus { ref bus, .. } if bus == "ghost"));
    }

    #[test]
    fn test_induced_keeps_order_and_index() {
        let mut network = DistNetwork::new();
        let a = network.add_bus(bus("a")).unwrap();
        let b = network.add_bus(bus("b")).unwrap();
        let c = network.add_bus(bus("c")).unwrap();
        network.connect(line("a", "b", EdgeType::Conductor)).unwrap();
        network.connect(line("b", "c", EdgeType::Transformer)).unwrap();

        let sub = network.induced(&[c, a]);
        assert_eq!(sub.bus_count(), 2);
        assert_eq!(sub.edge_count(), 0);
        assert_eq!(sub.node(NodeIndex::new(0)).name, "a");
        assert_eq!(sub.bus_index("c"), Some(NodeIndex::new(1)));

        let sub = network.induced(&[b, c]);
        assert_eq!(sub.edge_count(), 1);
        assert_eq!(sub.transformer_count(), 1);
    }

    #[test]
    fn test_network_stats() {
        let mut network = DistNetwork::new();
        let mut load = bus("load");
        load.attrs.active_demand_kw = 10.0;
        load.attrs.node_type = NodeType::Load;
        let mut both = bus("both");
        both.attrs.active_demand_kw = 5.0;
        both.attrs.active_generation_kw = 7.5;
        both.attrs.node_type = NodeType::LoadAndGeneration;
        network.add_bus(load).unwrap();
        network.add_bus(both).unwrap();
        network.connect(line("load", "both", EdgeType::Transformer)).unwrap();

        let stats = network.stats();
        assert_eq!(stats.num_buses, 2);
        assert_eq!(stats.num_transformers, 1);
        assert_eq!(stats.num_load_buses, 2);
        assert_eq!(stats.num_generation_buses, 1);
        assert!((stats.total_demand_kw - 15.0).abs() < 1e-9);
        assert!(stats.to_string().contains("1 transformers"));
    }

    #[test]
    fn test_attribute_checks() {
        let mut attrs = NodeAttrs::new(PhaseType::ABC, 3, 700.0);
        assert!(attrs.check("bus").is_ok());
        attrs.kv_level = 700.5;
        assert!(matches!(
            attrs.check("bus"),
            Err(DsgError::InvalidAttribute { field: "kv_level", .. })
        ));

        let mut edge = line("a", "b", EdgeType::Conductor).attrs;
        assert!(edge.check("edge").is_ok());
        edge.length_miles = -1.0;
        assert!(matches!(
            edge.check("edge"),
            Err(DsgError::InvalidAttribute { field: "length_miles", .. })
        ));
    }

    #[test]
    fn test_num_phase_serde() {
        assert_eq!(serde_json::to_string(&NumPhase::Two).unwrap(), "2");
        assert_eq!(serde_json::from_str::<NumPhase>("3").unwrap(), NumPhase::Three);
        assert!(serde_json::from_str::<NumPhase>("4").is_err());
    }

    #[test]
    fn test_edge_type_accepts_line_alias() {
        assert_eq!(
            serde_json::from_str::<EdgeType>("\"line\"").unwrap(),
            EdgeType::Conductor
        );
        assert_eq!(
            serde_json::to_string(&EdgeType::Transformer).unwrap(),
            "\"transformer\""
        );
    }
}
