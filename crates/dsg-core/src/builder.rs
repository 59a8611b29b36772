//! Assembling a feeder graph from raw topology records.
//!
//! The records mirror what a network-model reader hands over: buses with their
//! voltage and phase configuration, lines/transformers between bus ids, and
//! per-bus load, generation and capacitor power. Power is accumulated onto the
//! buses before node types are derived, so [`NetworkBuilder::finish`] is the
//! single point where SOURCE is assigned and every other bus is classified.

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::diagnostics::{Diagnostics, IssueCategory};
use crate::error::{DsgError, DsgResult};
use crate::{DistEdge, DistNetwork, DistNode, EdgeAttrs, EdgeType, NodeAttrs, NodeType, NumPhase, PhaseType};

fn one() -> u32 {
    1
}

/// A bus as read from the network model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusRecord {
    pub id: String,
    /// Nominal voltage (kV)
    pub kv_level: f64,
    /// Phase configuration name, canonical or alias (e.g. "ABCN", "CA", "S1S2")
    pub phase_configuration: String,
    #[serde(default = "one")]
    pub node_count: u32,
}

impl BusRecord {
    pub fn new(id: impl Into<String>, kv_level: f64, phase_configuration: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kv_level,
            phase_configuration: phase_configuration.into(),
            node_count: 1,
        }
    }

    pub fn with_node_count(mut self, node_count: u32) -> Self {
        self.node_count = node_count;
        self
    }
}

/// Rating and sequence impedances of a line or transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricalParams {
    pub num_phase: u8,
    #[serde(default)]
    pub capacity_kva: f64,
    #[serde(default)]
    pub length_miles: f64,
    #[serde(default)]
    pub r0: f64,
    #[serde(default)]
    pub r1: f64,
    #[serde(default)]
    pub x0: f64,
    #[serde(default)]
    pub x1: f64,
}

impl ElectricalParams {
    pub fn new(num_phase: u8, capacity_kva: f64) -> Self {
        Self {
            num_phase,
            capacity_kva,
            length_miles: 0.0,
            r0: 0.0,
            r1: 0.0,
            x0: 0.0,
            x1: 0.0,
        }
    }
}

/// A line or transformer between two bus ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub endpoint_a: String,
    pub endpoint_b: String,
    pub kind: EdgeType,
    #[serde(flatten)]
    pub params: ElectricalParams,
}

impl EdgeRecord {
    pub fn line(
        endpoint_a: impl Into<String>,
        endpoint_b: impl Into<String>,
        num_phase: u8,
        capacity_kva: f64,
        length_miles: f64,
    ) -> Self {
        let mut params = ElectricalParams::new(num_phase, capacity_kva);
        params.length_miles = length_miles;
        Self {
            endpoint_a: endpoint_a.into(),
            endpoint_b: endpoint_b.into(),
            kind: EdgeType::Conductor,
            params,
        }
    }

    /// Transformer record; only the positive-sequence terms are usually modeled.
    pub fn transformer(
        endpoint_a: impl Into<String>,
        endpoint_b: impl Into<String>,
        num_phase: u8,
        capacity_kva: f64,
    ) -> Self {
        Self {
            endpoint_a: endpoint_a.into(),
            endpoint_b: endpoint_b.into(),
            kind: EdgeType::Transformer,
            params: ElectricalParams::new(num_phase, capacity_kva),
        }
    }

    pub fn with_impedance(mut self, r0: f64, r1: f64, x0: f64, x1: f64) -> Self {
        self.params.r0 = r0;
        self.params.r1 = r1;
        self.params.x0 = x0;
        self.params.x1 = x1;
        self
    }

    fn label(&self) -> String {
        format!("edge {}-{}", self.endpoint_a, self.endpoint_b)
    }
}

/// Power attached to a bus by a load, a generator or a capacitor bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InjectionKind {
    Load {
        kw: f64,
        #[serde(default)]
        kvar: f64,
    },
    Generation {
        kw: f64,
        #[serde(default)]
        kvar: f64,
    },
    /// Capacitor output is booked as reactive generation
    Capacitor { kvar: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusInjection {
    pub bus: String,
    #[serde(flatten)]
    pub kind: InjectionKind,
}

impl BusInjection {
    pub fn load(bus: impl Into<String>, kw: f64, kvar: f64) -> Self {
        Self {
            bus: bus.into(),
            kind: InjectionKind::Load { kw, kvar },
        }
    }

    pub fn generation(bus: impl Into<String>, kw: f64, kvar: f64) -> Self {
        Self {
            bus: bus.into(),
            kind: InjectionKind::Generation { kw, kvar },
        }
    }

    pub fn capacitor(bus: impl Into<String>, kvar: f64) -> Self {
        Self {
            bus: bus.into(),
            kind: InjectionKind::Capacitor { kvar },
        }
    }
}

/// Everything needed to build one feeder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyRecords {
    pub source_bus: String,
    pub buses: Vec<BusRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    #[serde(default)]
    pub injections: Vec<BusInjection>,
}

/// Staged builder: buses first, then edges and injections, then [`finish`](Self::finish).
#[derive(Debug)]
pub struct NetworkBuilder {
    source_bus: String,
    network: DistNetwork,
    diagnostics: Diagnostics,
}

impl NetworkBuilder {
    pub fn new(source_bus: impl Into<String>) -> Self {
        Self {
            source_bus: source_bus.into(),
            network: DistNetwork::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Add a bus with zero power aggregates.
    pub fn add_bus(&mut self, record: &BusRecord) -> DsgResult<NodeIndex> {
        let phase_type: PhaseType = record.phase_configuration.parse()?;
        let attrs = NodeAttrs::new(phase_type, record.node_count, record.kv_level);
        attrs.check(&format!("bus '{}'", record.id))?;
        self.network.add_bus(DistNode {
            name: record.id.clone(),
            attrs,
        })
    }

    /// Add a line or transformer between two previously added buses.
    pub fn add_edge(&mut self, record: &EdgeRecord) -> DsgResult<EdgeIndex> {
        let entity = record.label();
        let num_phase = NumPhase::from_count(record.params.num_phase).ok_or_else(|| {
            DsgError::invalid(
                &entity,
                "num_phase",
                format!("{} is not 1, 2 or 3", record.params.num_phase),
            )
        })?;
        let attrs = EdgeAttrs {
            num_phase,
            capacity_kva: record.params.capacity_kva,
            edge_type: record.kind,
            length_miles: record.params.length_miles,
            r0: record.params.r0,
            r1: record.params.r1,
            x0: record.params.x0,
            x1: record.params.x1,
        };
        attrs.check(&entity)?;
        let (idx, replaced) = self.network.connect(DistEdge {
            from_bus: record.endpoint_a.clone(),
            to_bus: record.endpoint_b.clone(),
            attrs,
        })?;
        if replaced {
            debug!(%entity, "edge record replaces an earlier record for the same bus pair");
            self.diagnostics.add_with_entity(
                IssueCategory::DuplicateEdge,
                "replaced attributes of an earlier record for the same bus pair",
                entity,
            );
        }
        Ok(idx)
    }

    /// Accumulate power onto a bus. Returns `false` when the bus is unknown,
    /// in which case the injection is skipped.
    pub fn add_injection(&mut self, injection: &BusInjection) -> DsgResult<bool> {
        let Some(idx) = self.network.bus_index(&injection.bus) else {
            debug!(bus = %injection.bus, "skipping injection on unknown bus");
            self.diagnostics.add_with_entity(
                IssueCategory::Injection,
                "injection references a bus that is not in the topology",
                format!("bus '{}'", injection.bus),
            );
            return Ok(false);
        };
        let entity = format!("injection at bus '{}'", injection.bus);
        let attrs = &mut self.network.node_mut(idx).attrs;
        match injection.kind {
            InjectionKind::Load { kw, kvar } => {
                attrs.active_demand_kw += finite(&entity, "kw", kw)?;
                attrs.reactive_demand_kw += finite(&entity, "kvar", kvar)?;
            }
            InjectionKind::Generation { kw, kvar } => {
                attrs.active_generation_kw += finite(&entity, "kw", kw)?;
                attrs.reactive_generation_kw += finite(&entity, "kvar", kvar)?;
            }
            InjectionKind::Capacitor { kvar } => {
                attrs.reactive_generation_kw += finite(&entity, "kvar", kvar)?;
            }
        }
        Ok(true)
    }

    /// Assign SOURCE to the declared source bus and derive every other bus's type.
    pub fn finish(mut self) -> DsgResult<(DistNetwork, Diagnostics)> {
        if self.network.bus_count() == 0 {
            return Err(DsgError::EmptyTopology);
        }
        let source = self
            .network
            .bus_index(&self.source_bus)
            .ok_or_else(|| DsgError::SourceNotFound(self.source_bus.clone()))?;

        let indices: Vec<NodeIndex> = self.network.graph().node_indices().collect();
        for idx in indices {
            let attrs = &mut self.network.node_mut(idx).attrs;
            attrs.node_type = if idx == source {
                NodeType::Source
            } else {
                attrs.derived_node_type()
            };
        }
        Ok((self.network, self.diagnostics))
    }
}

fn finite(entity: &str, field: &'static str, value: f64) -> DsgResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DsgError::invalid(entity, field, format!("{value} is not finite")))
    }
}

/// Build a feeder from a full set of records.
///
/// Tolerated issues are logged; use [`NetworkBuilder`] directly to collect them.
pub fn build_network(records: &TopologyRecords) -> DsgResult<DistNetwork> {
    let (network, diagnostics) = build_with_diagnostics(records)?;
    for issue in &diagnostics.issues {
        debug!(%issue, "tolerated topology issue");
    }
    Ok(network)
}

/// Build a feeder and return the tolerated issues alongside it.
pub fn build_with_diagnostics(records: &TopologyRecords) -> DsgResult<(DistNetwork, Diagnostics)> {
    let mut builder = NetworkBuilder::new(records.source_bus.clone());
    for bus in &records.buses {
        builder.add_bus(bus)?;
    }
    for edge in &records.edges {
        builder.add_edge(edge)?;
    }
    for injection in &records.injections {
        builder.add_injection(injection)?;
    }
    let (network, diagnostics) = builder.finish()?;
    info!(
        source = %records.source_bus,
        buses = network.bus_count(),
        edges = network.edge_count(),
        transformers = network.transformer_count(),
        "built feeder graph"
    );
    Ok((network, diagnostics))
}
