//! One topology in, a set of encoded subgraphs out.
//!
//! Build, validate, partition and featurize run back to back; the first
//! fatal error aborts the topology and nothing is returned for it.

use dsg_core::{build_with_diagnostics, validate_network, Diagnostics, DsgResult, TopologyRecords};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::featurize_gnn::{featurize, SubgraphTensors};
use crate::graph::{partition_network, PartitionStrategy};

/// How each topology is turned into subgraphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub partition: PartitionStrategy,
}

/// One accepted subgraph with its tensors.
#[derive(Debug, Clone)]
pub struct EncodedSubgraph {
    pub root: String,
    pub transformer_count: usize,
    pub tensors: SubgraphTensors,
}

/// Everything produced for one topology.
#[derive(Debug, Clone)]
pub struct TopologyOutput {
    /// Buses in the validated feeder
    pub num_buses: usize,
    pub num_edges: usize,
    pub num_transformers: usize,
    /// Buses dropped by largest-component retention
    pub dropped_buses: usize,
    /// Tolerated issues from building and validation
    pub diagnostics: Diagnostics,
    pub subgraphs: Vec<EncodedSubgraph>,
}

/// Run the full pipeline on one set of topology records.
pub fn process_topology(
    records: &TopologyRecords,
    config: &PipelineConfig,
) -> DsgResult<TopologyOutput> {
    let (network, mut diagnostics) = build_with_diagnostics(records)?;
    let (tree, report) = validate_network(network)?;
    let dropped_buses = report.dropped_buses;
    diagnostics.merge(report.diagnostics);

    let partitions = partition_network(&tree, &config.partition)?;
    let subgraphs = partitions
        .into_iter()
        .map(|sub| {
            Ok(EncodedSubgraph {
                tensors: featurize(&sub.network)?,
                root: sub.root,
                transformer_count: sub.transformer_count,
            })
        })
        .collect::<DsgResult<Vec<_>>>()?;

    info!(
        source = %records.source_bus,
        buses = tree.bus_count(),
        subgraphs = subgraphs.len(),
        dropped_buses,
        "processed topology"
    );

    Ok(TopologyOutput {
        num_buses: tree.bus_count(),
        num_edges: tree.edge_count(),
        num_transformers: tree.transformer_count(),
        dropped_buses,
        diagnostics,
        subgraphs,
    })
}
