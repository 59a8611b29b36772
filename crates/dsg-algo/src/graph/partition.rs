//! Feeder partitioning into bounded sub-networks.
//!
//! Both strategies work on a validated radial feeder rooted at its SOURCE bus
//! and emit subtrees ("downstream of this bus") as independent networks.
//!
//! # Partitioning Strategies
//!
//! | Strategy | Candidate roots | Accepted when |
//! |----------|-----------------|---------------|
//! | [`PartitionStrategy::Transformer`] | one endpoint per transformer | subtree holds exactly one transformer |
//! | [`PartitionStrategy::Node`] | every bus | subtree transformer count in `[min, max]` |
//!
//! # Example
//!
//! ```ignore
//! use dsg_algo::graph::{partition_network, PartitionStrategy};
//!
//! let subgraphs = partition_network(
//!     &tree,
//!     &PartitionStrategy::Node { min_transformers: 1, max_transformers: 3 },
//! )?;
//! for sub in &subgraphs {
//!     println!("{}: {} buses", sub.root, sub.network.bus_count());
//! }
//! ```

use dsg_core::{DistNetwork, DsgError, DsgResult};
use petgraph::algo::is_cyclic_undirected;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::arborescence::Arborescence;

/// Strategy for partitioning the feeder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum PartitionStrategy {
    /// One subgraph per transformer whose downstream side holds no other
    /// transformer.
    #[default]
    Transformer,

    /// One subgraph per bus whose downstream transformer count lies in
    /// `[min_transformers, max_transformers]`.
    Node {
        min_transformers: usize,
        max_transformers: usize,
    },
}

/// A sub-network emitted by partitioning.
#[derive(Debug, Clone)]
pub struct FeederSubgraph {
    /// Name of the bus the subtree hangs from (SOURCE in `network`)
    pub root: String,
    pub transformer_count: usize,
    pub network: DistNetwork,
}

fn rooted_tree(network: &DistNetwork) -> DsgResult<Arborescence> {
    if is_cyclic_undirected(network.graph()) {
        let components = dsg_core::connected_components(network).len();
        let cycles = network.edge_count() + components - network.bus_count();
        return Err(DsgError::TopologyCycle { cycles });
    }
    Arborescence::rooted_at_source(network)
}

/// Subtrees around transformers that contain exactly one TRANSFORMER edge.
///
/// For each transformer (edge order) the endpoints are examined in record
/// order; the first whose downstream subtree holds any transformer is the
/// candidate, and it is kept only if that subtree holds exactly one.
pub fn partition_by_transformer(network: &DistNetwork) -> DsgResult<Vec<FeederSubgraph>> {
    let tree = rooted_tree(network)?;
    let graph = network.graph();
    let mut out = Vec::new();

    for edge in graph.edge_indices() {
        let record = &graph[edge];
        if !record.attrs.is_transformer() {
            continue;
        }
        let candidate = [&record.from_bus, &record.to_bus]
            .into_iter()
            .filter_map(|bus| network.bus_index(bus))
            .find(|&node| tree.transformers_below(node) > 0);
        let Some(root) = candidate else {
            continue;
        };
        let count = tree.transformers_below(root);
        if count != 1 {
            debug!(transformer = %record.label(), count, "candidate subtree holds more than one transformer");
            continue;
        }
        out.push(FeederSubgraph {
            root: network.node(root).name.clone(),
            transformer_count: count,
            network: tree.extract(network, root)?,
        });
    }
    debug!(subgraphs = out.len(), "transformer partition");
    Ok(out)
}

/// Subtrees hanging from every bus whose transformer count lies in
/// `[min_transformers, max_transformers]`.
pub fn partition_by_node(
    network: &DistNetwork,
    min_transformers: usize,
    max_transformers: usize,
) -> DsgResult<Vec<FeederSubgraph>> {
    if min_transformers > max_transformers {
        warn!(
            min_transformers,
            max_transformers, "empty transformer interval; node partition emits nothing"
        );
        return Ok(Vec::new());
    }
    let tree = rooted_tree(network)?;
    let mut out = Vec::new();
    for node in network.graph().node_indices() {
        if !tree.contains(node) {
            continue;
        }
        let count = tree.transformers_below(node);
        if (min_transformers..=max_transformers).contains(&count) {
            out.push(FeederSubgraph {
                root: network.node(node).name.clone(),
                transformer_count: count,
                network: tree.extract(network, node)?,
            });
        }
    }
    debug!(subgraphs = out.len(), min_transformers, max_transformers, "node partition");
    Ok(out)
}

/// Partition a feeder with the given strategy.
pub fn partition_network(
    network: &DistNetwork,
    strategy: &PartitionStrategy,
) -> DsgResult<Vec<FeederSubgraph>> {
    match *strategy {
        PartitionStrategy::Transformer => partition_by_transformer(network),
        PartitionStrategy::Node {
            min_transformers,
            max_transformers,
        } => partition_by_node(network, min_transformers, max_transformers),
    }
}
