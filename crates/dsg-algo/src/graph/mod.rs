//! Graph algorithms over validated feeders.
//!
//! - **Arborescence**: orient a radial feeder away from its SOURCE bus and
//!   count the transformers below every bus
//! - **Partitioning**: cut the feeder into bounded sub-networks for datasets
//!
//! ```ignore
//! use dsg_algo::graph::{partition_network, PartitionStrategy};
//!
//! let subgraphs = partition_network(&tree, &PartitionStrategy::Transformer)?;
//! for sub in &subgraphs {
//!     println!("{}: {} buses, {} transformers",
//!         sub.root, sub.network.bus_count(), sub.transformer_count);
//! }
//! ```

pub mod arborescence;
pub mod partition;

pub use arborescence::Arborescence;
pub use partition::{
    partition_by_node, partition_by_transformer, partition_network, FeederSubgraph,
    PartitionStrategy,
};
