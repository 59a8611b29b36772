//! # dsg-algo: Partitioning and Feature Encoding for Feeder Datasets
//!
//! This crate turns a validated feeder from `dsg-core` into small attributed
//! subgraphs and encodes them as fixed-width numeric tensors.
//!
//! ## Partitioning
//!
//! | Strategy | Emits |
//! |----------|-------|
//! | [`PartitionStrategy::Transformer`] | subtrees holding exactly one transformer |
//! | [`PartitionStrategy::Node`] | subtrees whose transformer count lies in a range |
//!
//! Both strategies share one [`graph::Arborescence`] rooted at the SOURCE bus.
//!
//! ## Feature Encoding
//!
//! - [`codec`]: schema-driven one-hot/scalar codec ([`FeatureRecord`])
//! - [`features`]: node (32 wide) and edge (11 wide) layouts
//! - [`featurize_gnn`]: per-subgraph tensors and PyTorch Geometric JSON
//!
//! ## Example
//!
//! ```ignore
//! use dsg_algo::{process_topology, PipelineConfig};
//!
//! let records: dsg_core::TopologyRecords = serde_json::from_str(&json)?;
//! let output = process_topology(&records, &PipelineConfig::default())?;
//! for sub in &output.subgraphs {
//!     println!("{}: {} nodes", sub.root, sub.tensors.num_nodes());
//! }
//! ```

pub mod codec;
pub mod features;
pub mod featurize_gnn;
pub mod graph;
pub mod pipeline;

pub use codec::{decode, encode, CategoricalField, FeatureRecord, FieldKind, RecordSchema};
pub use featurize_gnn::{featurize, PytorchGeometricJson, SubgraphTensors};
pub use graph::{partition_network, FeederSubgraph, PartitionStrategy};
pub use pipeline::{process_topology, EncodedSubgraph, PipelineConfig, TopologyOutput};
