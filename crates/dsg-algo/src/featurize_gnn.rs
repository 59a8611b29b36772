use dsg_core::{DistNetwork, DsgError, DsgResult, EdgeAttrs, NodeAttrs};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::codec::{decode, encode};

/// PyTorch Geometric JSON format structure.
///
/// Compatible with PyG's `torch_geometric.data.Data` when loaded:
/// ```python
/// import torch
/// data = Data(
///     x=torch.tensor(json['x']),
///     edge_index=torch.tensor(json['edge_index']),
///     edge_attr=torch.tensor(json['edge_attr']),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PytorchGeometricJson {
    /// Node features `[N, 32]` (PyG field: `x`)
    pub x: Vec<Vec<f64>>,
    /// Edge index in COO format `[2, E]`, parent to child
    pub edge_index: [Vec<usize>; 2],
    /// Edge attributes `[E, 11]` (PyG field: `edge_attr`)
    pub edge_attr: Vec<Vec<f64>>,
    /// Graph-level target; always null in generated datasets
    #[serde(default)]
    pub y: Option<serde_json::Value>,
    pub num_nodes: usize,
    /// Bus names in row order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_names: Vec<String>,
}

/// Feature tensors of one subgraph.
///
/// Row `i` of `node_features` describes `node_names[i]`; edge `k` runs from
/// node `edge_index.0[k]` to node `edge_index.1[k]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubgraphTensors {
    pub node_names: Vec<String>,
    pub node_features: Vec<Vec<f64>>,
    pub edge_index: (Vec<usize>, Vec<usize>),
    pub edge_features: Vec<Vec<f64>>,
}

impl SubgraphTensors {
    pub fn num_nodes(&self) -> usize {
        self.node_features.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_features.len()
    }

    /// Convert to PyTorch Geometric JSON format.
    pub fn to_pytorch_geometric_json(&self) -> PytorchGeometricJson {
        PytorchGeometricJson {
            x: self.node_features.clone(),
            edge_index: [self.edge_index.0.clone(), self.edge_index.1.clone()],
            edge_attr: self.edge_features.clone(),
            y: None,
            num_nodes: self.num_nodes(),
            node_names: self.node_names.clone(),
        }
    }

    /// Rebuild tensors from PyTorch Geometric JSON and check them.
    pub fn from_pytorch_geometric_json(pyg: &PytorchGeometricJson) -> DsgResult<Self> {
        if pyg.x.len() != pyg.num_nodes {
            return Err(DsgError::InvalidTensors(format!(
                "x has {} rows but num_nodes is {}",
                pyg.x.len(),
                pyg.num_nodes
            )));
        }
        let tensors = Self {
            node_names: pyg.node_names.clone(),
            node_features: pyg.x.clone(),
            edge_index: (pyg.edge_index[0].clone(), pyg.edge_index[1].clone()),
            edge_features: pyg.edge_attr.clone(),
        };
        tensors.validate()?;
        Ok(tensors)
    }

    /// Validate that the tensors are well-formed.
    ///
    /// Checks:
    /// - Edge index lengths match the edge feature rows
    /// - Edge index bounds: all src/dst indices must be < num_nodes
    /// - Names, when present, match the node feature rows
    /// - Feature width consistency for nodes and for edges
    pub fn validate(&self) -> DsgResult<()> {
        let num_nodes = self.num_nodes();
        let num_edges = self.num_edges();

        if !self.node_names.is_empty() && self.node_names.len() != num_nodes {
            return Err(DsgError::InvalidTensors(format!(
                "{} node names for {num_nodes} node rows",
                self.node_names.len()
            )));
        }
        if self.edge_index.0.len() != num_edges || self.edge_index.1.len() != num_edges {
            return Err(DsgError::InvalidTensors(format!(
                "edge_index lengths ({}, {}) != edge rows ({num_edges})",
                self.edge_index.0.len(),
                self.edge_index.1.len()
            )));
        }
        for (i, (&src, &dst)) in self.edge_index.0.iter().zip(&self.edge_index.1).enumerate() {
            if src >= num_nodes || dst >= num_nodes {
                return Err(DsgError::InvalidTensors(format!(
                    "edge {i} ({src}, {dst}) out of bounds for {num_nodes} nodes"
                )));
            }
        }
        uniform_width("node", &self.node_features)?;
        uniform_width("edge", &self.edge_features)?;
        Ok(())
    }

    /// Decode every node row back into attributes.
    pub fn node_attrs(&self) -> DsgResult<Vec<NodeAttrs>> {
        self.node_features.iter().map(|row| decode(row)).collect()
    }

    /// Decode every edge row back into attributes.
    pub fn edge_attrs(&self) -> DsgResult<Vec<EdgeAttrs>> {
        self.edge_features.iter().map(|row| decode(row)).collect()
    }
}

fn uniform_width(what: &str, rows: &[Vec<f64>]) -> DsgResult<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let width = first.len();
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(DsgError::InvalidTensors(format!(
                "{what} {i} has {} features, expected {width}",
                row.len()
            )));
        }
    }
    Ok(())
}

/// Encode a subgraph into node rows, COO edge index and edge rows.
///
/// Rows follow the subgraph's node and edge order; edges keep the
/// orientation stored in the subgraph (parent to child for partition output).
pub fn featurize(network: &DistNetwork) -> DsgResult<SubgraphTensors> {
    let graph = network.graph();
    let mut node_names = Vec::with_capacity(graph.node_count());
    let mut node_features = Vec::with_capacity(graph.node_count());
    for node in graph.node_weights() {
        node_names.push(node.name.clone());
        node_features.push(encode(&node.attrs)?);
    }

    let mut src = Vec::with_capacity(graph.edge_count());
    let mut dst = Vec::with_capacity(graph.edge_count());
    let mut edge_features = Vec::with_capacity(graph.edge_count());
    for edge in graph.edge_references() {
        src.push(edge.source().index());
        dst.push(edge.target().index());
        edge_features.push(encode(&edge.weight().attrs)?);
    }

    Ok(SubgraphTensors {
        node_names,
        node_features,
        edge_index: (src, dst),
        edge_features,
    })
}
