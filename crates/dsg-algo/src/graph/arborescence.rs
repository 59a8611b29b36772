//! Rooted view of a radial feeder.
//!
//! The feeder graph is undirected; partitioning needs "downstream of" and
//! "how many transformers hang below". [`Arborescence`] orients every tree
//! edge away from the root with one iterative depth-first walk and then fills
//! the per-node transformer counts in a single reverse-preorder pass, so
//! querying any node's subtree is O(1) for the count and O(subtree) for the
//! members.

use dsg_core::{
    DistEdge, DistNetwork, DistNode, DsgError, DsgResult, EdgeIndex, NodeIndex, NodeType,
};
use petgraph::visit::EdgeRef;

/// Depth-first arborescence of a feeder rooted at one bus.
#[derive(Debug, Clone)]
pub struct Arborescence {
    root: NodeIndex,
    parent: Vec<Option<NodeIndex>>,
    parent_edge: Vec<Option<EdgeIndex>>,
    children: Vec<Vec<NodeIndex>>,
    preorder: Vec<NodeIndex>,
    transformers_below: Vec<usize>,
}

impl Arborescence {
    /// Root the feeder at its SOURCE bus.
    pub fn rooted_at_source(network: &DistNetwork) -> DsgResult<Self> {
        let root = network
            .source()
            .ok_or(DsgError::NoSourceBus)?;
        Ok(Self::rooted_at(network, root))
    }

    /// Orient the feeder away from `root`.
    ///
    /// Neighbors are visited in edge insertion order. Buses unreachable from
    /// `root` are left out of the arborescence; on a graph with cycles the
    /// result is a spanning tree of the root's component.
    pub fn rooted_at(network: &DistNetwork, root: NodeIndex) -> Self {
        let graph = network.graph();
        let n = graph.node_count();
        let mut parent = vec![None; n];
        let mut parent_edge = vec![None; n];
        let mut children = vec![Vec::new(); n];
        let mut preorder = Vec::with_capacity(n);
        let mut visited = vec![false; n];

        let mut stack = vec![root];
        visited[root.index()] = true;
        while let Some(node) = stack.pop() {
            preorder.push(node);
            let mut incident: Vec<(EdgeIndex, NodeIndex)> = graph
                .edges(node)
                .map(|edge| {
                    let other = if edge.source() == node {
                        edge.target()
                    } else {
                        edge.source()
                    };
                    (edge.id(), other)
                })
                .collect();
            incident.sort_by_key(|(edge, _)| edge.index());
            // reversed so the lowest edge index is popped first
            for (edge, next) in incident.into_iter().rev() {
                if visited[next.index()] {
                    continue;
                }
                visited[next.index()] = true;
                parent[next.index()] = Some(node);
                parent_edge[next.index()] = Some(edge);
                stack.push(next);
            }
        }

        // children in visit order
        for &node in &preorder {
            if let Some(p) = parent[node.index()] {
                children[p.index()].push(node);
            }
        }

        let mut transformers_below = vec![0usize; n];
        for &node in preorder.iter().rev() {
            if let (Some(p), Some(edge)) = (parent[node.index()], parent_edge[node.index()]) {
                let own = usize::from(graph[edge].attrs.is_transformer());
                transformers_below[p.index()] += transformers_below[node.index()] + own;
            }
        }

        Self {
            root,
            parent,
            parent_edge,
            children,
            preorder,
            transformers_below,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Nodes in the order the walk reached them.
    pub fn preorder(&self) -> &[NodeIndex] {
        &self.preorder
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        node == self.root || self.parent.get(node.index()).copied().flatten().is_some()
    }

    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.parent.get(node.index()).copied().flatten()
    }

    pub fn children(&self, node: NodeIndex) -> &[NodeIndex] {
        self.children
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// TRANSFORMER edges inside the subtree hanging from `node`.
    pub fn transformers_below(&self, node: NodeIndex) -> usize {
        self.transformers_below.get(node.index()).copied().unwrap_or(0)
    }

    /// Members of the subtree rooted at `node`, in preorder.
    pub fn subtree(&self, node: NodeIndex) -> Vec<NodeIndex> {
        if !self.contains(node) {
            return Vec::new();
        }
        let mut members = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            members.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        members
    }

    /// Copy the subtree under `root` into a new network.
    ///
    /// Edges are oriented parent to child and `root` becomes the SOURCE of
    /// the copy. The parent network is left untouched.
    pub fn extract(&self, network: &DistNetwork, root: NodeIndex) -> DsgResult<DistNetwork> {
        let graph = network.graph();
        let members = self.subtree(root);
        let mut out = DistNetwork::new();
        let mut remap = vec![None; graph.node_count()];

        for &node in &members {
            let mut copy: DistNode = graph[node].clone();
            if node == root {
                copy.attrs.node_type = NodeType::Source;
            }
            remap[node.index()] = Some(out.add_bus(copy)?);
        }

        for &node in members.iter().filter(|&&node| node != root) {
            let (Some(p), Some(edge)) = (self.parent(node), self.parent_edge[node.index()]) else {
                continue;
            };
            let (Some(a), Some(b)) = (remap[p.index()], remap[node.index()]) else {
                continue;
            };
            out.add_edge_between(
                a,
                b,
                DistEdge {
                    from_bus: graph[p].name.clone(),
                    to_bus: graph[node].name.clone(),
                    attrs: graph[edge].attrs.clone(),
                },
            );
        }
        Ok(out)
    }
}
