use crate::DistNetwork;
use petgraph::visit::EdgeRef;
use std::collections::VecDeque;

/// Summary statistics produced by `graph stats` (degree, components, radiality).
#[derive(Debug)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub transformer_count: usize,
    pub connected_components: usize,
    pub min_degree: usize,
    pub avg_degree: f64,
    pub max_degree: usize,
    /// Single component with `E = V - 1`
    pub is_radial: bool,
}

/// Calculates degree statistics, component count and whether the feeder is radial.
pub fn graph_stats(network: &DistNetwork) -> GraphStats {
    let graph = network.graph();
    let node_count = graph.node_count();
    let edge_count = graph.edge_count();
    let degrees: Vec<usize> = graph
        .node_indices()
        .map(|node| graph.neighbors(node).count())
        .collect();
    let min_degree = degrees.iter().copied().min().unwrap_or(0);
    let max_degree = degrees.iter().copied().max().unwrap_or(0);
    let avg_degree = if node_count == 0 {
        0.0
    } else {
        degrees.iter().sum::<usize>() as f64 / node_count as f64
    };
    let connected_components = connected_components(network).len();
    GraphStats {
        node_count,
        edge_count,
        transformer_count: network.transformer_count(),
        connected_components,
        min_degree,
        avg_degree,
        max_degree,
        is_radial: connected_components == 1 && edge_count + 1 == node_count,
    }
}

/// Labels connected components with a breadth-first search started from each
/// unvisited node in node order.
///
/// Components come back in first-encountered order and list their members in
/// visit order.
pub fn connected_components(network: &DistNetwork) -> Vec<Vec<petgraph::graph::NodeIndex>> {
    let graph = network.graph();
    let mut visited = vec![false; graph.node_count()];
    let mut components = Vec::new();
    for start in graph.node_indices() {
        if visited[start.index()] {
            continue;
        }
        visited[start.index()] = true;
        let mut queue = VecDeque::from([start]);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            members.push(node);
            for neighbor in graph.neighbors(node) {
                if !visited[neighbor.index()] {
                    visited[neighbor.index()] = true;
                    queue.push_back(neighbor);
                }
            }
        }
        components.push(members);
    }
    components
}

/// Export the topology to a DOT string (Graphviz). Transformers are drawn bold.
pub fn render_dot(network: &DistNetwork) -> String {
    let graph = network.graph();
    let mut buffer = String::new();
    buffer.push_str("graph dsg_feeder {\n");
    for node in graph.node_indices() {
        let bus = &graph[node];
        buffer.push_str(&format!(
            "  n{} [label=\"{}\", node_type=\"{}\"];\n",
            node.index(),
            sanitize_label(&bus.name),
            bus.attrs.node_type.as_str()
        ));
    }
    for edge in graph.edge_references() {
        let source = edge.source().index();
        let target = edge.target().index();
        if edge.weight().attrs.is_transformer() {
            buffer.push_str(&format!("  n{source} -- n{target} [style=bold];\n"));
        } else {
            buffer.push_str(&format!("  n{source} -- n{target};\n"));
        }
    }
    buffer.push('}');
    buffer
}

fn sanitize_label(label: &str) -> String {
    label.replace('"', "\\\"")
}
