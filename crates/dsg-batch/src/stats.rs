//! Per-subgraph statistics for a built dataset.
//!
//! Reads every `subgraphs.json` under an output root, decodes the feature
//! rows back into attributes and summarizes each subgraph as one CSV row.

use anyhow::{Context, Result};
use dsg_algo::{PytorchGeometricJson, SubgraphTensors};
use dsg_core::NodeType;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use walkdir::WalkDir;

use crate::runner::SUBGRAPHS_FILE;

/// One row of the stats table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubgraphStats {
    pub job_id: String,
    pub index: usize,
    pub root: String,
    pub num_nodes: usize,
    pub num_edges: usize,
    pub num_transformers: usize,
    pub num_load_nodes: usize,
    pub num_generation_nodes: usize,
    pub total_demand_kw: f64,
    pub total_generation_kw: f64,
}

impl SubgraphStats {
    fn from_tensors(job_id: &str, index: usize, tensors: &SubgraphTensors) -> Result<Self> {
        let nodes = tensors.node_attrs()?;
        let edges = tensors.edge_attrs()?;
        let mut stats = SubgraphStats {
            job_id: job_id.to_string(),
            index,
            root: tensors.node_names.first().cloned().unwrap_or_default(),
            num_nodes: nodes.len(),
            num_edges: edges.len(),
            num_transformers: edges.iter().filter(|edge| edge.is_transformer()).count(),
            num_load_nodes: 0,
            num_generation_nodes: 0,
            total_demand_kw: 0.0,
            total_generation_kw: 0.0,
        };
        for node in &nodes {
            stats.total_demand_kw += node.active_demand_kw;
            stats.total_generation_kw += node.active_generation_kw;
            match node.node_type {
                NodeType::Load => stats.num_load_nodes += 1,
                NodeType::Generation => stats.num_generation_nodes += 1,
                NodeType::LoadAndGeneration => {
                    stats.num_load_nodes += 1;
                    stats.num_generation_nodes += 1;
                }
                NodeType::Source | NodeType::Other => {}
            }
        }
        Ok(stats)
    }
}

/// Dataset-wide totals over [`SubgraphStats`] rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub topologies: usize,
    pub subgraphs: usize,
    pub min_nodes: usize,
    pub max_nodes: usize,
    pub mean_nodes: f64,
    pub total_transformers: usize,
}

impl DatasetSummary {
    pub fn from_rows(rows: &[SubgraphStats]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let mut jobs: Vec<&str> = rows.iter().map(|row| row.job_id.as_str()).collect();
        jobs.dedup();
        let total_nodes: usize = rows.iter().map(|row| row.num_nodes).sum();
        Self {
            topologies: jobs.len(),
            subgraphs: rows.len(),
            min_nodes: rows.iter().map(|row| row.num_nodes).min().unwrap_or(0),
            max_nodes: rows.iter().map(|row| row.num_nodes).max().unwrap_or(0),
            mean_nodes: total_nodes as f64 / rows.len() as f64,
            total_transformers: rows.iter().map(|row| row.num_transformers).sum(),
        }
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} subgraphs from {} topologies, {}-{} nodes (mean {:.1}), {} transformers",
            self.subgraphs,
            self.topologies,
            self.min_nodes,
            self.max_nodes,
            self.mean_nodes,
            self.total_transformers
        )
    }
}

/// Collect stats for every subgraph under `output_root`, ordered by job.
pub fn collect_dataset_stats(output_root: &Path) -> Result<Vec<SubgraphStats>> {
    let mut rows = Vec::new();
    for entry in WalkDir::new(output_root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking '{}'", output_root.display()))?;
        if !entry.file_type().is_file() || entry.file_name() != SUBGRAPHS_FILE {
            continue;
        }
        let path = entry.path();
        let job_id = path
            .parent()
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
        let samples: Vec<PytorchGeometricJson> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing '{}'", path.display()))?;
        for (index, sample) in samples.iter().enumerate() {
            let tensors = SubgraphTensors::from_pytorch_geometric_json(sample)
                .with_context(|| format!("subgraph {index} in '{}'", path.display()))?;
            let row = SubgraphStats::from_tensors(&job_id, index, &tensors)
                .with_context(|| format!("decoding subgraph {index} in '{}'", path.display()))?;
            rows.push(row);
        }
    }
    Ok(rows)
}

pub fn write_stats_csv(path: &Path, rows: &[SubgraphStats]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating stats file '{}'", path.display()))?;
    for row in rows {
        writer.serialize(row).context("writing stats row")?;
    }
    writer.flush().context("flushing stats file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(job: &str, nodes: usize, transformers: usize) -> SubgraphStats {
        SubgraphStats {
            job_id: job.into(),
            index: 0,
            root: "r".into(),
            num_nodes: nodes,
            num_edges: nodes - 1,
            num_transformers: transformers,
            num_load_nodes: 0,
            num_generation_nodes: 0,
            total_demand_kw: 0.0,
            total_generation_kw: 0.0,
        }
    }

    #[test]
    fn summary_over_rows() {
        let rows = vec![row("a", 3, 1), row("a", 5, 1), row("b", 4, 2)];
        let summary = DatasetSummary::from_rows(&rows);
        assert_eq!(summary.topologies, 2);
        assert_eq!(summary.subgraphs, 3);
        assert_eq!(summary.min_nodes, 3);
        assert_eq!(summary.max_nodes, 5);
        assert!((summary.mean_nodes - 4.0).abs() < 1e-12);
        assert_eq!(summary.total_transformers, 4);
        assert!(summary.to_string().starts_with("3 subgraphs from 2 topologies"));
    }

    #[test]
    fn empty_summary() {
        assert_eq!(DatasetSummary::from_rows(&[]), DatasetSummary::default());
    }

    #[test]
    fn csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        write_stats_csv(&path, &[row("a", 3, 1)]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "job_id,index,root,num_nodes,num_edges,num_transformers,num_load_nodes,num_generation_nodes,total_demand_kw,total_generation_kw"
        );
        assert!(lines.next().unwrap().starts_with("a,0,r,3,2,1"));
    }
}
