use std::fs;

use anyhow::{Context, Result};
use dsg_batch::load_topology;
use dsg_cli::cli::GraphCommands;
use dsg_core::{build_with_diagnostics, graph_utils, render_dot};
use tracing::{info, warn};

pub fn handle(command: &GraphCommands) -> Result<()> {
    match command {
        GraphCommands::Stats { topology_file } => {
            let records = load_topology(topology_file)?;
            let (network, diagnostics) = build_with_diagnostics(&records)
                .with_context(|| format!("building '{}'", topology_file.display()))?;
            if !diagnostics.is_empty() {
                warn!(issues = diagnostics.len(), "topology built with tolerated issues");
            }
            let stats = graph_utils::graph_stats(&network);
            let power = network.stats();
            println!("Graph statistics for {}:", topology_file.display());
            println!("  Buses         : {}", stats.node_count);
            println!("  Edges         : {}", stats.edge_count);
            println!("  Transformers  : {}", stats.transformer_count);
            println!("  Components    : {}", stats.connected_components);
            println!("  Radial        : {}", if stats.is_radial { "yes" } else { "no" });
            println!(
                "  Degree [min/avg/max]: {}/{:.2}/{}",
                stats.min_degree, stats.avg_degree, stats.max_degree
            );
            println!(
                "  Load buses    : {} ({:.2} kW)",
                power.num_load_buses, power.total_demand_kw
            );
            println!(
                "  Generation    : {} ({:.2} kW)",
                power.num_generation_buses, power.total_generation_kw
            );
            println!("  Issues        : {}", diagnostics.len());
            Ok(())
        }
        GraphCommands::Export { topology_file, out } => {
            let records = load_topology(topology_file)?;
            let (network, _) = build_with_diagnostics(&records)
                .with_context(|| format!("building '{}'", topology_file.display()))?;
            let dot = render_dot(&network);
            match out {
                Some(path) => {
                    fs::write(path, dot)
                        .with_context(|| format!("writing '{}'", path.display()))?;
                    info!("wrote DOT export to {}", path.display());
                }
                None => println!("{dot}"),
            }
            Ok(())
        }
    }
}
