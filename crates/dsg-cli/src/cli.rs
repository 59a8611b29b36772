use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::config::StrategyKind;

#[derive(Parser, Debug)]
#[command(
    name = "dsg",
    author,
    version,
    about = "Build graph datasets from distribution feeder topologies",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dataset generation and summaries
    Dataset {
        #[command(subcommand)]
        command: DatasetCommands,
    },
    /// Inspect a single topology file
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum DatasetCommands {
    /// Partition and encode every topology file under a folder
    Build {
        /// Folder searched recursively for topology files
        #[arg(value_hint = ValueHint::DirPath)]
        input: PathBuf,
        /// Output root; one directory per topology
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: PathBuf,
        /// TOML dataset config
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
        /// Topology file name, or `*suffix` to match by extension
        #[arg(long)]
        pattern: Option<String>,
        /// Threading hint (`auto` or integer)
        #[arg(long)]
        threads: Option<String>,
        /// Partition strategy
        #[arg(long, value_enum)]
        strategy: Option<StrategyKind>,
        /// Lower transformer bound for the node strategy
        #[arg(long)]
        min_transformers: Option<usize>,
        /// Upper transformer bound for the node strategy
        #[arg(long)]
        max_transformers: Option<usize>,
        /// Stop starting new topologies after the first failure
        #[arg(long)]
        abort_on_error: bool,
    },
    /// Per-subgraph statistics for a built dataset
    Stats {
        /// Output root written by `dataset build`
        #[arg(value_hint = ValueHint::DirPath)]
        output_root: PathBuf,
        /// Write the rows as CSV instead of printing a table
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// Print size, degree and power statistics
    Stats {
        /// Path to the topology JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        topology_file: PathBuf,
    },
    /// Export the topology as Graphviz DOT
    Export {
        /// Path to the topology JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        topology_file: PathBuf,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
