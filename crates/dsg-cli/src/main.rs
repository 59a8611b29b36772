use anyhow::{Context, Result};
use clap::Parser;
use dsg_cli::cli::{Cli, Commands};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    match &cli.command {
        Commands::Dataset { command } => commands::dataset::handle(command),
        Commands::Graph { command } => commands::graph::handle(command),
    }
}
