use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use dsg_batch::{
    collect_dataset_stats, jobs_from_folder, run_batch, write_stats_csv, BatchRunnerConfig,
    DatasetSummary, JobStatus, SubgraphStats,
};
use dsg_cli::cli::DatasetCommands;
use dsg_cli::config::{DatasetConfig, DatasetOverrides};
use tabwriter::TabWriter;
use tracing::info;

pub fn handle(command: &DatasetCommands) -> Result<()> {
    match command {
        DatasetCommands::Build {
            input,
            out,
            config,
            pattern,
            threads,
            strategy,
            min_transformers,
            max_transformers,
            abort_on_error,
        } => {
            let overrides = DatasetOverrides {
                pattern: pattern.clone(),
                threads: threads.clone(),
                strategy: *strategy,
                min_transformers: *min_transformers,
                max_transformers: *max_transformers,
                abort_on_error: *abort_on_error,
            };
            build(input, out, config.as_deref(), &overrides)
        }
        DatasetCommands::Stats { output_root, out } => stats(output_root, out.as_ref()),
    }
}

fn build(
    input: &Path,
    out: &Path,
    config_path: Option<&Path>,
    overrides: &DatasetOverrides,
) -> Result<()> {
    let mut config = DatasetConfig::load_or_default(config_path)?;
    config.apply(overrides)?;

    let jobs = jobs_from_folder(input, &config.pattern)?;
    if jobs.is_empty() {
        bail!(
            "no topology files matching '{}' under '{}'",
            config.pattern,
            input.display()
        );
    }
    info!(
        jobs = jobs.len(),
        pattern = %config.pattern,
        "building dataset from {}",
        input.display()
    );

    let summary = run_batch(&BatchRunnerConfig {
        jobs,
        output_root: out.to_path_buf(),
        pipeline: config.pipeline(),
        threads: config.threads,
        abort_on_error: config.abort_on_error,
    })?;

    let subgraphs: usize = summary.jobs.iter().map(|job| job.num_subgraphs).sum();
    println!(
        "Dataset written to {}: {} subgraph(s), {} topology file(s) ok, {} failed",
        out.display(),
        subgraphs,
        summary.success,
        summary.failure
    );
    for job in summary.jobs.iter().filter(|job| job.status == JobStatus::Error) {
        println!(
            "  failed {}: {}",
            job.job_id,
            job.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!("Manifest: {}", summary.manifest_path.display());
    Ok(())
}

fn stats(output_root: &Path, out: Option<&PathBuf>) -> Result<()> {
    let rows = collect_dataset_stats(output_root)?;
    match out {
        Some(path) => {
            write_stats_csv(path, &rows)?;
            println!("Wrote {} row(s) to {}", rows.len(), path.display());
        }
        None => print_table(&rows)?,
    }
    println!("{}", DatasetSummary::from_rows(&rows));
    Ok(())
}

fn print_table(rows: &[SubgraphStats]) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "JOB\tINDEX\tROOT\tNODES\tEDGES\tTRANSFORMERS\tLOADS\tGENERATORS\tDEMAND KW\tGENERATION KW"
    )?;
    for row in rows {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.2}",
            row.job_id,
            row.index,
            row.root,
            row.num_nodes,
            row.num_edges,
            row.num_transformers,
            row.num_load_nodes,
            row.num_generation_nodes,
            row.total_demand_kw,
            row.total_generation_kw
        )?;
    }
    writer.flush()?;
    Ok(())
}
