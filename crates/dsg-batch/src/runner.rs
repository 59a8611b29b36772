use crate::job::{BatchJob, BatchJobRecord, JobStatus};
use crate::manifest::{write_batch_manifest, BatchManifest};
use crate::source::load_topology;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use dsg_algo::{process_topology, PartitionStrategy, PipelineConfig, PytorchGeometricJson};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

/// File written per topology under `<output_root>/<job_id>/`.
pub const SUBGRAPHS_FILE: &str = "subgraphs.json";

/// Runner settings: which files, where the dataset goes, and how each
/// topology is partitioned.
pub struct BatchRunnerConfig {
    pub jobs: Vec<BatchJob>,
    pub output_root: PathBuf,
    pub pipeline: PipelineConfig,
    /// Worker threads; 0 uses every CPU
    pub threads: usize,
    /// Stop starting new jobs after the first failure
    pub abort_on_error: bool,
}

/// Summary returned after the run so clients can log counts and the manifest location.
#[derive(Debug)]
pub struct BatchSummary {
    pub success: usize,
    pub failure: usize,
    pub skipped: usize,
    pub manifest_path: PathBuf,
    pub jobs: Vec<BatchJobRecord>,
}

fn strategy_label(strategy: &PartitionStrategy) -> String {
    match strategy {
        PartitionStrategy::Transformer => "transformer".to_string(),
        PartitionStrategy::Node {
            min_transformers,
            max_transformers,
        } => format!("node[{min_transformers},{max_transformers}]"),
    }
}

pub fn run_batch(config: &BatchRunnerConfig) -> Result<BatchSummary> {
    fs::create_dir_all(&config.output_root).with_context(|| {
        format!(
            "creating batch output root '{}'",
            config.output_root.display()
        )
    })?;

    let thread_count = if config.threads == 0 {
        num_cpus::get()
    } else {
        config.threads
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .context("building Rayon thread pool for batch runs")?;

    info!(
        jobs = config.jobs.len(),
        threads = thread_count,
        output = %config.output_root.display(),
        "starting dataset batch"
    );

    // Topologies are independent; the flag is the only shared state.
    let abort = AtomicBool::new(false);
    let job_records: Vec<BatchJobRecord> = pool.install(|| {
        config
            .jobs
            .par_iter()
            .map(|job| {
                if abort.load(Ordering::SeqCst) {
                    return skipped(job);
                }
                let record = run_job(job, config);
                if record.status == JobStatus::Error && config.abort_on_error {
                    abort.store(true, Ordering::SeqCst);
                }
                record
            })
            .collect()
    });

    let count = |status: JobStatus| job_records.iter().filter(|r| r.status == status).count();
    let success = count(JobStatus::Ok);
    let failure = count(JobStatus::Error);
    let skipped = count(JobStatus::Skipped);

    let manifest = BatchManifest {
        created_at: Utc::now(),
        strategy: strategy_label(&config.pipeline.partition),
        num_jobs: job_records.len(),
        success,
        failure,
        skipped,
        jobs: job_records.clone(),
    };
    let manifest_path = config.output_root.join("batch_manifest.json");
    write_batch_manifest(&manifest_path, &manifest)?;
    info!(success, failure, skipped, "dataset batch finished");

    if config.abort_on_error && failure > 0 {
        bail!(
            "{failure} topology file(s) failed; {skipped} not started (manifest: {})",
            manifest_path.display()
        );
    }

    Ok(BatchSummary {
        success,
        failure,
        skipped,
        manifest_path,
        jobs: job_records,
    })
}

fn skipped(job: &BatchJob) -> BatchJobRecord {
    BatchJobRecord {
        job_id: job.job_id.clone(),
        input: job.topology_file.display().to_string(),
        status: JobStatus::Skipped,
        error: None,
        output: None,
        num_subgraphs: 0,
        dropped_buses: 0,
    }
}

/// Process one topology file and write its subgraphs.
///
/// Nothing is written for a topology that fails at any stage, and output
/// left by an earlier run is removed.
fn run_job(job: &BatchJob, config: &BatchRunnerConfig) -> BatchJobRecord {
    let output_file = config.output_root.join(&job.job_id).join(SUBGRAPHS_FILE);

    let runner = || -> Result<(usize, usize)> {
        let records = load_topology(&job.topology_file)?;
        let output = process_topology(&records, &config.pipeline)
            .with_context(|| format!("processing '{}'", job.topology_file.display()))?;

        let samples: Vec<PytorchGeometricJson> = output
            .subgraphs
            .iter()
            .map(|sub| sub.tensors.to_pytorch_geometric_json())
            .collect();
        let json = serde_json::to_string(&samples).context("serializing subgraph tensors")?;
        if let Some(parent) = output_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating job directory '{}'", parent.display()))?;
        }
        fs::write(&output_file, json)
            .with_context(|| format!("writing '{}'", output_file.display()))?;
        Ok((samples.len(), output.dropped_buses))
    };

    let mut record = BatchJobRecord {
        job_id: job.job_id.clone(),
        input: job.topology_file.display().to_string(),
        status: JobStatus::Ok,
        error: None,
        output: None,
        num_subgraphs: 0,
        dropped_buses: 0,
    };
    match runner() {
        Ok((num_subgraphs, dropped_buses)) => {
            record.output = Some(output_file.display().to_string());
            record.num_subgraphs = num_subgraphs;
            record.dropped_buses = dropped_buses;
        }
        Err(err) => {
            error!(job = %job.job_id, "batch job failed: {err:#}");
            remove_stale_output(&output_file);
            record.status = JobStatus::Error;
            record.error = Some(format!("{err:#}"));
        }
    }
    record
}

/// Drop subgraphs left by an earlier run so a failed job has no output.
fn remove_stale_output(output_file: &Path) {
    match fs::remove_file(output_file) {
        Ok(()) => warn!(file = %output_file.display(), "removed output of an earlier run"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(file = %output_file.display(), "could not remove stale output: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_labels() {
        assert_eq!(strategy_label(&PartitionStrategy::Transformer), "transformer");
        assert_eq!(
            strategy_label(&PartitionStrategy::Node {
                min_transformers: 1,
                max_transformers: 3
            }),
            "node[1,3]"
        );
    }
}
