pub mod job;
pub mod manifest;
pub mod runner;
pub mod source;
pub mod stats;

pub use job::{jobs_from_folder, BatchJob, BatchJobRecord, JobStatus};
pub use manifest::{load_batch_manifest, write_batch_manifest, BatchManifest};
pub use runner::{run_batch, BatchRunnerConfig, BatchSummary, SUBGRAPHS_FILE};
pub use source::load_topology;
pub use stats::{collect_dataset_stats, write_stats_csv, DatasetSummary, SubgraphStats};
