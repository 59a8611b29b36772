use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Outcome of one topology file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Ok,
    Error,
    /// Never started because an earlier job failed under abort-on-error
    Skipped,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Ok => "ok",
            JobStatus::Error => "error",
            JobStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub job_id: String,
    pub topology_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJobRecord {
    pub job_id: String,
    pub input: String,
    pub status: JobStatus,
    pub error: Option<String>,
    pub output: Option<String>,
    #[serde(default)]
    pub num_subgraphs: usize,
    #[serde(default)]
    pub dropped_buses: usize,
}

/// Whether a file name matches `pattern`: an exact name, or `*suffix`.
fn matches_pattern(name: &str, pattern: &str) -> bool {
    match pattern.strip_prefix('*') {
        Some(suffix) => name.ends_with(suffix),
        None => name == pattern,
    }
}

/// Identifier for a job: the folder holding the file when every folder holds
/// a file of the same name, the file path without extension otherwise.
fn job_id(root: &Path, path: &Path, exact_name: bool) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let base = match relative.parent() {
        Some(parent) if exact_name && !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => relative.with_extension(""),
    };
    base.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("_")
}

/// First of `id`, `id-2`, `id-3`, ... not yet in `taken`.
fn unique_id(id: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&id) {
        return id;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{id}-{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Walk `root` for topology files named `pattern`, sorted by path.
///
/// Job ids are unique within the result; an id already taken by an earlier
/// file gets a numeric suffix.
pub fn jobs_from_folder(root: &Path, pattern: &str) -> Result<Vec<BatchJob>> {
    if !root.is_dir() {
        bail!("topology folder '{}' is not a directory", root.display());
    }
    let exact_name = !pattern.starts_with('*');
    let mut taken = HashSet::new();
    let mut jobs = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking '{}'", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if matches_pattern(&name, pattern) {
            let base = job_id(root, entry.path(), exact_name);
            let id = unique_id(base.clone(), &taken);
            if id != base {
                warn!(file = %entry.path().display(), "job id '{base}' already used; using '{id}'");
            }
            taken.insert(id.clone());
            jobs.push(BatchJob {
                job_id: id,
                topology_file: entry.path().to_path_buf(),
            });
        }
    }
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_named_files_in_subfolders() {
        let dir = tempdir().unwrap();
        for feeder in ["north/f2", "north/f1", "south"] {
            let folder = dir.path().join(feeder);
            fs::create_dir_all(&folder).unwrap();
            fs::write(folder.join("topology.json"), "{}").unwrap();
        }
        fs::write(dir.path().join("north/notes.txt"), "").unwrap();

        let jobs = jobs_from_folder(dir.path(), "topology.json").unwrap();
        let ids: Vec<&str> = jobs.iter().map(|job| job.job_id.as_str()).collect();
        assert_eq!(ids, ["north_f1", "north_f2", "south"]);
    }

    #[test]
    fn colliding_ids_get_suffixes() {
        let dir = tempdir().unwrap();
        for feeder in ["north/f1", "north_f1", "north_f1-2"] {
            let folder = dir.path().join(feeder);
            fs::create_dir_all(&folder).unwrap();
            fs::write(folder.join("topology.json"), "{}").unwrap();
        }

        let jobs = jobs_from_folder(dir.path(), "topology.json").unwrap();
        let ids: Vec<&str> = jobs.iter().map(|job| job.job_id.as_str()).collect();
        assert_eq!(ids, ["north_f1", "north_f1-2", "north_f1-2-2"]);
        assert!(jobs[0].topology_file.ends_with("north/f1/topology.json"));
        assert!(jobs[1].topology_file.ends_with("north_f1/topology.json"));
    }

    #[test]
    fn wildcard_uses_file_stems() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("c.toml"), "").unwrap();

        let jobs = jobs_from_folder(dir.path(), "*.json").unwrap();
        let ids: Vec<&str> = jobs.iter().map(|job| job.job_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn missing_folder_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(jobs_from_folder(&dir.path().join("nope"), "topology.json").is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobStatus::Skipped).unwrap(), "\"skipped\"");
        assert_eq!(JobStatus::Error.as_str(), "error");
    }
}
