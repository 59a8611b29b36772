//! JSON topology records on disk.

use anyhow::{Context, Result};
use dsg_core::TopologyRecords;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read one topology file.
pub fn load_topology(path: &Path) -> Result<TopologyRecords> {
    let file =
        File::open(path).with_context(|| format!("opening topology '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing topology '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_records() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{"source_bus":"s","buses":[{{"id":"s","kv_level":12.47,"phase_configuration":"ABC"}}]}}"#
        )
        .unwrap();
        let records = load_topology(tmp.path()).unwrap();
        assert_eq!(records.source_bus, "s");
        assert_eq!(records.buses[0].node_count, 1);
        assert!(records.edges.is_empty());
    }

    #[test]
    fn parse_errors_name_the_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "not json").unwrap();
        let err = load_topology(tmp.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing topology"));
    }
}
