//! Dataset build settings.
//!
//! Settings come from an optional TOML file; command-line flags override
//! whatever the file sets.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use dsg_algo::{PartitionStrategy, PipelineConfig};
use serde::Deserialize;

pub const DEFAULT_PATTERN: &str = "topology.json";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Transformer,
    Node,
}

/// `[partition]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartitionSection {
    pub strategy: StrategyKind,
    pub min_transformers: usize,
    pub max_transformers: usize,
}

impl Default for PartitionSection {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Transformer,
            min_transformers: 1,
            max_transformers: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    /// Topology file name, or `*suffix`
    pub pattern: String,
    /// Worker threads; 0 uses every CPU
    pub threads: usize,
    pub abort_on_error: bool,
    pub partition: PartitionSection,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            threads: 0,
            abort_on_error: false,
            partition: PartitionSection::default(),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct DatasetOverrides {
    pub pattern: Option<String>,
    pub threads: Option<String>,
    pub strategy: Option<StrategyKind>,
    pub min_transformers: Option<usize>,
    pub max_transformers: Option<usize>,
    pub abort_on_error: bool,
}

impl DatasetConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading dataset config '{}'", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("parsing dataset config '{}'", path.display()))
    }

    /// File settings when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn apply(&mut self, overrides: &DatasetOverrides) -> Result<()> {
        if let Some(pattern) = &overrides.pattern {
            self.pattern = pattern.clone();
        }
        if let Some(threads) = &overrides.threads {
            self.threads = parse_threads(threads)?;
        }
        if let Some(strategy) = overrides.strategy {
            self.partition.strategy = strategy;
        }
        if let Some(min) = overrides.min_transformers {
            self.partition.min_transformers = min;
        }
        if let Some(max) = overrides.max_transformers {
            self.partition.max_transformers = max;
        }
        self.abort_on_error |= overrides.abort_on_error;
        Ok(())
    }

    pub fn pipeline(&self) -> PipelineConfig {
        let partition = match self.partition.strategy {
            StrategyKind::Transformer => PartitionStrategy::Transformer,
            StrategyKind::Node => PartitionStrategy::Node {
                min_transformers: self.partition.min_transformers,
                max_transformers: self.partition.max_transformers,
            },
        };
        PipelineConfig { partition }
    }
}

/// `auto` or a thread count; `auto` maps to 0.
pub fn parse_threads(spec: &str) -> Result<usize> {
    if spec.eq_ignore_ascii_case("auto") {
        return Ok(0);
    }
    match spec.parse() {
        Ok(count) => Ok(count),
        Err(_) => bail!("invalid thread count '{spec}'; use 'auto' or an integer"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_file_parses() {
        let config: DatasetConfig = toml::from_str(
            r#"
            pattern = "*.json"
            threads = 4
            abort_on_error = true

            [partition]
            strategy = "node"
            min_transformers = 2
            max_transformers = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.pattern, "*.json");
        assert_eq!(config.threads, 4);
        assert!(config.abort_on_error);
        assert_eq!(
            config.pipeline().partition,
            PartitionStrategy::Node {
                min_transformers: 2,
                max_transformers: 5
            }
        );
    }

    #[test]
    fn missing_keys_take_defaults() {
        let config: DatasetConfig = toml::from_str("[partition]\nstrategy = \"node\"\n").unwrap();
        assert_eq!(config.pattern, DEFAULT_PATTERN);
        assert_eq!(config.partition.min_transformers, 1);
        assert_eq!(config.partition.max_transformers, 3);

        let empty: DatasetConfig = toml::from_str("").unwrap();
        assert_eq!(empty, DatasetConfig::default());
        assert_eq!(empty.pipeline().partition, PartitionStrategy::Transformer);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<DatasetConfig>("treads = 2").is_err());
        assert!(toml::from_str::<DatasetConfig>("[partition]\nstrategy = \"bus\"").is_err());
    }

    #[test]
    fn flags_override_file() {
        let mut config = DatasetConfig {
            threads: 8,
            ..DatasetConfig::default()
        };
        config
            .apply(&DatasetOverrides {
                threads: Some("auto".into()),
                strategy: Some(StrategyKind::Node),
                max_transformers: Some(1),
                abort_on_error: true,
                ..DatasetOverrides::default()
            })
            .unwrap();
        assert_eq!(config.threads, 0);
        assert!(config.abort_on_error);
        assert_eq!(config.pattern, DEFAULT_PATTERN);
        assert_eq!(
            config.pipeline().partition,
            PartitionStrategy::Node {
                min_transformers: 1,
                max_transformers: 1
            }
        );
    }

    #[test]
    fn thread_spec() {
        assert_eq!(parse_threads("AUTO").unwrap(), 0);
        assert_eq!(parse_threads("3").unwrap(), 3);
        assert!(parse_threads("many").is_err());
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.toml");
        fs::write(&path, "threads = \"x\"").unwrap();
        let err = DatasetConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("dataset.toml"));
    }
}
