pub mod cli;
pub mod config;

pub use cli::{build_cli_command, Cli, Commands, DatasetCommands, GraphCommands};
pub use config::{DatasetConfig, DatasetOverrides, StrategyKind};
