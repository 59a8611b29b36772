//! Error types for topology building, validation, partitioning and feature coding.
//!
//! Every fallible operation in the `dsg` crates returns [`DsgResult`]. Batch and
//! command-line layers wrap these into `anyhow` errors with file context, so the
//! variants here only describe what went wrong with one topology or one record.
//!
//! # Example
//!
//! ```ignore
//! use dsg_core::{build_network, validate_network, DsgResult};
//!
//! fn load(records: &TopologyRecords) -> DsgResult<DistNetwork> {
//!     let network = build_network(records)?;
//!     let (tree, _report) = validate_network(network)?;
//!     Ok(tree)
//! }
//! ```

use thiserror::Error;

/// Error type shared by all `dsg` operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DsgError {
    /// No bus records were supplied
    #[error("Topology has no bus records")]
    EmptyTopology,

    /// Two bus records share an id
    #[error("Duplicate bus '{0}'")]
    DuplicateBus(String),

    /// An edge references a bus that was never added
    #[error("Edge {from}-{to} references unknown bus '{bus}'")]
    UnknownBus {
        from: String,
        to: String,
        bus: String,
    },

    /// Declared source bus is absent (from the records, or from the retained component)
    #[error("Source bus '{0}' not found")]
    SourceNotFound(String),

    /// No bus in the network is typed SOURCE
    #[error("Topology has no bus typed SOURCE")]
    NoSourceBus,

    /// Retained component is not a tree
    #[error("Topology contains {cycles} independent cycle(s); a radial feeder is required")]
    TopologyCycle { cycles: usize },

    /// Phase configuration name matches no canonical value or alias
    #[error("Unknown phase configuration '{0}'")]
    UnknownPhase(String),

    /// A record attribute is outside its allowed range
    #[error("Invalid {field} on {entity}: {reason}")]
    InvalidAttribute {
        entity: String,
        field: &'static str,
        reason: String,
    },

    /// Codec met a field that is neither categorical nor numeric
    #[error("Field '{field}' of {record} is neither categorical nor numeric")]
    UnsupportedField {
        record: &'static str,
        field: &'static str,
    },

    /// Value or vector count does not line up with the record schema
    #[error("{record} expects {expected} values, found {found}")]
    SchemaMismatch {
        record: &'static str,
        expected: usize,
        found: usize,
    },

    /// Feature vector cannot be turned back into a record
    #[error("Cannot decode {record}: {reason}")]
    Decode {
        record: &'static str,
        reason: String,
    },

    /// Tensor rows or edge indices are inconsistent
    #[error("Invalid subgraph tensors: {0}")]
    InvalidTensors(String),
}

/// Convenience type alias for Results using DsgError.
pub type DsgResult<T> = Result<T, DsgError>;

impl DsgError {
    /// Shorthand for [`DsgError::InvalidAttribute`].
    pub fn invalid(entity: impl Into<String>, field: &'static str, reason: impl Into<String>) -> Self {
        DsgError::InvalidAttribute {
            entity: entity.into(),
            field,
            reason: reason.into(),
        }
    }
}
