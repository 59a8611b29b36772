//! Non-fatal issues noticed while building and validating a topology.
//!
//! Fatal problems are [`DsgError`](crate::DsgError)s. Everything the pipeline
//! tolerates but a dataset author may want to know about (injections on
//! unknown buses, repeated edge records, dropped islands) lands here, so
//! callers get a programmatic signal in addition to the `tracing` output.
//!
//! ```
//! use dsg_core::diagnostics::{Diagnostics, IssueCategory};
//!
//! let mut diag = Diagnostics::new();
//! diag.add(IssueCategory::Connectivity, "dropped 2 buses outside the largest component");
//! assert_eq!(diag.count(IssueCategory::Connectivity), 1);
//! ```

use serde::Serialize;

/// What part of the pipeline raised the issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// Power injection that could not be attached to a bus
    Injection,
    /// Edge record that replaced an earlier record for the same bus pair
    DuplicateEdge,
    /// Buses or edges dropped by largest-component retention
    Connectivity,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Injection => "injection",
            IssueCategory::DuplicateEdge => "duplicate_edge",
            IssueCategory::Connectivity => "connectivity",
        }
    }
}

/// A single tolerated issue.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyIssue {
    pub category: IssueCategory,
    pub message: String,
    /// Bus or edge the issue refers to, e.g. "bus 'b12'"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl std::fmt::Display for TopologyIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.category.as_str(), self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({entity})")?;
        }
        Ok(())
    }
}

/// Collection of tolerated issues for one topology.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<TopologyIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: IssueCategory, message: impl Into<String>) {
        self.issues.push(TopologyIssue {
            category,
            message: message.into(),
            entity: None,
        });
    }

    pub fn add_with_entity(
        &mut self,
        category: IssueCategory,
        message: impl Into<String>,
        entity: impl Into<String>,
    ) {
        self.issues.push(TopologyIssue {
            category,
            message: message.into(),
            entity: Some(entity.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn count(&self, category: IssueCategory) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.category == category)
            .count()
    }

    /// Move all issues from another collection into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for issue in &self.issues {
            writeln!(f, "{issue}")?;
        }
        Ok(())
    }
}
