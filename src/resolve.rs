use serde::{Deserialize, Serialize};

use crate::model::ColumnSpec;

/// How a requested column name is compared against header cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// Whitespace-trimmed, case-insensitive equality.
    Relaxed,
}

impl MatchMode {
    fn matches(self, cell: &str, target: &str) -> bool {
        match self {
            MatchMode::Exact => cell == target,
            MatchMode::Relaxed => cell.trim().to_lowercase() == target.trim().to_lowercase(),
        }
    }
}

/// Position of the first header cell matching `target`, or `None` when the
/// column is absent.
pub fn resolve(header: &[String], target: &str, mode: MatchMode) -> Option<usize> {
    header.iter().position(|cell| mode.matches(cell, target))
}

impl ColumnSpec {
    /// Resolves `name` against the given header.
    pub fn resolve(name: impl Into<String>, header: &[String], mode: MatchMode) -> Self {
        let name = name.into();
        let index = resolve(header, &name, mode);
        Self { name, index }
    }

    /// Whether the column was found in the header.
    pub fn is_resolved(&self) -> bool {
        self.index.is_some()
    }
}
