use serde::{Deserialize, Serialize};

/// A flat snapshot of one sheet: a header row followed by data rows.
///
/// Rows are kept exactly as the source returned them, so they may be shorter
/// or longer than the header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Header cells in column order.
    pub header: Vec<String>,
    /// Data rows, header excluded.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table from an explicit header and data rows.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Splits a raw cell grid into header (first row) and data rows.
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let header = grid.remove(0);
        Self { header, rows: grid }
    }

    /// Returns `true` when the table carries neither a header nor rows.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty()
    }
}

/// A column requested by name together with its position in the current
/// header. Resolved once per pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub index: Option<usize>,
}

/// A numeric cell captured for the report: the text as it appeared in the
/// sheet plus its parsed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValue {
    pub raw: String,
    pub number: f64,
}

/// A data row selected by a threshold rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedRow {
    /// Zero-based position among the data rows.
    pub row: usize,
    /// Value of the label column, `None` when the row is too short.
    pub item_label: Option<String>,
    /// Rule field name → value, in rule order.
    pub values: Vec<(String, FieldValue)>,
}

impl FlaggedRow {
    /// Looks up a rule field by name.
    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

/// Why a row was not flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The row ends before the named column.
    MissingCell { column: String },
    /// The cell exists but is not a number.
    NotNumeric { column: String, value: String },
    /// Every cell parsed but the rule did not match.
    BelowThreshold,
}

/// Result of applying a rule to a single data row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    Flagged(FlaggedRow),
    Skipped { row: usize, reason: SkipReason },
}

impl RowOutcome {
    /// Returns the flagged row when the rule matched.
    pub fn flagged(&self) -> Option<&FlaggedRow> {
        match self {
            RowOutcome::Flagged(row) => Some(row),
            RowOutcome::Skipped { .. } => None,
        }
    }
}
