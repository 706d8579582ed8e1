use tracing::{debug, warn};

use crate::model::{ColumnSpec, FieldValue, FlaggedRow, RowOutcome, SkipReason, Table};
use crate::resolve::{MatchMode, resolve};

/// Share of the required quantity at which the minimum stock is reported.
pub const DEFAULT_MINIMUM_RATIO: f64 = 0.7;

/// Positional label column used when none is configured.
pub const DEFAULT_ITEM_NAME_COLUMN_INDEX: usize = 1;

/// A numeric threshold applied to every data row.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Flags rows where `minimum >= ratio * required`.
    RatioShortage {
        minimum: String,
        required: String,
        ratio: f64,
    },
    /// Flags rows where the column holds a negative number.
    NegativeValue { column: String },
}

impl Rule {
    /// Minimum-stock rule over the given columns at the default ratio.
    pub fn ratio_shortage(minimum: impl Into<String>, required: impl Into<String>) -> Self {
        Rule::RatioShortage {
            minimum: minimum.into(),
            required: required.into(),
            ratio: DEFAULT_MINIMUM_RATIO,
        }
    }

    /// Negative-value rule over the given column.
    pub fn negative_value(column: impl Into<String>) -> Self {
        Rule::NegativeValue {
            column: column.into(),
        }
    }

    /// Column names the rule reads, in the order values are reported.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Rule::RatioShortage {
                minimum, required, ..
            } => vec![minimum.as_str(), required.as_str()],
            Rule::NegativeValue { column } => vec![column.as_str()],
        }
    }

    fn is_met(&self, numbers: &[f64]) -> bool {
        match (self, numbers) {
            (Rule::RatioShortage { ratio, .. }, [minimum, required]) => {
                *minimum >= ratio * required
            }
            (Rule::NegativeValue { .. }, [value]) => *value < 0.0,
            _ => false,
        }
    }
}

/// Where the item label of a flagged row comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelColumn {
    /// Fixed position in every row.
    Index(usize),
    /// Header name, resolved with the evaluator's match mode.
    Named(String),
}

impl Default for LabelColumn {
    fn default() -> Self {
        LabelColumn::Index(DEFAULT_ITEM_NAME_COLUMN_INDEX)
    }
}

/// Outcome of evaluating one rule over one table snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// At least one column the rule needs is absent; nothing was scanned.
    ColumnNotFound { columns: Vec<String> },
    /// Every data row was visited.
    Evaluated {
        columns: Vec<ColumnSpec>,
        outcomes: Vec<RowOutcome>,
    },
}

impl Evaluation {
    /// Flagged rows in scan order.
    pub fn flagged(&self) -> Vec<&FlaggedRow> {
        match self {
            Evaluation::ColumnNotFound { .. } => Vec::new(),
            Evaluation::Evaluated { outcomes, .. } => {
                outcomes.iter().filter_map(RowOutcome::flagged).collect()
            }
        }
    }

    /// Consumes the evaluation, keeping only the flagged rows.
    pub fn into_flagged(self) -> Vec<FlaggedRow> {
        match self {
            Evaluation::ColumnNotFound { .. } => Vec::new(),
            Evaluation::Evaluated { outcomes, .. } => outcomes
                .into_iter()
                .filter_map(|outcome| match outcome {
                    RowOutcome::Flagged(row) => Some(row),
                    RowOutcome::Skipped { .. } => None,
                })
                .collect(),
        }
    }

    /// Number of rows that were skipped for a reason other than falling
    /// below the threshold.
    pub fn unreadable_rows(&self) -> usize {
        match self {
            Evaluation::ColumnNotFound { .. } => 0,
            Evaluation::Evaluated { outcomes, .. } => outcomes
                .iter()
                .filter(|outcome| {
                    matches!(
                        outcome,
                        RowOutcome::Skipped { reason, .. } if *reason != SkipReason::BelowThreshold
                    )
                })
                .count(),
        }
    }
}

/// Applies a [`Rule`] to table snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluator {
    pub rule: Rule,
    pub label: LabelColumn,
    pub mode: MatchMode,
}

impl Evaluator {
    pub fn new(rule: Rule, label: LabelColumn, mode: MatchMode) -> Self {
        Self { rule, label, mode }
    }

    /// Scans the data rows of `table`. The header is used only to resolve
    /// columns and is never evaluated as a row.
    pub fn evaluate(&self, table: &Table) -> Evaluation {
        self.evaluate_with_header(&table.header, table)
    }

    /// Like [`Evaluator::evaluate`], resolving columns against a header that
    /// was fetched separately from the rows.
    pub fn evaluate_with_header(&self, header: &[String], table: &Table) -> Evaluation {
        let columns: Vec<ColumnSpec> = self
            .rule
            .fields()
            .into_iter()
            .map(|name| ColumnSpec::resolve(name, header, self.mode))
            .collect();

        let label_index = match &self.label {
            LabelColumn::Index(index) => Some(*index),
            LabelColumn::Named(name) => resolve(header, name, self.mode),
        };

        let mut missing: Vec<String> = columns
            .iter()
            .filter(|column| !column.is_resolved())
            .map(|column| column.name.clone())
            .collect();
        if let (LabelColumn::Named(name), None) = (&self.label, label_index) {
            missing.push(name.clone());
        }
        if !missing.is_empty() {
            warn!(columns = ?missing, "column not found");
            return Evaluation::ColumnNotFound { columns: missing };
        }

        let indices: Vec<(&str, usize)> = columns
            .iter()
            .filter_map(|column| column.index.map(|index| (column.name.as_str(), index)))
            .collect();
        let label_index = label_index.unwrap_or(DEFAULT_ITEM_NAME_COLUMN_INDEX);

        let outcomes = table
            .rows
            .iter()
            .enumerate()
            .map(|(row, cells)| self.evaluate_row(row, cells, &indices, label_index))
            .collect();

        Evaluation::Evaluated { columns, outcomes }
    }

    fn evaluate_row(
        &self,
        row: usize,
        cells: &[String],
        indices: &[(&str, usize)],
        label_index: usize,
    ) -> RowOutcome {
        let mut values = Vec::with_capacity(indices.len());
        for (column, index) in indices {
            let Some(raw) = cells.get(*index) else {
                debug!(row, column, "row too short");
                return RowOutcome::Skipped {
                    row,
                    reason: SkipReason::MissingCell {
                        column: column.to_string(),
                    },
                };
            };
            let Some(number) = parse_number(raw) else {
                debug!(row, column, value = %raw, "cell is not numeric");
                return RowOutcome::Skipped {
                    row,
                    reason: SkipReason::NotNumeric {
                        column: column.to_string(),
                        value: raw.clone(),
                    },
                };
            };
            values.push((
                column.to_string(),
                FieldValue {
                    raw: raw.clone(),
                    number,
                },
            ));
        }

        let numbers: Vec<f64> = values.iter().map(|(_, value)| value.number).collect();
        if !self.rule.is_met(&numbers) {
            return RowOutcome::Skipped {
                row,
                reason: SkipReason::BelowThreshold,
            };
        }

        RowOutcome::Flagged(FlaggedRow {
            row,
            item_label: cells.get(label_index).cloned(),
            values,
        })
    }
}

/// Parses a cell as a float, ignoring surrounding whitespace.
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}
