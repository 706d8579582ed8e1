use std::path::{Path, PathBuf};

use calamine::{DataType, Reader, Xlsx, open_workbook};
use tracing::{debug, instrument};

use crate::error::{Result, StockError};
use crate::io::{SheetRange, TableLoader, grid_to_table};
use crate::model::Table;

/// Reads table snapshots from a local `.xlsx` workbook.
///
/// The workbook is reopened on every fetch so edits made between passes are
/// picked up, mirroring the remote loader.
#[derive(Debug, Clone)]
pub struct WorkbookLoader {
    path: PathBuf,
}

impl WorkbookLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableLoader for WorkbookLoader {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn fetch(&self, sheet: &str, range: SheetRange) -> Result<Table> {
        let grid = read_grid(&self.path, sheet)?;
        debug!(rows = grid.len(), "sheet read");
        Ok(grid_to_table(grid, range))
    }
}

/// Reads every row of `sheet` as text, anchored at cell A1.
///
/// Trailing empty cells are dropped from each row and trailing empty rows
/// are dropped from the grid, matching how the spreadsheet API reports
/// values.
pub fn read_grid(path: &Path, sheet: &str) -> Result<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = read_required_sheet(&mut workbook, sheet)?;

    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut grid: Vec<Vec<String>> = vec![Vec::new(); first_row as usize];

    for row in range.rows() {
        let mut cells: Vec<String> = vec![String::new(); first_col as usize];
        cells.extend(row.iter().map(|cell| cell_to_string(Some(cell))));
        while cells.last().is_some_and(|cell| cell.is_empty()) {
            cells.pop();
        }
        grid.push(cells);
    }

    while grid.last().is_some_and(|row| row.is_empty()) {
        grid.pop();
    }

    Ok(grid)
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<calamine::Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| StockError::MissingSheet(name.to_string()))?;
    let range = range_result.map_err(StockError::from)?;
    Ok(range)
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
