//! Adapters for the services a pass talks to: table sources, the credential
//! cache, and mail delivery.

pub mod credentials;
pub mod excel_read;
pub mod excel_write;
pub mod mail;
pub mod sheets;

use crate::error::Result;
use crate::model::Table;

/// Portion of a sheet to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetRange {
    /// Only the first row (`'Sheet'!1:1`).
    HeaderRow,
    /// Every populated cell (`'Sheet'!A:ZZ`).
    Full,
}

impl SheetRange {
    /// A1 notation for the given sheet.
    pub fn a1(self, sheet: &str) -> String {
        let quoted = sheet.replace('\'', "''");
        match self {
            SheetRange::HeaderRow => format!("'{quoted}'!1:1"),
            SheetRange::Full => format!("'{quoted}'!A:ZZ"),
        }
    }
}

/// A source of table snapshots.
///
/// For [`SheetRange::Full`] the returned table carries the first row as its
/// header; for [`SheetRange::HeaderRow`] it carries only the header.
pub trait TableLoader {
    fn fetch(&self, sheet: &str, range: SheetRange) -> Result<Table>;
}

/// Splits a raw grid according to the requested range.
pub(crate) fn grid_to_table(grid: Vec<Vec<String>>, range: SheetRange) -> Table {
    let mut table = Table::from_grid(grid);
    if range == SheetRange::HeaderRow {
        table.rows.clear();
    }
    table
}
