use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::error::Result;
use crate::report::Report;

/// Longest sheet name Excel accepts.
const MAX_SHEET_NAME: usize = 31;

/// Writes the report table to a single-sheet workbook at `path`.
///
/// Value cells are written as numbers when they parse, so the sheet can be
/// sorted and summed; anything else is kept as text.
pub fn export_report(path: &Path, report: &Report) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(&report.title))?;

    let bold = Format::new().set_bold();
    for (col_idx, header) in report.header().iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, *header, &bold)?;
    }

    for (row_idx, row) in report.rows.iter().enumerate() {
        let sheet_row = (row_idx + 1) as u32;
        worksheet.write_string(sheet_row, 0, &row.item)?;
        for (col_idx, cell) in row.cells.iter().enumerate() {
            let sheet_col = (col_idx + 1) as u16;
            match crate::evaluate::parse_number(cell) {
                Some(number) => worksheet.write_number(sheet_row, sheet_col, number)?,
                None => worksheet.write_string(sheet_row, sheet_col, cell)?,
            };
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn sheet_name(title: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']', '\''];
    let mut sanitized: String = title
        .chars()
        .map(|ch| if invalid.contains(&ch) { '_' } else { ch })
        .collect();
    sanitized = sanitized.trim().to_string();
    if sanitized.is_empty() {
        sanitized = "Report".to_string();
    }
    sanitized.chars().take(MAX_SHEET_NAME).collect()
}
