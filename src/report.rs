use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::FlaggedRow;

/// Header of the item label column, shared by both report kinds.
pub const ITEM_LABEL_HEADER: &str = "Item Name";

/// The two kinds of report the tool sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFlavor {
    /// Items whose minimum stock reached the share of the required quantity.
    MinimumStock,
    /// Items with a negative shortage quantity.
    Shortage,
}

impl ReportFlavor {
    /// Heading printed above the table.
    pub fn title(self) -> &'static str {
        match self {
            ReportFlavor::MinimumStock => "Minimum Stock Qty Report",
            ReportFlavor::Shortage => "Negative Shortage Items List",
        }
    }

    /// Email subject line.
    pub fn subject(self) -> &'static str {
        match self {
            ReportFlavor::MinimumStock => "Warning",
            ReportFlavor::Shortage => "Items Quantity Report",
        }
    }

    /// Human labels of the value columns, in rule field order.
    pub fn value_labels(self) -> &'static [&'static str] {
        match self {
            ReportFlavor::MinimumStock => &["Minimum Stock Qty", "Required Order Qty"],
            ReportFlavor::Shortage => &["Shortage Qty"],
        }
    }

    /// Stable identifier used in logs and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ReportFlavor::MinimumStock => "minimum-stock",
            ReportFlavor::Shortage => "shortage",
        }
    }
}

impl std::fmt::Display for ReportFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value column of the report: header label and the rule field it shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportColumn {
    pub label: String,
    pub field: String,
}

/// One rendered line: the item label followed by the value cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub item: String,
    pub cells: Vec<String>,
}

/// A finished report ready to be rendered or exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub flavor: ReportFlavor,
    pub title: String,
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Header labels including the leading item column.
    pub fn header(&self) -> Vec<&str> {
        std::iter::once(ITEM_LABEL_HEADER)
            .chain(self.columns.iter().map(|column| column.label.as_str()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds a report from flagged rows, keeping their order.
///
/// `fields` names the rule fields shown after the item label, paired with the
/// flavor's labels. Rows without an item label are left out with a warning.
pub fn build_report(flavor: ReportFlavor, flagged: &[FlaggedRow], fields: &[&str]) -> Report {
    let columns: Vec<ReportColumn> = flavor
        .value_labels()
        .iter()
        .zip(fields)
        .map(|(label, field)| ReportColumn {
            label: label.to_string(),
            field: field.to_string(),
        })
        .collect();

    let mut rows = Vec::with_capacity(flagged.len());
    for row in flagged {
        let Some(item) = &row.item_label else {
            warn!(row = row.row, report = %flavor, "invalid item name index, row left out");
            continue;
        };
        let cells = columns
            .iter()
            .map(|column| {
                row.value(&column.field)
                    .map(|value| value.raw.clone())
                    .unwrap_or_default()
            })
            .collect();
        rows.push(ReportRow {
            item: item.clone(),
            cells,
        });
    }

    Report {
        flavor,
        title: flavor.title().to_string(),
        columns,
        rows,
    }
}

/// Renders the bordered HTML table, without the surrounding document.
pub fn render_table(report: &Report) -> String {
    let mut html = String::from("<table border='1'><tr>");
    for label in report.header() {
        let _ = write!(html, "<th>{}</th>", html_escape::encode_text(label));
    }
    html.push_str("</tr>");

    for row in &report.rows {
        html.push_str("<tr>");
        let _ = write!(html, "<td>{}</td>", html_escape::encode_text(&row.item));
        for cell in &row.cells {
            let _ = write!(html, "<td>{}</td>", html_escape::encode_text(cell));
        }
        html.push_str("</tr>");
    }

    html.push_str("</table>");
    html
}

/// Renders the full HTML email body.
pub fn render_html(report: &Report) -> String {
    format!(
        "<html><body><h2>{}</h2>{}</body></html>",
        html_escape::encode_text(&report.title),
        render_table(report)
    )
}
