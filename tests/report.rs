use stock_watch::model::{FieldValue, FlaggedRow};
use stock_watch::report::{ReportFlavor, ReportRow, build_report, render_html, render_table};

fn shortage_row(row: usize, label: Option<&str>, raw: &str) -> FlaggedRow {
    FlaggedRow {
        row,
        item_label: label.map(str::to_string),
        values: vec![(
            "Shortage".to_string(),
            FieldValue {
                raw: raw.to_string(),
                number: raw.trim().parse().expect("numeric fixture"),
            },
        )],
    }
}

#[test]
fn rows_keep_scan_order() {
    let flagged = vec![
        shortage_row(0, Some("A"), "-1"),
        shortage_row(1, Some("B"), "-2"),
        shortage_row(2, Some("C"), "-3"),
    ];
    let report = build_report(ReportFlavor::Shortage, &flagged, &["Shortage"]);
    let items: Vec<&str> = report.rows.iter().map(|row| row.item.as_str()).collect();
    assert_eq!(items, vec!["A", "B", "C"]);

    let html = render_table(&report);
    let a = html.find("<td>A</td>").expect("A rendered");
    let b = html.find("<td>B</td>").expect("B rendered");
    let c = html.find("<td>C</td>").expect("C rendered");
    assert!(a < b && b < c);
}

#[test]
fn rows_without_label_are_dropped() {
    let flagged = vec![
        shortage_row(0, None, "-1"),
        shortage_row(1, Some("Nut"), "-2"),
    ];
    let report = build_report(ReportFlavor::Shortage, &flagged, &["Shortage"]);
    assert_eq!(
        report.rows,
        vec![ReportRow {
            item: "Nut".into(),
            cells: vec!["-2".into()]
        }]
    );
}

#[test]
fn minimum_stock_table_has_fixed_headers() {
    let flagged = vec![FlaggedRow {
        row: 0,
        item_label: Some("Widget".into()),
        values: vec![
            (
                "Minimum".into(),
                FieldValue {
                    raw: "8".into(),
                    number: 8.0,
                },
            ),
            (
                "Required".into(),
                FieldValue {
                    raw: "10".into(),
                    number: 10.0,
                },
            ),
        ],
    }];
    let report = build_report(ReportFlavor::MinimumStock, &flagged, &["Minimum", "Required"]);
    assert_eq!(
        render_table(&report),
        "<table border='1'><tr><th>Item Name</th><th>Minimum Stock Qty</th>\
         <th>Required Order Qty</th></tr><tr><td>Widget</td><td>8</td><td>10</td></tr></table>"
    );
}

#[test]
fn document_wraps_table_with_heading() {
    let flagged = vec![shortage_row(0, Some("Bolt"), "-3")];
    let report = build_report(ReportFlavor::Shortage, &flagged, &["Shortage"]);
    let html = render_html(&report);
    assert!(html.starts_with("<html><body><h2>Negative Shortage Items List</h2><table border='1'>"));
    assert!(html.ends_with("</table></body></html>"));
}

#[test]
fn cell_text_is_escaped() {
    let flagged = vec![shortage_row(0, Some("Nuts & <Bolts>"), "-3")];
    let report = build_report(ReportFlavor::Shortage, &flagged, &["Shortage"]);
    let html = render_table(&report);
    assert!(html.contains("<td>Nuts &amp; &lt;Bolts&gt;</td>"));
}
