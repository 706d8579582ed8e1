use std::cell::RefCell;

use stock_watch::config::Settings;
use stock_watch::io::mail::Notifier;
use stock_watch::io::{SheetRange, TableLoader};
use stock_watch::model::Table;
use stock_watch::pass::{self, PassOutcome};
use stock_watch::report::{ReportFlavor, ReportRow};
use stock_watch::{Result, StockError};

struct StaticLoader {
    grid: Vec<Vec<String>>,
    requests: RefCell<Vec<SheetRange>>,
}

impl StaticLoader {
    fn new(grid: &[&[&str]]) -> Self {
        Self {
            grid: grid
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl TableLoader for StaticLoader {
    fn fetch(&self, _sheet: &str, range: SheetRange) -> Result<Table> {
        self.requests.borrow_mut().push(range);
        let mut table = Table::from_grid(self.grid.clone());
        if range == SheetRange::HeaderRow {
            table.rows.clear();
        }
        Ok(table)
    }
}

struct FailingLoader;

impl TableLoader for FailingLoader {
    fn fetch(&self, _sheet: &str, _range: SheetRange) -> Result<Table> {
        Err(StockError::Transport {
            operation: "read sheet values",
            message: "503 Service Unavailable".into(),
        })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: RefCell<Vec<(String, String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<()> {
        self.sent.borrow_mut().push((
            recipient.to_string(),
            subject.to_string(),
            html_body.to_string(),
        ));
        Ok(())
    }
}

struct RefusingNotifier;

impl Notifier for RefusingNotifier {
    fn send(&self, _recipient: &str, _subject: &str, _html_body: &str) -> Result<()> {
        Err(StockError::Transport {
            operation: "send email",
            message: "connection refused".into(),
        })
    }
}

fn settings() -> Settings {
    Settings::from_json(
        r#"{
            "spreadsheet_id": "sheet-id",
            "recipient_email": "buyer@example.com",
            "sender_email": "stock@example.com",
            "sender_password": "app-password",
            "item_name_column_index": 0
        }"#,
    )
    .expect("settings parsed")
}

#[test]
fn minimum_stock_pass_reports_only_rows_at_threshold() {
    let loader = StaticLoader::new(&[
        &["Item", "Minimum", "Required"],
        &["Widget", "8", "10"],
        &["Gadget", "5", "10"],
    ]);
    let notifier = RecordingNotifier::default();

    let outcome = pass::run_pass(ReportFlavor::MinimumStock, &settings(), &loader, &notifier)
        .expect("pass succeeds");

    let PassOutcome::Reported(report) = outcome else {
        panic!("expected a report");
    };
    assert_eq!(
        report.rows,
        vec![ReportRow {
            item: "Widget".into(),
            cells: vec!["8".into(), "10".into()]
        }]
    );

    let sent = notifier.sent.borrow();
    assert_eq!(sent.len(), 1);
    let (recipient, subject, body) = &sent[0];
    assert_eq!(recipient, "buyer@example.com");
    assert_eq!(subject, "Warning");
    assert!(body.contains("<tr><td>Widget</td><td>8</td><td>10</td></tr>"));
    assert!(!body.contains("Gadget"));
}

#[test]
fn shortage_pass_reads_header_row_separately() {
    let loader = StaticLoader::new(&[&["Item", "Shortage"], &["Bolt", "-3"], &["Nut", "2"]]);
    let notifier = RecordingNotifier::default();

    let outcome = pass::run_pass(ReportFlavor::Shortage, &settings(), &loader, &notifier)
        .expect("pass succeeds");

    let PassOutcome::Reported(report) = outcome else {
        panic!("expected a report");
    };
    assert_eq!(
        report.rows,
        vec![ReportRow {
            item: "Bolt".into(),
            cells: vec!["-3".into()]
        }]
    );
    assert_eq!(
        *loader.requests.borrow(),
        vec![SheetRange::HeaderRow, SheetRange::Full]
    );
    assert_eq!(notifier.sent.borrow()[0].1, "Items Quantity Report");
}

#[test]
fn nothing_flagged_sends_nothing() {
    let loader = StaticLoader::new(&[&["Item", "Shortage"], &["Nut", "2"]]);
    let notifier = RecordingNotifier::default();

    let outcome = pass::run_pass(ReportFlavor::Shortage, &settings(), &loader, &notifier)
        .expect("pass succeeds");

    assert_eq!(outcome, PassOutcome::NothingToReport);
    assert!(notifier.sent.borrow().is_empty());
}

#[test]
fn missing_column_abandons_pass_without_error() {
    let loader = StaticLoader::new(&[&["Item", "Minimum"], &["Widget", "8"]]);
    let notifier = RecordingNotifier::default();

    let outcome = pass::run_pass(ReportFlavor::MinimumStock, &settings(), &loader, &notifier)
        .expect("pass succeeds");

    assert_eq!(
        outcome,
        PassOutcome::ColumnNotFound {
            columns: vec!["Required".into()]
        }
    );
    assert!(notifier.sent.borrow().is_empty());
}

#[test]
fn empty_sheet_is_reported_as_no_data() {
    let loader = StaticLoader::new(&[]);
    let notifier = RecordingNotifier::default();

    let outcome = pass::run_pass(ReportFlavor::Shortage, &settings(), &loader, &notifier)
        .expect("pass succeeds");

    assert_eq!(outcome, PassOutcome::NoData);
}

#[test]
fn transport_fault_is_not_an_empty_report() {
    let notifier = RecordingNotifier::default();
    let error = pass::run_pass(ReportFlavor::MinimumStock, &settings(), &FailingLoader, &notifier)
        .expect_err("fetch failure surfaces");
    assert!(error.is_transport());
    assert!(notifier.sent.borrow().is_empty());
}

#[test]
fn delivery_failure_fails_the_pass() {
    let loader = StaticLoader::new(&[&["Item", "Shortage"], &["Bolt", "-3"]]);
    let error = pass::run_pass(ReportFlavor::Shortage, &settings(), &loader, &RefusingNotifier)
        .expect_err("delivery failure surfaces");
    assert!(error.is_transport());
}

#[test]
fn missing_recipient_is_a_configuration_fault() {
    let settings = Settings::from_json(r#"{"spreadsheet_id": "sheet-id"}"#).expect("parsed");
    let loader = StaticLoader::new(&[&["Item", "Shortage"], &["Bolt", "-3"]]);
    let notifier = RecordingNotifier::default();

    let error = pass::run_pass(ReportFlavor::Shortage, &settings, &loader, &notifier)
        .expect_err("recipient required");
    assert!(matches!(error, StockError::MissingSetting("recipient_email")));
    assert!(!error.is_transport());
}

#[test]
fn repeated_pass_on_same_snapshot_is_identical() {
    let loader = StaticLoader::new(&[
        &["Item", "Minimum", "Required"],
        &["Widget", "8", "10"],
        &["Sprocket", "7", "10"],
        &["Gadget", "5", "10"],
    ]);
    let notifier = RecordingNotifier::default();
    let settings = settings();

    let first = pass::run_pass(ReportFlavor::MinimumStock, &settings, &loader, &notifier)
        .expect("first pass");
    let second = pass::run_pass(ReportFlavor::MinimumStock, &settings, &loader, &notifier)
        .expect("second pass");

    assert_eq!(first, second);
    let sent = notifier.sent.borrow();
    assert_eq!(sent[0], sent[1]);
}

#[test]
fn named_label_role_overrides_position() {
    let settings = Settings::from_json(
        r#"{
            "recipient_email": "buyer@example.com",
            "columns": { "item_label": "Part", "shortage": "Short Qty" }
        }"#,
    )
    .expect("settings parsed");
    let loader = StaticLoader::new(&[&["Short Qty", "Bin", "Part"], &["-4", "B7", "Washer"]]);

    let outcome = pass::prepare(ReportFlavor::Shortage, &settings, &loader).expect("pass succeeds");

    let PassOutcome::Reported(report) = outcome else {
        panic!("expected a report");
    };
    assert_eq!(report.rows[0].item, "Washer");
    assert_eq!(report.rows[0].cells, vec!["-4".to_string()]);
}
