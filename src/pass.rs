use std::fmt;

use tracing::{info, instrument, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::evaluate::{Evaluation, Evaluator, Rule};
use crate::io::mail::Notifier;
use crate::io::{SheetRange, TableLoader};
use crate::model::Table;
use crate::report::{Report, ReportFlavor, build_report, render_html};
use crate::resolve::MatchMode;

/// How a pass ended when no error occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// A report was built (and delivered unless the pass was a dry run).
    Reported(Report),
    /// The table had no rows matching the rule.
    NothingToReport,
    /// The sheet returned no cells at all.
    NoData,
    /// A column the rule needs is missing from the header.
    ColumnNotFound { columns: Vec<String> },
}

impl fmt::Display for PassOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassOutcome::Reported(report) => write!(f, "{} item(s) reported", report.rows.len()),
            PassOutcome::NothingToReport => f.write_str("nothing to report"),
            PassOutcome::NoData => f.write_str("no data found"),
            PassOutcome::ColumnNotFound { columns } => {
                write!(f, "column not found: {}", columns.join(", "))
            }
        }
    }
}

/// Per-pass parameters derived from the settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PassPlan {
    pub flavor: ReportFlavor,
    pub sheet: String,
    pub evaluator: Evaluator,
}

impl PassPlan {
    /// Builds the plan for `flavor` from the current settings.
    pub fn from_settings(flavor: ReportFlavor, settings: &Settings) -> Self {
        let columns = &settings.columns;
        let (rule, mode) = match flavor {
            ReportFlavor::MinimumStock => (
                Rule::RatioShortage {
                    minimum: columns.minimum.clone(),
                    required: columns.required.clone(),
                    ratio: settings.minimum_ratio,
                },
                MatchMode::Exact,
            ),
            ReportFlavor::Shortage => (Rule::negative_value(&columns.shortage), MatchMode::Relaxed),
        };
        Self {
            flavor,
            sheet: settings.sheet_name.clone(),
            evaluator: Evaluator::new(rule, settings.label_column(), mode),
        }
    }

    /// Evaluates a snapshot and builds the report, without any IO.
    pub fn check(&self, header: &[String], table: &Table) -> PassOutcome {
        match self.evaluator.evaluate_with_header(header, table) {
            Evaluation::ColumnNotFound { columns } => PassOutcome::ColumnNotFound { columns },
            evaluation => {
                let unreadable = evaluation.unreadable_rows();
                let flagged = evaluation.into_flagged();
                info!(
                    report = %self.flavor,
                    flagged = flagged.len(),
                    unreadable,
                    "rows evaluated"
                );
                if flagged.is_empty() {
                    return PassOutcome::NothingToReport;
                }
                let fields = self.evaluator.rule.fields();
                let report = build_report(self.flavor, &flagged, &fields);
                if report.is_empty() {
                    PassOutcome::NothingToReport
                } else {
                    PassOutcome::Reported(report)
                }
            }
        }
    }

    /// Fetches the snapshot this plan needs. The shortage pass reads its
    /// header with a separate header-row request, as the sheet is laid out
    /// with the header on row 1.
    pub fn load(&self, loader: &dyn TableLoader) -> Result<(Vec<String>, Table)> {
        match self.flavor {
            ReportFlavor::MinimumStock => {
                let table = loader.fetch(&self.sheet, SheetRange::Full)?;
                Ok((table.header.clone(), table))
            }
            ReportFlavor::Shortage => {
                let header = loader.fetch(&self.sheet, SheetRange::HeaderRow)?.header;
                let table = loader.fetch(&self.sheet, SheetRange::Full)?;
                Ok((header, table))
            }
        }
    }
}

/// Runs one fetch-evaluate-report cycle and returns the outcome without
/// sending anything.
#[instrument(level = "info", skip(settings, loader), fields(report = %flavor))]
pub fn prepare(
    flavor: ReportFlavor,
    settings: &Settings,
    loader: &dyn TableLoader,
) -> Result<PassOutcome> {
    let plan = PassPlan::from_settings(flavor, settings);
    let (header, table) = plan.load(loader)?;
    if table.is_empty() && header.is_empty() {
        info!(sheet = %plan.sheet, "no data found");
        return Ok(PassOutcome::NoData);
    }

    let outcome = plan.check(&header, &table);
    match &outcome {
        PassOutcome::ColumnNotFound { columns } => {
            warn!(sheet = %plan.sheet, ?columns, "column not found, pass abandoned");
        }
        PassOutcome::NothingToReport => {
            info!(sheet = %plan.sheet, "no items crossed the threshold");
        }
        PassOutcome::Reported(_) | PassOutcome::NoData => {}
    }
    Ok(outcome)
}

/// Runs one full pass: fetch, evaluate, and email the report to the
/// configured recipient when any rows were flagged.
#[instrument(level = "info", skip(settings, loader, notifier), fields(report = %flavor))]
pub fn run_pass(
    flavor: ReportFlavor,
    settings: &Settings,
    loader: &dyn TableLoader,
    notifier: &dyn Notifier,
) -> Result<PassOutcome> {
    let recipient = settings.recipient_email()?;
    let outcome = prepare(flavor, settings, loader)?;
    if let PassOutcome::Reported(report) = &outcome {
        let body = render_html(report);
        notifier.send(recipient, flavor.subject(), &body)?;
        info!(rows = report.rows.len(), recipient, "report delivered");
    }
    Ok(outcome)
}
