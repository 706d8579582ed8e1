use std::path::{Path, PathBuf};
use std::thread;

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use stock_watch::config::Settings;
use stock_watch::io::TableLoader;
use stock_watch::io::credentials::TokenCache;
use stock_watch::io::excel_read::WorkbookLoader;
use stock_watch::io::excel_write;
use stock_watch::io::mail::SmtpNotifier;
use stock_watch::io::sheets::SheetsClient;
use stock_watch::pass::{self, PassOutcome};
use stock_watch::report::{ReportFlavor, render_html};
use stock_watch::schedule::Scheduler;
use stock_watch::{Result, StockError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| StockError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run => execute_run(&cli.settings),
        Command::Check(args) => execute_check(&cli.settings, args),
        Command::Schedule { count } => execute_schedule(&cli.settings, count),
    }
}

/// Polls the scheduler forever. Only startup faults return.
fn execute_run(settings_path: &Path) -> Result<()> {
    let settings = Settings::load(settings_path)?;
    if let Err(error) = settings.validate() {
        warn!(%error, "settings incomplete, passes will fail until fixed");
    }
    let mut scheduler = build_scheduler(&settings)?;
    let poll_interval = settings.poll_interval();
    info!(next = ?scheduler.next_trigger(), "scheduler started");

    loop {
        scheduler.run_due(&Local::now(), |flavor| run_scheduled(flavor, settings_path));
        thread::sleep(poll_interval);
    }
}

/// Settings are re-read for every pass so edits apply without a restart.
fn run_scheduled(flavor: ReportFlavor, settings_path: &Path) -> Result<PassOutcome> {
    let settings = Settings::load(settings_path)?;
    let loader = sheets_loader(&settings)?;
    let notifier = SmtpNotifier::new(settings.smtp()?);
    pass::run_pass(flavor, &settings, &loader, &notifier)
}

fn execute_check(settings_path: &Path, args: CheckArgs) -> Result<()> {
    let flavor = ReportFlavor::from(args.job);
    let settings = if !settings_path.exists() && args.dry_run && args.workbook.is_some() {
        Settings::from_json("{}")?
    } else {
        Settings::load(settings_path)?
    };

    let loader: Box<dyn TableLoader> = match &args.workbook {
        Some(path) => {
            if !path.exists() {
                return Err(StockError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("workbook not found: {}", path.display()),
                )));
            }
            Box::new(WorkbookLoader::new(path.clone()))
        }
        None => Box::new(sheets_loader(&settings)?),
    };

    let outcome = if args.dry_run {
        let outcome = pass::prepare(flavor, &settings, loader.as_ref())?;
        if let PassOutcome::Reported(report) = &outcome {
            println!("{}", render_html(report));
        }
        outcome
    } else {
        let notifier = SmtpNotifier::new(settings.smtp()?);
        pass::run_pass(flavor, &settings, loader.as_ref(), &notifier)?
    };

    if let (Some(path), PassOutcome::Reported(report)) = (&args.export, &outcome) {
        excel_write::export_report(path, report)?;
        info!(path = %path.display(), "report exported");
    }

    eprintln!("{flavor}: {outcome}");
    Ok(())
}

fn execute_schedule(settings_path: &Path, count: usize) -> Result<()> {
    let settings = Settings::load(settings_path)?;
    let scheduler = build_scheduler(&settings)?;
    for (flavor, time) in scheduler.upcoming(&Local::now(), count) {
        println!("{}  {flavor}", time.format("%Y-%m-%d %H:%M:%S %Z"));
    }
    Ok(())
}

fn build_scheduler(settings: &Settings) -> Result<Scheduler<Local>> {
    let now = Local::now();
    let mut scheduler = Scheduler::new();
    scheduler.add(&settings.schedule.minimum_stock, ReportFlavor::MinimumStock, &now)?;
    scheduler.add(&settings.schedule.shortage, ReportFlavor::Shortage, &now)?;
    Ok(scheduler)
}

fn sheets_loader(settings: &Settings) -> Result<SheetsClient> {
    let client = SheetsClient::http_client(settings.request_timeout())?;
    let tokens = TokenCache::new(
        settings.token_file.clone(),
        settings.credentials_file.clone(),
        client.clone(),
    );
    Ok(SheetsClient::new(client, settings.spreadsheet_id()?, tokens))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Email inventory threshold reports from a spreadsheet."
)]
struct Cli {
    /// Path of the JSON settings file.
    #[arg(long, global = true, default_value = "settings.json")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run both passes on their schedules until the process is stopped.
    Run,
    /// Run a single pass now.
    Check(CheckArgs),
    /// Print upcoming trigger times.
    Schedule {
        /// Number of triggers to list per job.
        #[arg(long, default_value_t = 3)]
        count: usize,
    },
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Which report to produce.
    #[arg(long, value_enum)]
    job: Job,

    /// Read the sheet from a local .xlsx workbook instead of the remote
    /// spreadsheet.
    #[arg(long)]
    workbook: Option<PathBuf>,

    /// Print the rendered report instead of emailing it.
    #[arg(long)]
    dry_run: bool,

    /// Also write the report to an .xlsx file.
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Job {
    MinimumStock,
    Shortage,
}

impl From<Job> for ReportFlavor {
    fn from(job: Job) -> Self {
        match job {
            Job::MinimumStock => ReportFlavor::MinimumStock,
            Job::Shortage => ReportFlavor::Shortage,
        }
    }
}
