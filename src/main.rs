use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;

mod aggregate;
mod config;
mod dates;
mod db;
mod error;
mod export;
mod models;
mod pipeline;
mod report;
mod repository;
mod table;

use dates::{Clock, DateSelector, FixedClock, SystemClock};
use pipeline::{ReportLoader, ReportSession};
use repository::PgAttendanceRepository;
use table::AttendanceTable;

#[derive(Parser)]
#[command(name = "coaching-attendance")]
#[command(about = "Attendance rolls and reports for coaching classes", long_about = None)]
struct Cli {
    /// Only log errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Log pipeline details
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Treat this date as today when resolving open-ended and monthly ranges
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DateArgs {
    /// Report a single day
    #[arg(long, conflicts_with_all = ["from", "to"])]
    date: Option<NaiveDate>,
    /// First day of the range; runs until today when --to is omitted
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day of the range
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
}

impl DateArgs {
    fn selector(&self) -> DateSelector {
        DateSelector::from_parts(self.date, self.from, self.to)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Markdown,
    Html,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample students and attendance
    Seed,
    /// Import attendance rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record attendance for a class on one day
    Mark {
        #[arg(long)]
        class: String,
        #[arg(long)]
        date: NaiveDate,
        /// Student ids marked present; everyone else is absent
        #[arg(long, value_delimiter = ',')]
        present: Vec<i64>,
    },
    /// Attendance report for one class
    Report {
        #[arg(long)]
        class: String,
        #[command(flatten)]
        dates: DateArgs,
        /// Filter rows by student name or registration number
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
        /// Write the rendered report here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Directory to write {class}_Attendance.xlsx into
        #[arg(long)]
        export: Option<PathBuf>,
        /// Directory to write {class}_Attendance.csv into
        #[arg(long)]
        export_csv: Option<PathBuf>,
    },
    /// Present/absent totals for every class
    Overview {
        #[command(flatten)]
        dates: DateArgs,
        /// Filter classes by name
        #[arg(long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = config::Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    let clock: Box<dyn Clock> = match cli.as_of {
        Some(today) => Box::new(FixedClock(today)),
        None => Box::new(SystemClock),
    };

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let written = db::import_csv(&pool, &csv).await?;
            println!("Wrote {written} attendance rows from {}.", csv.display());
        }
        Commands::Mark {
            class,
            date,
            present,
        } => {
            let present: HashSet<i64> = present.into_iter().collect();
            let marks = db::mark_attendance(&pool, &class, date, &present).await?;
            let present_count = marks
                .iter()
                .filter(|m| m.status == models::AttendanceStatus::Present)
                .count();
            println!(
                "Saved attendance for {} students in {class} on {date} ({present_count} present).",
                marks.len()
            );
        }
        Commands::Report {
            class,
            dates,
            search,
            format,
            out,
            export: xlsx_dir,
            export_csv: csv_dir,
        } => {
            let selector = dates.selector();
            let loader = ReportLoader::new(
                PgAttendanceRepository::new(pool),
                clock,
                config.fetch_retries,
            );

            let mut session = ReportSession::new();
            let token = session.begin();
            session.complete(token, loader.load(&class, &selector).await);

            let Some(loaded) = session.report() else {
                anyhow::bail!(session
                    .message()
                    .unwrap_or_else(|| format!("report for {class} did not complete")));
            };

            let mut table = AttendanceTable::from_report(loaded);
            if let Some(term) = search.as_deref() {
                table = table.filtered(term);
            }
            if xlsx_dir.is_some() {
                export::ensure_fits(&table)?;
            }

            let rendered = match format {
                ReportFormat::Markdown => report::build_report(&table, &selector),
                ReportFormat::Html => report::build_html(&table),
                ReportFormat::Json => serde_json::to_string_pretty(&table)?,
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Report written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }

            if let Some(message) = session.message() {
                eprintln!("{message}");
            }
            if let Some(dir) = xlsx_dir {
                let path = export::export_xlsx(&table, &dir)?;
                println!("Spreadsheet written to {}.", path.display());
            }
            if let Some(dir) = csv_dir {
                let path = export::export_csv(&table, &dir)?;
                println!("CSV written to {}.", path.display());
            }
        }
        Commands::Overview { dates, search } => {
            let selector = dates.selector();
            let loader = ReportLoader::new(
                PgAttendanceRepository::new(pool),
                clock,
                config.fetch_retries,
            );
            let summaries = loader.overview(&selector, search.as_deref()).await?;
            print!("{}", report::build_overview(&summaries, &selector));
        }
    }

    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("ATTENDANCE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
