use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use rollover_toolkit::analysis::history::HistoricalAverager;
use rollover_toolkit::analysis::report::Report;
use rollover_toolkit::config::Config;
use rollover_toolkit::data::calendar::{ExpiryRule, ReportDates};
use rollover_toolkit::data::discovery::{ensure_dir, InputFiles, InputLocator};
use rollover_toolkit::data::loader::DataLoader;
use rollover_toolkit::output::{table, workbook};
use rollover_toolkit::pipeline::{ReportInputs, RolloverPipeline};
use rollover_toolkit::types::{Bucket, MonthYear};
use std::path::{Path, PathBuf};
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "rollover-report",
    about = "Generates the monthly stock futures rollover report (CSV + XLSX)"
)]
struct Args {
    /// Report month as MMMYY (e.g. DEC25). Defaults to the current month.
    month_year: Option<String>,

    /// YAML configuration file.
    #[arg(long, default_value = "config/rollover.yaml")]
    config: PathBuf,

    /// Futures file; skips date-based lookup in the futures folder.
    #[arg(long)]
    futures: Option<PathBuf>,

    /// Current-period spot file.
    #[arg(long)]
    spot: Option<PathBuf>,

    /// Previous-period spot file.
    #[arg(long)]
    prev_spot: Option<PathBuf>,

    /// Sector mapping file; overrides `paths.sector_file`.
    #[arg(long)]
    sectors: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Args {
    fn needs_discovery(&self) -> bool {
        self.futures.is_none() || self.spot.is_none() || self.prev_spot.is_none()
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rollover_toolkit=info,rollover_report=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_inputs(args: &Args, config: &Config, month: MonthYear) -> Result<InputFiles> {
    let locator = InputLocator::new(&config.paths);
    let sectors = args.sectors.clone().unwrap_or_else(|| locator.sectors());

    if !args.needs_discovery() {
        return Ok(InputFiles {
            futures: args.futures.clone().unwrap_or_default(),
            spot: args.spot.clone().unwrap_or_default(),
            prev_spot: args.prev_spot.clone().unwrap_or_default(),
            sectors,
        });
    }

    let rule = ExpiryRule::new(config.expiry.switch_date);
    let dates = ReportDates::for_month(month, &rule, Local::now().date_naive())?;
    info!(
        current_expiry = %dates.current_expiry,
        previous_expiry = %dates.previous_expiry,
        "resolved expiry dates"
    );

    Ok(InputFiles {
        futures: match &args.futures {
            Some(path) => path.clone(),
            None => locator.futures(&dates)?,
        },
        spot: match &args.spot {
            Some(path) => path.clone(),
            None => locator.spot(&dates)?,
        },
        prev_spot: match &args.prev_spot {
            Some(path) => path.clone(),
            None => locator.prev_spot(&dates)?,
        },
        sectors,
    })
}

fn load_inputs(files: &InputFiles, config: &Config) -> Result<ReportInputs> {
    let columns = &config.columns;
    Ok(ReportInputs {
        futures: DataLoader::load_futures(&files.futures, columns)
            .with_context(|| format!("reading futures data from {}", files.futures.display()))?,
        spot: DataLoader::load_spot(&files.spot, columns)
            .with_context(|| format!("reading spot data from {}", files.spot.display()))?,
        prev_spot: DataLoader::load_spot(&files.prev_spot, columns).with_context(|| {
            format!("reading previous spot data from {}", files.prev_spot.display())
        })?,
        sectors: DataLoader::load_sectors(&files.sectors, columns)
            .with_context(|| format!("reading sector data from {}", files.sectors.display()))?,
    })
}

fn print_summary(report: &Report, csv_path: &Path, xlsx_path: &Path) {
    println!("\n=== Rollover Report {} ===", report.period);
    println!("{:<20} {:>8}", "Sheet", "Rows");
    println!("{:-<29}", "");
    println!("{:<20} {:>8}", workbook::FULL_SHEET, report.rows.len());
    for bucket in Bucket::ALL {
        println!(
            "{:<20} {:>8}",
            bucket.name(),
            report.bucket_rows(bucket).len()
        );
    }
    let flagged = report.flagged_rows().len();
    if flagged > 0 {
        println!("{:<20} {:>8}", "Non-finite rows", flagged);
    }
    println!("\nCSV:  {}", csv_path.display());
    println!("XLSX: {}", xlsx_path.display());
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json);

    let config = Config::load_or_default(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;

    let month = match &args.month_year {
        Some(label) => MonthYear::parse(label)?,
        None => MonthYear::from_date(Local::now().date_naive()),
    };

    let run_id = Uuid::new_v4();
    let run = info_span!("run", %run_id, month = %month);
    let _run = run.enter();
    info!("starting rollover report generation");

    let files = resolve_inputs(&args, &config, month)?;
    let inputs = load_inputs(&files, &config)?;

    let history = HistoricalAverager::new(&config.paths.archive_dir, config.history.months);
    let report = RolloverPipeline::new(&history)
        .run(inputs)
        .context("computing rollover report")?;

    ensure_dir(&config.paths.archive_dir)
        .with_context(|| format!("creating {}", config.paths.archive_dir.display()))?;
    ensure_dir(&config.paths.workbook_dir)
        .with_context(|| format!("creating {}", config.paths.workbook_dir.display()))?;

    let csv_path = table::write_csv(&report, &config.paths.archive_dir)?;
    info!(path = %csv_path.display(), "wrote CSV report");
    let xlsx_path = workbook::write_workbook(&report, &config.paths.workbook_dir)?;
    info!(path = %xlsx_path.display(), "wrote workbook");

    print_summary(&report, &csv_path, &xlsx_path);
    Ok(())
}
