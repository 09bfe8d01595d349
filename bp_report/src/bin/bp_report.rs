//! bp-report command line.
//!
//! # Usage
//!
//! ```bash
//! # Analyze exported files
//! bp-report analyze -i M7-1-2025-06-01.csv Evolv-1-2025-06-01.csv -o analiza.csv
//!
//! # Download from one or all paired devices, then analyze
//! bp-report download M7
//! bp-report download all --config bp-report.toml
//!
//! # Analyze today's previously downloaded files without downloading
//! bp-report download none
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use bp_report::fetch::{
    analysis_file_name, download_file_name, select_devices, CommandFetcher, DeviceFetcher,
};
use bp_report::transformations::{parse_bound, BoundKind};
use bp_report::{Language, ReportConfig, ReportPipeline};

/// Blood-pressure report generator
#[derive(Parser, Debug)]
#[command(name = "bp-report")]
#[command(about = "Merge monitor exports and produce summary tables and charts")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "BP_REPORT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge and analyze exported CSV files
    Analyze(AnalyzeArgs),
    /// Download from paired devices, then analyze the downloads
    Download(DownloadArgs),
}

/// Options shared by both commands.
#[derive(Args, Debug, Clone)]
struct ReportArgs {
    /// Include samples from this date or time on (YYYY-MM-DD [HH:MM[:SS]])
    #[arg(long)]
    start_date: Option<String>,

    /// Include samples up to this date or time; a bare date covers the whole day
    #[arg(long)]
    end_date: Option<String>,

    /// Label language (en, pl)
    #[arg(long)]
    language: Option<Language>,

    /// Keep the 2nd and 3rd readings in file order
    #[arg(long)]
    keep_column_order: bool,

    /// Cap for workbook column widths
    #[arg(long)]
    max_column_width: Option<usize>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Input CSV files
    #[arg(short, long, num_args = 1.., required = true)]
    input: Vec<PathBuf>,

    /// Output base path; every artifact shares its stem
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Args, Debug)]
struct DownloadArgs {
    /// Device name from the configuration, `all`, or `none` to analyze
    /// today's files without downloading
    device: String,

    /// Directory for downloads and the analysis output
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    #[command(flatten)]
    report: ReportArgs,
}

fn load_config(path: Option<&Path>) -> Result<ReportConfig> {
    match path {
        Some(path) => ReportConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(ReportConfig::default()),
    }
}

fn apply_overrides(config: &mut ReportConfig, args: &ReportArgs) -> Result<()> {
    if let Some(raw) = &args.start_date {
        config.range.start = Some(
            parse_bound(raw, BoundKind::Start)
                .with_context(|| format!("Invalid start date '{}'", raw))?,
        );
    }
    if let Some(raw) = &args.end_date {
        config.range.end = Some(
            parse_bound(raw, BoundKind::End).with_context(|| format!("Invalid end date '{}'", raw))?,
        );
    }
    if let Some(language) = args.language {
        config.language = language;
    }
    if args.keep_column_order {
        config.swap_metric_columns = false;
    }
    if let Some(width) = args.max_column_width {
        config.max_column_width = width;
    }
    config.validate()?;
    Ok(())
}

fn run_report(config: ReportConfig) -> Result<()> {
    let pipeline = ReportPipeline::new(config);
    let report = pipeline.run().context("Report generation failed")?;
    let paths = pipeline.artifact_paths();

    for skipped in &report.skipped {
        info!("Skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    println!("{}", report.summary);
    info!(
        "Analysis complete. Results saved as '{}', '{}', '{}', '{}' and '{}'",
        paths.csv.display(),
        paths.image.display(),
        paths.workbook.display(),
        paths.summary.display(),
        paths.document.display()
    );
    Ok(())
}

fn analyze(mut config: ReportConfig, args: AnalyzeArgs) -> Result<()> {
    apply_overrides(&mut config, &args.report)?;
    config.inputs = args.input;
    config.output = args.output;
    run_report(config)
}

fn download(mut config: ReportConfig, args: DownloadArgs) -> Result<()> {
    apply_overrides(&mut config, &args.report)?;
    let today = chrono::Local::now().date_naive();

    let inputs = if args.device.eq_ignore_ascii_case("none") {
        config
            .devices
            .iter()
            .map(|d| args.output_dir.join(download_file_name(&d.name, today)))
            .collect()
    } else {
        let fetcher = CommandFetcher::new(config.fetch.clone());
        let mut inputs = Vec::new();
        for device in select_devices(&config.devices, &args.device)? {
            let destination = args.output_dir.join(download_file_name(&device.name, today));
            inputs.push(fetcher.fetch(device, &destination)?);
        }
        inputs
    };

    config.inputs = inputs;
    config.output = args.output_dir.join(analysis_file_name(today));
    info!("Running main analysis");
    run_report(config)
}

fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze(args) => analyze(config, args),
        Command::Download(args) => download(config, args),
    }
}
