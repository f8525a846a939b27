//! trendlag CLI binary.
//!
//! Stitches per-ticker downloads into combined quarterly tables and runs the
//! attention/return fixed-effects regressions over them.

mod pipeline;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pipeline::{read_tables, stitch_with_progress, write_stitched};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use trendlag::data::{AttentionCsvOptions, PriceCsvOptions, SourceKind};
use trendlag::output::{ExportFormat, Exporter, ReportBuilder};
use trendlag::{AnalysisOverrides, GroupAssignment, RunConfig, run_general, run_sectors};

#[derive(Parser)]
#[command(name = "trendlag")]
#[command(about = "trendlag: does lagged search attention predict quarterly returns?", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON run configuration (general/sectors overrides, group table)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine a folder of daily price files into quarterly closes
    StitchStocks {
        /// Folder of `<TICKER>.csv` files
        #[arg(long, default_value = "stock_data")]
        input_dir: PathBuf,

        /// Output table
        #[arg(long, default_value = "combined_stocks.csv")]
        output: PathBuf,

        /// Date column name
        #[arg(long, default_value = "Date")]
        date_column: String,

        /// Price column name
        #[arg(long, default_value = "Close")]
        value_column: String,
    },

    /// Combine a folder of monthly attention exports into quarterly means
    StitchTrends {
        /// Folder of `<TICKER>.csv` exports
        #[arg(long, default_value = "trends_data")]
        input_dir: PathBuf,

        /// Output table
        #[arg(long, default_value = "combined_trends.csv")]
        output: PathBuf,

        /// Token marking the header line
        #[arg(long, default_value = "Month")]
        marker: String,
    },

    /// Pooled regression over every entity
    General {
        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// One regression per sector plus the pooled ALL row
    Sectors {
        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        overrides: OverrideArgs,

        /// JSON object of ticker -> sector, replacing the built-in table
        #[arg(long)]
        groups: Option<PathBuf>,

        /// Summary file format
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct Inputs {
    /// Combined attention table
    #[arg(long, default_value = "combined_trends.csv")]
    trends: PathBuf,

    /// Combined price table
    #[arg(long, default_value = "combined_stocks.csv")]
    stocks: PathBuf,

    /// Directory for report files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Args)]
struct OverrideArgs {
    /// Attention lag in quarters
    #[arg(long, allow_negative_numbers = true)]
    lag: Option<i64>,

    /// Minimum rows per group
    #[arg(long)]
    min_rows: Option<usize>,

    /// Minimum entities per group
    #[arg(long)]
    min_entities: Option<usize>,
}

impl From<OverrideArgs> for AnalysisOverrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            lag: args.lag,
            min_rows: args.min_rows,
            min_entities: args.min_entities,
            regression: None,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    const fn export_format(self) -> ExportFormat {
        match self {
            Self::Csv => ExportFormat::Csv,
            Self::Json => ExportFormat::PrettyJson,
        }
    }

    const fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "sector_regression_summary.csv",
            Self::Json => "sector_regression_summary.json",
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut run_config = match &cli.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    match cli.command {
        Commands::StitchStocks {
            input_dir,
            output,
            date_column,
            value_column,
        } => {
            let kind = SourceKind::Price(PriceCsvOptions {
                date_column,
                value_column,
            });
            let outcome = stitch_with_progress(&input_dir, kind)?;
            write_stitched(&outcome, &output)?;
        }
        Commands::StitchTrends {
            input_dir,
            output,
            marker,
        } => {
            let kind = SourceKind::Attention(AttentionCsvOptions { marker });
            let outcome = stitch_with_progress(&input_dir, kind)?;
            write_stitched(&outcome, &output)?;
        }
        Commands::General { inputs, overrides } => {
            run_config.general = run_config.general.merge(overrides.into());
            general(&run_config, &inputs)?;
        }
        Commands::Sectors {
            inputs,
            overrides,
            groups,
            format,
        } => {
            run_config.sectors = run_config.sectors.merge(overrides.into());
            if let Some(path) = groups {
                run_config.groups = Some(GroupAssignment::from_json_file(&path)?);
            }
            sectors(&run_config, &inputs, format)?;
        }
    }

    Ok(())
}

fn general(run_config: &RunConfig, inputs: &Inputs) -> Result<(), Box<dyn std::error::Error>> {
    // Validate before touching any file.
    let config = run_config.general()?;
    let (attention, price) = read_tables(&inputs.trends, &inputs.stocks)?;

    let report = run_general(&attention, &price, &config)?;
    println!(
        "Panel: {} rows ({} dropped), {} entities, {} quarters",
        report.panel.regression_rows,
        report.panel.dropped_rows,
        report.panel.entities,
        report.panel.periods
    );

    match &report.outcome {
        Ok(result) => {
            let summary = ReportBuilder::new()
                .lag(report.lag)
                .result(result.clone())
                .build()?;
            let path = summary.write_to_dir(&inputs.output_dir)?;
            println!("\n{}", summary.to_text());
            println!("Saved summary to {}", path.display());
        }
        Err(skipped) => println!("Regression not estimated: {}", skipped),
    }
    Ok(())
}

fn sectors(
    run_config: &RunConfig,
    inputs: &Inputs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = run_config.sectors()?;
    let assignment = run_config.groups();
    let (attention, price) = read_tables(&inputs.trends, &inputs.stocks)?;

    let table = run_sectors(&attention, &price, &config, &assignment)?;

    for result in &table.results {
        println!("{}", result.console_line());
    }
    for skipped in &table.skipped {
        println!("Skipped {}", skipped);
    }
    println!("\n{}", table.to_ascii_table());

    let path = summary_path(&inputs.output_dir, format);
    table.export_to_file(&path, format.export_format())?;
    println!("Saved sector summary to {}", path.display());
    Ok(())
}

fn summary_path(dir: &Path, format: OutputFormat) -> PathBuf {
    dir.join(format.file_name())
}
