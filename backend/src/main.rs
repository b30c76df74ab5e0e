//! Salesboard CLI - clean and aggregate sales sheets
//!
//! # Main Commands
//!
//! ```bash
//! salesboard serve                      # Start HTTP server (port 3000)
//! salesboard dashboard                  # Dashboard JSON from the configured sheet
//! salesboard dashboard sales.csv        # Dashboard JSON from a local export
//! ```
//!
//! # Stage Commands
//!
//! ```bash
//! salesboard parse sales.csv            # Raw rows as JSON
//! salesboard clean sales.csv            # Cleaned rows as JSON
//! salesboard summary sales.csv          # Metrics, grouped sums, time series
//! ```
//!
//! Inputs ending in `.json` are read as an array of row objects.

use clap::{Parser, Subcommand};
use salesboard::{
    api::AppState, config, run, run_source, CsvFileSource, GoogleSheetSource, PipelineConfig,
    PipelineRun, RawTable, SourceConfig, SourceInfo,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "salesboard")]
#[command(about = "Clean and aggregate spreadsheet sales data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output its rows as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Clean a table and output the cleaned rows
    Clean {
        /// Input CSV or JSON file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Clean a table and output metrics, grouped sums and the time series
    Summary {
        /// Input CSV or JSON file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Full pipeline: output the dashboard payload
    Dashboard {
        /// Input CSV or JSON file (default: configured sheet)
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include cleaned rows in the output
        #[arg(long)]
        records: bool,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: SALESBOARD_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),
        Commands::Clean { input, output } => cmd_clean(&input, output.as_deref()).await,
        Commands::Summary { input, output } => cmd_summary(&input, output.as_deref()).await,
        Commands::Dashboard {
            input,
            output,
            records,
        } => cmd_dashboard(input.as_deref(), output.as_deref(), records).await,
        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> CliResult<()> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let sheet = salesboard::parse_csv_file_auto(input)?;
    eprintln!("   Encoding: {}", sheet.encoding);
    eprintln!("   Delimiter: '{}'", salesboard::transform::pipeline::format_delimiter(sheet.delimiter));
    eprintln!("   Columns: {}", sheet.table.headers.join(", "));
    eprintln!("✅ Parsed {} rows", sheet.table.len());

    let json = serde_json::to_string_pretty(&sheet.table.to_json_records())?;
    write_output(&json, output)
}

async fn cmd_clean(input: &Path, output: Option<&Path>) -> CliResult<()> {
    let (_, run) = run_file(input).await?;

    let json = serde_json::to_string_pretty(&run.table.to_json_records())?;
    write_output(&json, output)
}

async fn cmd_summary(input: &Path, output: Option<&Path>) -> CliResult<()> {
    let (_, run) = run_file(input).await?;

    let metrics = &run.summary.metrics;
    eprintln!("\n💰 Total revenue:  {}", salesboard::transform::format_thousands(metrics.total));
    eprintln!(
        "📊 Avg sale:       {}",
        metrics
            .mean
            .map(salesboard::transform::format_thousands)
            .unwrap_or_else(|| "-".to_string())
    );

    let json = serde_json::to_string_pretty(&run.summary)?;
    write_output(&json, output)
}

async fn cmd_dashboard(input: Option<&Path>, output: Option<&Path>, records: bool) -> CliResult<()> {
    let (info, run) = match input {
        Some(path) => run_file(path).await?,
        None => {
            let source = GoogleSheetSource::new(SourceConfig::from_env()?);
            run_source(&source, &PipelineConfig::default()).await?
        }
    };

    let response = salesboard::api::DashboardResponse::new(info, &run, records);
    let json = serde_json::to_string_pretty(&response)?;
    write_output(&json, output)
}

async fn cmd_serve(port: Option<u16>) -> CliResult<()> {
    let source = match SourceConfig::from_env() {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("⚠️  {} - /api/dashboard disabled", e);
            None
        }
    };

    let state = AppState {
        source,
        pipeline: PipelineConfig::default(),
    };
    let port = port.unwrap_or_else(config::port_from_env);
    salesboard::server::start_server(port, state).await?;
    Ok(())
}

/// Run the pipeline on a local CSV or JSON file.
async fn run_file(input: &Path) -> CliResult<(SourceInfo, PipelineRun)> {
    let config = PipelineConfig::default();

    if input.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
        eprintln!("📄 Reading JSON rows: {}", input.display());
        let content = fs::read_to_string(input)?;
        let records: Vec<Value> = serde_json::from_str(&content)?;
        let table = RawTable::from_json_records(&records);

        let info = SourceInfo {
            origin: format!("file {}", input.display()),
            encoding: "utf-8".to_string(),
            delimiter: ',',
            headers: table.headers.clone(),
            row_count: table.len(),
        };
        return Ok((info, run(&table, &config)?));
    }

    Ok(run_source(&CsvFileSource::new(input), &config).await?)
}

fn write_output(content: &str, path: Option<&Path>) -> CliResult<()> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
