//! data-loader: fetch daily prices from Alpha Vantage, clean them into a
//! combined table and compare two symbols on seven metrics.
//!
//! Usage:
//!   cargo run -p data-loader -- fetch --symbols AMZN NVDA
//!   cargo run -p data-loader -- prepare --split-adjust
//!   cargo run -p data-loader -- compare NVDA TSLA
//!   cargo run -p data-loader -- compare NVDA TSLA --benchmark SPY --json
//!   cargo run -p data-loader -- adjust TSLA 2020-08-28 2213.40

use alpha_vantage_client::{AlphaVantageClient, OutputSize};
use analysis_core::AnalysisError;
use analysis_orchestrator::{compare, BenchmarkSource};
use anyhow::Context;
use clap::{Parser, Subcommand};
use corporate_actions::{adjust_for_splits, SplitTable};
use data_loader::config::parse_date;
use data_loader::{fetch_all, load_dataset, prepare, render_comparison, LoaderConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "data-loader")]
#[command(about = "Fetch, clean and compare daily stock prices", long_about = None)]
struct Cli {
    /// JSON config file (defaults come from the environment)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily series and company overviews
    Fetch {
        /// Symbols to fetch (defaults to the configured list)
        #[arg(long, num_args = 1..)]
        symbols: Vec<String>,
        /// First date kept, YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,
        /// Last date kept, YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,
        /// Request only the latest 100 days
        #[arg(long)]
        compact: bool,
        /// Skip the OVERVIEW request
        #[arg(long)]
        no_overview: bool,
    },
    /// Clean per-symbol files and write the combined file
    Prepare {
        /// Rescale prices for known stock splits
        #[arg(long)]
        split_adjust: bool,
    },
    /// Compare two symbols
    Compare {
        first: String,
        second: String,
        /// Use this symbol's close column as the beta benchmark for both
        #[arg(long)]
        benchmark: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Split-adjust a single historical price
    Adjust {
        ticker: String,
        date: String,
        price: f64,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<LoaderConfig> {
    let mut config = match &cli.config {
        Some(path) => LoaderConfig::from_json_file(path)?,
        None => LoaderConfig::from_env()?,
    };

    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "data_loader=info,alpha_vantage_client=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Fetch { symbols, start, end, compact, no_overview } => {
            let mut config = config.with_symbols(&symbols);
            if let Some(start) = start {
                config.fetch_start = parse_date(&start)?;
            }
            if let Some(end) = end {
                config.fetch_end = parse_date(&end)?;
            }
            anyhow::ensure!(
                config.fetch_start <= config.fetch_end,
                "--start must not be after --end"
            );

            let output_size = if compact { OutputSize::Compact } else { OutputSize::Full };
            let client = AlphaVantageClient::new(config.require_api_key()?.to_string())
                .with_output_size(output_size);

            tracing::info!(
                "fetching {} symbols, {}..{}, into {}",
                config.sources.len(),
                config.fetch_start,
                config.fetch_end,
                config.data_dir.display()
            );
            let summary = fetch_all(&client, &config, !no_overview).await?;

            tracing::info!(
                "Done! {} rows across {} symbols ({} failed)",
                summary.rows_written,
                summary.fetched.len(),
                summary.failed.len()
            );
            for (symbol, reason) in &summary.failed {
                eprintln!("{}: {}", symbol, reason);
            }
        }
        Commands::Prepare { split_adjust } => {
            let splits = split_adjust.then(SplitTable::builtin);
            let summary = prepare(&config, splits.as_ref())
                .with_context(|| format!("preparing data in {}", config.data_dir.display()))?;

            for s in &summary.symbols {
                println!("{:<6} {:>6} rows  ({} dropped)", s.symbol, s.rows, s.dropped);
            }
            for symbol in &summary.missing {
                println!("{:<6} missing", symbol);
            }
            println!(
                "{} rows written to {}",
                summary.combined_rows,
                config.combined_path().display()
            );
        }
        Commands::Compare { first, second, benchmark, json } => {
            let dataset = load_dataset(&config).with_context(|| {
                format!("loading data from {} (run `prepare` first?)", config.data_dir.display())
            })?;
            let source = match benchmark {
                Some(symbol) => BenchmarkSource::Symbol(symbol),
                None => BenchmarkSource::OwnColumn,
            };

            let result = match compare(
                &first,
                &second,
                &dataset.series,
                &dataset.combined,
                &source,
                &config.metrics,
            ) {
                Ok(result) => result,
                Err(AnalysisError::UnknownSymbol(what)) => {
                    eprintln!("Invalid stock ticker: {}", what);
                    eprintln!("Available stocks: {}", dataset.available_symbols().join(", "));
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", render_comparison(&result));
            }
        }
        Commands::Adjust { ticker, date, price } => {
            let date = parse_date(&date)?;
            anyhow::ensure!(
                price.is_finite() && price >= 0.0,
                "price must be a non-negative number"
            );
            println!("{:.4}", adjust_for_splits(&ticker, date, price));
        }
    }

    Ok(())
}
