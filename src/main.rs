mod config;
mod fetch;
mod report;
mod source;
mod stats;
mod types;

use crate::config::Config;
use crate::fetch::FetchMode;
use crate::report::Report;
use crate::source::{CsvDirSource, HttpSource, PriceSource};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Parser;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// File with one ticker symbol per line.
    #[arg(long)]
    tickers: PathBuf,

    /// First day of the price history (YYYY-MM-DD).
    #[arg(long)]
    start: NaiveDate,

    /// Last day of the price history (YYYY-MM-DD), inclusive.
    #[arg(long)]
    end: NaiveDate,

    /// Output file for the per-ticker statistics table.
    #[arg(long, default_value = "stats.csv")]
    stats_out: PathBuf,

    /// Output file for the date-aligned wide table of daily returns.
    #[arg(long, default_value = "returns.csv")]
    returns_out: PathBuf,

    /// Read per-ticker CSV files from this directory instead of fetching over HTTP.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fetch tickers one after another instead of one worker per ticker.
    #[arg(long)]
    sequential: bool,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    if args.start > args.end {
        bail!("start date {} is after end date {}", args.start, args.end);
    }

    let cfg = match &args.config {
        Some(file) => Config::from_file(file).context("failed to load config")?,
        None => Config::default(),
    };
    log::info!("{cfg:#?}");

    let tickers = read_tickers(&args.tickers).context("failed to read tickers")?;
    if tickers.is_empty() {
        bail!("ticker file {:?} contains no symbols", args.tickers);
    }

    let source: Box<dyn PriceSource> = match &args.data_dir {
        Some(dir) => Box::new(CsvDirSource::new(dir.clone())),
        None => Box::new(HttpSource::new(&cfg.fetch).context("failed to construct source")?),
    };
    let mode = if args.sequential {
        FetchMode::Sequential
    } else {
        FetchMode::Threaded
    };

    let fetch_start = Instant::now();
    let batch = fetch::fetch_batch(source.as_ref(), &tickers, args.start, args.end, mode);
    log::info!(
        "fetched {} tickers in {:.2?}",
        batch.len(),
        fetch_start.elapsed()
    );

    for (ticker, outcome) in &batch {
        if let Err(error) = outcome {
            log::warn!("skipping {ticker}: {error}");
        }
    }

    let report = Report::from_batch(batch);
    report
        .write_stats_table(&args.stats_out)
        .context("failed to write statistics table")?;
    report
        .write_returns_wide(&args.returns_out)
        .context("failed to write returns table")?;
    log::info!("wrote {:?} and {:?}", args.stats_out, args.returns_out);

    Ok(())
}

fn read_tickers(file: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
    let tickers = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    Ok(tickers)
}
