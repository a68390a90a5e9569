mod config;
mod error;
mod loader;
mod models;
mod pipeline;
mod report;
mod scraper;
mod storage;
mod utils;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::error::ReportError;
use crate::loader::load_dataset;
use crate::pipeline::Pipeline;
use crate::report::Report;
use crate::scraper::HttpClient;
use crate::storage::{DatasetWriter, PersistOutcome};

#[derive(Parser)]
#[command(name = "books", about = "Catalogue scraper and price/rating report", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every listing page and write the dataset CSV
    Scrape(ScrapeArgs),

    /// Statistics and charts from a previously written dataset
    Report(ReportArgs),

    /// Scrape, then report on the fresh dataset
    Run {
        #[command(flatten)]
        scrape: ScrapeArgs,
        #[command(flatten)]
        report: ReportOutput,
    },
}

#[derive(Args)]
struct ScrapeArgs {
    /// Number of listing pages (default: 50)
    #[arg(long)]
    pages: Option<u32>,

    /// Catalogue directory the page-N.html files live under
    #[arg(long)]
    base_url: Option<String>,

    /// Dataset CSV to write (default: books_data.csv)
    #[arg(short, long, env = "BOOKS_OUTPUT")]
    output: Option<PathBuf>,

    /// Pause between requests in milliseconds (default: 1000)
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[derive(Args)]
struct ReportArgs {
    /// Dataset CSV to read (default: books_data.csv)
    #[arg(short, long, env = "BOOKS_INPUT")]
    input: Option<PathBuf>,

    #[command(flatten)]
    output: ReportOutput,
}

#[derive(Args)]
struct ReportOutput {
    /// Histogram bins for the price distribution
    #[arg(long)]
    bins: Option<usize>,

    /// Also write the text charts to this file
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write a JSON summary to this file
    #[arg(long)]
    json: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "books=info,warn",
        1 => "books=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let mut config = AppConfig::load()?;

    match cli.command {
        Command::Scrape(args) => {
            args.apply(&mut config);
            scrape(&config).await?;
        }

        Command::Report(args) => {
            let input = args
                .input
                .unwrap_or_else(|| config.storage.output_path.clone());
            report(&config, &input, &args.output)?;
        }

        Command::Run { scrape: args, report: output } => {
            args.apply(&mut config);
            if scrape(&config).await? {
                report(&config, &config.storage.output_path, &output)?;
            }
        }
    }

    Ok(())
}

impl ScrapeArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(pages) = self.pages {
            config.scraper.page_count = pages;
        }
        if let Some(base_url) = self.base_url {
            config.scraper.base_url = base_url;
        }
        if let Some(output) = self.output {
            config.storage.output_path = output;
        }
        if let Some(delay) = self.delay_ms {
            config.scraper.request_delay_ms = delay;
        }
    }
}

/// Returns whether a dataset was written.
async fn scrape(config: &AppConfig) -> Result<bool> {
    let _t = utils::Timer::start("Scrape");

    let client = HttpClient::new(&config.scraper)?;
    let pipeline = Pipeline::new(&config.scraper)?;
    let outcome = pipeline.run(&client).await?;
    let stats = &outcome.stats;

    println!("─────────────────────────────────");
    println!("  Scrape summary");
    println!("─────────────────────────────────");
    println!("  Started        : {}", stats.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Finished       : {}", stats.finished_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Pages          : {}/{} ok", stats.pages_succeeded(), stats.pages_attempted);
    if !stats.failed_pages.is_empty() {
        println!("  Failed pages   : {:?}", stats.failed_pages);
    }
    println!("  Books          : {}", stats.records);
    println!("  Missing title  : {}", stats.titles_missing);
    println!(
        "  Missing price  : {} (+{} unparseable)",
        stats.prices_missing, stats.prices_unparseable
    );
    println!(
        "  Missing rating : {} (+{} unrecognised)",
        stats.ratings_missing,
        stats.unrecognised_ratings.values().sum::<usize>()
    );
    println!("─────────────────────────────────");

    match DatasetWriter::persist(&outcome.records, &config.storage.output_path)? {
        PersistOutcome::Written { rows, path } => {
            println!("Saved {} books to {}", rows, path.display());
            Ok(true)
        }
        PersistOutcome::Skipped => {
            println!("No data was available to save to CSV.");
            Ok(false)
        }
    }
}

fn report(config: &AppConfig, input: &Path, output: &ReportOutput) -> Result<()> {
    let rows = load_dataset(input)?;
    info!("Total books in dataset: {}", rows.len());

    let bins = output.bins.unwrap_or(config.report.histogram_bins);
    let report =
        Report::from_rows(&rows, bins).ok_or_else(|| ReportError::Empty(input.to_path_buf()))?;

    let width = config.report.chart_width;
    print!("{}", report.render_text(width));

    if let Some(path) = &output.out {
        report.write_text(path, width)?;
        info!("Report written to {:?}", path);
    }
    if let Some(path) = &output.json {
        report.write_json(path)?;
        info!("JSON summary written to {:?}", path);
    }

    Ok(())
}
