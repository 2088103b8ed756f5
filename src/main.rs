//! # detik_crawl
//!
//! Crawls a paginated news search index, follows every article link, and
//! writes two CSV tables side by side: the extracted text as-is, and the same
//! text tokenized, stopword-filtered and stemmed.
//!
//! ## Usage
//!
//! ```sh
//! detik_crawl crawl --pages 50 --concurrency 8
//! detik_crawl search --input after.csv banjir jakarta
//! ```
//!
//! ## Architecture
//!
//! The crawl follows a pipeline architecture:
//! 1. **Indexing**: fetch search-result pages, at most `concurrency` at a time
//! 2. **Fetching**: fetch every linked article of a page concurrently
//! 3. **Normalizing**: build the stemmed variant of each article body
//! 4. **Output**: append each raw/stemmed pair to both tables under one lock

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod crawler;
mod error;
mod models;
mod outputs;
mod retry;
mod scrapers;
mod search;
mod text;
mod utils;

use cli::{Cli, Command, CrawlArgs, SearchArgs};
use config::CrawlConfig;
use crawler::{AdmissionGate, Crawler};
use outputs::tables::DualSink;
use retry::FixedRetry;
use scrapers::detik::DetikScraper;
use text::indonesian::Indonesian;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    match args.command {
        Command::Crawl(args) => run_crawl(args).await,
        Command::Search(args) => run_search(args),
    }
}

async fn run_crawl(args: CrawlArgs) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    info!("detik_crawl starting up");

    let mut config = CrawlConfig::load(args.config.as_deref())?;
    config.apply_args(&args);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // The run aborts here, before any request, if either table can't be created.
    let sink = match DualSink::create(&config.raw_output, &config.normalized_output) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            error!(
                raw = %config.raw_output.display(),
                normalized = %config.normalized_output.display(),
                error = %e,
                "Cannot create output tables"
            );
            return Err(e.into());
        }
    };

    let client = scrapers::build_client(&config.http)?;
    let scraper = Arc::new(DetikScraper::new(client, &config, Arc::new(Indonesian::new()))?);
    let crawler = Crawler::new(
        scraper,
        sink,
        AdmissionGate::new(config.concurrency),
        config.pages,
        FixedRetry::new("page", config.retry_attempts, config.retry_backoff()),
    );

    let summary = crawler.run().await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        pages_ok = summary.pages_ok,
        pages_failed = summary.pages_failed,
        pairs_written = summary.pairs_written,
        articles_dropped = summary.articles_dropped,
        raw = %config.raw_output.display(),
        normalized = %config.normalized_output.display(),
        "Execution complete"
    );
    Ok(())
}

fn run_search(args: SearchArgs) -> Result<(), Box<dyn Error>> {
    let records = search::load_corpus(&args.input)?;
    let query = args.query.join(" ");
    let hits = search::search(&records, &query, args.top);
    info!(%query, hits = hits.len(), "Search complete");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("No results for {query:?}");
    }
    for hit in &hits {
        println!("{}. {}", hit.rank, hit.title);
        println!("   {}", hit.link);
        println!("   score: {:.4}", hit.score);
    }
    Ok(())
}
