//! Command-line interface definitions for detik_crawl.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most crawl options can also be provided via environment variables, and any
//! option left unset falls back to the YAML config file or the built-in
//! defaults (see [`crate::config::CrawlConfig`]).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Crawl a news search index into paired raw/stemmed CSV tables, or search them.
///
/// # Examples
///
/// ```sh
/// # Full default crawl: 600 pages, 15 at a time, before.csv + after.csv
/// detik_crawl crawl
///
/// # Smaller crawl with a config file and custom outputs
/// detik_crawl crawl -c crawl.yaml --pages 20 --raw-output out/raw.csv
///
/// # Rank the stemmed table against a query
/// detik_crawl search --input after.csv --top 5 banjir jakarta
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl index pages and write the raw and normalized tables
    Crawl(CrawlArgs),
    /// Rank rows of a normalized table with Okapi BM25
    Search(SearchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "DETIK_CRAWL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of index pages to crawl, starting at page 1
    #[arg(short, long, env = "DETIK_CRAWL_PAGES")]
    pub pages: Option<u32>,

    /// Maximum number of index pages fetched at once
    #[arg(short = 'n', long, env = "DETIK_CRAWL_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Search term sent to the index endpoint
    #[arg(short, long)]
    pub query: Option<String>,

    /// Output CSV for the raw extracted text
    #[arg(long)]
    pub raw_output: Option<PathBuf>,

    /// Output CSV for the normalized text
    #[arg(long)]
    pub normalized_output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Normalized CSV table to search
    #[arg(short, long, default_value = "after.csv")]
    pub input: PathBuf,

    /// Number of results to return
    #[arg(short, long, default_value_t = 10)]
    pub top: usize,

    /// Print results as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Query terms
    #[arg(required = true)]
    pub query: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_defaults() {
        let cli = Cli::parse_from(["detik_crawl", "crawl"]);
        let Command::Crawl(args) = cli.command else {
            panic!("expected crawl subcommand");
        };
        assert!(args.config.is_none());
        assert!(args.pages.is_none());
        assert!(args.concurrency.is_none());
    }

    #[test]
    fn test_crawl_flags() {
        let cli = Cli::parse_from([
            "detik_crawl",
            "crawl",
            "-c",
            "crawl.yaml",
            "--pages",
            "20",
            "-n",
            "4",
            "--raw-output",
            "/tmp/raw.csv",
        ]);
        let Command::Crawl(args) = cli.command else {
            panic!("expected crawl subcommand");
        };
        assert_eq!(args.config, Some(PathBuf::from("crawl.yaml")));
        assert_eq!(args.pages, Some(20));
        assert_eq!(args.concurrency, Some(4));
        assert_eq!(args.raw_output, Some(PathBuf::from("/tmp/raw.csv")));
        assert!(args.normalized_output.is_none());
    }

    #[test]
    fn test_search_parsing() {
        let cli = Cli::parse_from(["detik_crawl", "search", "--top", "3", "banjir", "jakarta"]);
        let Command::Search(args) = cli.command else {
            panic!("expected search subcommand");
        };
        assert_eq!(args.input, PathBuf::from("after.csv"));
        assert_eq!(args.top, 3);
        assert!(!args.json);
        assert_eq!(args.query, vec!["banjir", "jakarta"]);
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["detik_crawl", "search"]).is_err());
    }
}
