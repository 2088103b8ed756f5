//! Crawl configuration.
//!
//! Every knob of a run lives in [`CrawlConfig`]. Values come from three
//! layers, later layers winning:
//!
//! 1. Built-in defaults (the detik.com flood-news search of 2023)
//! 2. An optional YAML file passed with `--config`
//! 3. Command-line flags (see [`crate::cli::CrawlArgs`])
//!
//! # Example
//!
//! ```yaml
//! pages: 50
//! concurrency: 4
//! index:
//!   query: gempa
//! raw_output: out/raw.csv
//! normalized_output: out/stemmed.csv
//! ```

use crate::cli::CrawlArgs;
use crate::error::{CrawlError, Result};
use crate::scrapers::extract::SelectorSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Parameters of the search endpoint. Only `page` varies during a run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexQuery {
    pub base_url: String,
    pub query: String,
    pub site_id: String,
    pub sort_by: String,
    pub from_date: String,
    pub to_date: String,
}

impl Default for IndexQuery {
    fn default() -> Self {
        Self {
            base_url: "https://www.detik.com/search/searchall".to_string(),
            query: "banjir".to_string(),
            site_id: "2".to_string(),
            sort_by: "time".to_string(),
            from_date: "01/01/2023".to_string(),
            to_date: "30/12/2023".to_string(),
        }
    }
}

impl IndexQuery {
    /// Build the search URL for one result page.
    pub fn page_url(&self, page: u32) -> Result<Url> {
        let page = page.to_string();
        Url::parse_with_params(
            &self.base_url,
            [
                ("query", self.query.as_str()),
                ("siteid", self.site_id.as_str()),
                ("sortby", self.sort_by.as_str()),
                ("fromdatex", self.from_date.as_str()),
                ("todatex", self.to_date.as_str()),
                ("page", page.as_str()),
            ],
        )
        .map_err(|e| CrawlError::Config(format!("invalid index base_url {}: {e}", self.base_url)))
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout. `None` leaves the client without one.
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

/// Full configuration of a crawl run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Index pages `1..=pages` are crawled.
    pub pages: u32,
    /// Maximum number of index pages in flight at once.
    pub concurrency: usize,
    /// Attempts per fetch, including the first.
    pub retry_attempts: usize,
    /// Fixed delay between attempts, in milliseconds.
    pub retry_backoff_ms: u64,
    /// Zero-based paragraph positions dropped from every body selector match.
    pub body_skip_indices: Vec<usize>,
    pub title_selectors: Vec<String>,
    pub body_selectors: Vec<String>,
    /// Container of the search results; every anchor inside is an article link.
    pub list_selector: String,
    pub index: IndexQuery,
    pub http: HttpConfig,
    /// Table of raw extracted text.
    pub raw_output: PathBuf,
    /// Table of stemmed, stopword-filtered text.
    pub normalized_output: PathBuf,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            pages: 600,
            concurrency: 15,
            retry_attempts: 3,
            retry_backoff_ms: 1000,
            body_skip_indices: vec![3, 4],
            title_selectors: vec![
                "body > div.container > div.grid-row.content__bg > div.column-8 > article > div.detail__header > h1".to_string(),
                "#content > div.container.detail_content.group > div.l_content > div.group > article > div.jdl > h1".to_string(),
            ],
            body_selectors: vec![
                "body > div.container > div.grid-row.content__bg.mgt-16 > div.column-8 > article > div.detail__body.itp_bodycontent_wrapper > div.detail__body-text.itp_bodycontent p".to_string(),
                "#content > div.container.detail_content.group > div.l_content > div.group > article > div.group.detail_wrap.itp_bodycontent_wrapper > div.itp_bodycontent.detail_text.group p".to_string(),
                "#detikdetailtext p".to_string(),
            ],
            list_selector: "body > div.wrapper.full > div > div.list.media_rows.list-berita".to_string(),
            index: IndexQuery::default(),
            http: HttpConfig::default(),
            raw_output: PathBuf::from("before.csv"),
            normalized_output: PathBuf::from("after.csv"),
        }
    }
}

impl CrawlConfig {
    /// Load from an optional YAML file; a missing path yields the defaults.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|e| CrawlError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_yaml(&text)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| CrawlError::Config(e.to_string()))
    }

    /// Apply command-line overrides on top of the loaded values.
    pub fn apply_args(&mut self, args: &CrawlArgs) {
        if let Some(pages) = args.pages {
            self.pages = pages;
        }
        if let Some(concurrency) = args.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(query) = &args.query {
            self.index.query = query.clone();
        }
        if let Some(path) = &args.raw_output {
            self.raw_output = path.clone();
        }
        if let Some(path) = &args.normalized_output {
            self.normalized_output = path.clone();
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.pages == 0 {
            return Err(CrawlError::Config("pages must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(CrawlError::Config("concurrency must be at least 1".into()));
        }
        if self.retry_attempts == 0 {
            return Err(CrawlError::Config("retry_attempts must be at least 1".into()));
        }
        if self.raw_output == self.normalized_output {
            return Err(CrawlError::Config(
                "raw_output and normalized_output must differ".into(),
            ));
        }
        if SelectorSet::parse(&self.title_selectors)?.is_empty() {
            return Err(CrawlError::Config("title_selectors must not be empty".into()));
        }
        if SelectorSet::parse(&self.body_selectors)?.is_empty() {
            return Err(CrawlError::Config("body_selectors must not be empty".into()));
        }
        SelectorSet::parse(std::slice::from_ref(&self.list_selector))?;
        self.index.page_url(1)?;
        Ok(())
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
