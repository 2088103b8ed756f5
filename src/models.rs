//! Data models for crawled articles.
//!
//! This module defines the core data structures used throughout the crawl:
//! - [`Record`]: one row of an output table
//! - [`ArticlePair`]: the raw and normalized records of one article
//! - [`PageResult`]: every pair gathered from one index page
//! - [`CrawlSummary`]: counters reported at the end of a run
//!
//! Field names serialize as `Title`, `Body` and `Link`, matching the header
//! row of both output tables.

use serde::{Deserialize, Serialize};

/// One row of an output table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    #[serde(rename = "Title", alias = "title")]
    pub title: String,
    #[serde(rename = "Body", alias = "body")]
    pub body: String,
    #[serde(rename = "Link", alias = "link")]
    pub link: String,
}

/// The two representations of one article.
///
/// Both records carry the same `link` and `title`; only `body` differs. The
/// fields are private so a pair can only be built through [`ArticlePair::new`],
/// which is what keeps the two halves consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePair {
    raw: Record,
    normalized: Record,
}

impl ArticlePair {
    pub fn new(link: &str, title: String, raw_body: String, normalized_body: String) -> Self {
        Self {
            raw: Record {
                title: title.clone(),
                body: raw_body,
                link: link.to_string(),
            },
            normalized: Record {
                title,
                body: normalized_body,
                link: link.to_string(),
            },
        }
    }

    pub fn raw(&self) -> &Record {
        &self.raw
    }

    pub fn normalized(&self) -> &Record {
        &self.normalized
    }

    pub fn link(&self) -> &str {
        &self.raw.link
    }
}

/// Pairs gathered from one index page, in the order article workers finished.
#[derive(Debug, Default)]
pub struct PageResult {
    pub page: u32,
    pub pairs: Vec<ArticlePair>,
    /// Links whose article fetch failed and were left out.
    pub dropped: usize,
}

/// Counters for one crawl run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub pages_ok: u32,
    pub pages_failed: u32,
    pub pairs_written: usize,
    pub articles_dropped: usize,
}

impl CrawlSummary {
    /// Fold one page's outcome into the totals.
    pub fn record_page(&mut self, outcome: &PageOutcome) {
        match outcome {
            PageOutcome::Written { pairs, dropped } => {
                self.pages_ok += 1;
                self.pairs_written += pairs;
                self.articles_dropped += dropped;
            }
            PageOutcome::Abandoned => self.pages_failed += 1,
        }
    }
}

/// What became of one index page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Written { pairs: usize, dropped: usize },
    Abandoned,
}
