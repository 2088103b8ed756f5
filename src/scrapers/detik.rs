//! detik.com search index and article scraper.
//!
//! The search endpoint returns a paginated list of results; every anchor
//! inside the result container is an article link. Articles have gone
//! through several layouts, so title and body are located with ordered
//! selector lists (see [`crate::config::CrawlConfig`]).
//!
//! Each article yields an [`ArticlePair`]: the extracted text as-is, and the
//! same text run through [`normalize`].

use crate::config::{CrawlConfig, IndexQuery};
use crate::error::{CrawlError, Result};
use crate::models::{ArticlePair, PageResult};
use crate::retry::FixedRetry;
use crate::scrapers::extract::{ExtractMode, SelectorSet, extract_first_match};
use crate::scrapers::fetch_html;
use crate::text::{Linguistics, normalize};
use crate::utils::truncate_for_log;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{Instrument, debug, error, info, instrument};

/// Fetches index pages and the articles they link to.
///
/// Holds no mutable state, so one instance is shared by every worker.
pub struct DetikScraper {
    client: Client,
    index: IndexQuery,
    list: Selector,
    anchor: Selector,
    titles: SelectorSet,
    bodies: SelectorSet,
    body_skip: Vec<usize>,
    retry: FixedRetry,
    lang: Arc<dyn Linguistics>,
}

impl DetikScraper {
    pub fn new(client: Client, config: &CrawlConfig, lang: Arc<dyn Linguistics>) -> Result<Self> {
        let list = Selector::parse(&config.list_selector)
            .map_err(|e| CrawlError::Parse(format!("invalid list selector: {e}")))?;
        let anchor =
            Selector::parse("a").map_err(|e| CrawlError::Parse(format!("invalid anchor selector: {e}")))?;
        let titles = SelectorSet::parse(&config.title_selectors)?;
        let bodies = SelectorSet::parse(&config.body_selectors)?;
        debug!(
            titles = titles.len(),
            bodies = bodies.len(),
            "Selector sets parsed"
        );
        Ok(Self {
            client,
            index: config.index.clone(),
            list,
            anchor,
            titles,
            bodies,
            body_skip: config.body_skip_indices.clone(),
            retry: FixedRetry::new("fetch", config.retry_attempts, config.retry_backoff()),
            lang,
        })
    }

    /// Fetch one article and build its raw/normalized pair.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_article(&self, link: &str) -> Result<ArticlePair> {
        let html = fetch_html(&self.client, link, &self.retry).await?;
        self.article_from_html(link, &html)
    }

    fn article_from_html(&self, link: &str, html: &str) -> Result<ArticlePair> {
        let doc = Html::parse_document(html);
        let title = extract_first_match(&doc, &self.titles, ExtractMode::Title);
        let body = extract_first_match(
            &doc,
            &self.bodies,
            ExtractMode::Body {
                skip: &self.body_skip,
            },
        );
        let normalized = normalize(self.lang.as_ref(), &body)?;
        debug!(
            title = %title,
            body = %truncate_for_log(&body, 120),
            "Extracted article"
        );
        Ok(ArticlePair::new(link, title, body, normalized))
    }

    /// Fetch one search-result page and return its article links.
    ///
    /// Links come back in document order; empty and duplicate hrefs are kept.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_index_page(&self, page: u32) -> Result<Vec<String>> {
        let url = self.index.page_url(page)?;
        let html = fetch_html(&self.client, url.as_str(), &self.retry).await?;
        let links = self.links_from_html(&html);
        info!(count = links.len(), "Indexed article links");
        Ok(links)
    }

    fn links_from_html(&self, html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        doc.select(&self.list)
            .flat_map(|container| container.select(&self.anchor))
            .map(|a| a.value().attr("href").unwrap_or_default().to_string())
            .collect()
    }

    /// Fetch an index page and every article it links to.
    ///
    /// One task per link, all running at once. A failed article is logged and
    /// left out; only a failure of the index page itself is an error. Pairs
    /// are collected in the order their tasks finish.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_page_articles(self: &Arc<Self>, page: u32) -> Result<PageResult> {
        let links = self.fetch_index_page(page).await?;
        let collected = Arc::new(Mutex::new(Vec::with_capacity(links.len())));

        let workers: Vec<_> = links
            .into_iter()
            .map(|link| {
                let scraper = Arc::clone(self);
                let collected = Arc::clone(&collected);
                tokio::spawn(
                    async move {
                        match scraper.fetch_article(&link).await {
                            Ok(pair) => {
                                collected.lock().await.push(pair);
                                true
                            }
                            Err(e) => {
                                error!(error = %e, %link, "Error fetching news; dropping article");
                                false
                            }
                        }
                    }
                    .in_current_span(),
                )
            })
            .collect();

        let mut dropped = 0;
        for joined in futures::future::join_all(workers).await {
            match joined {
                Ok(true) => {}
                Ok(false) => dropped += 1,
                Err(e) => {
                    error!(error = %e, "Article worker panicked");
                    dropped += 1;
                }
            }
        }

        let pairs = std::mem::take(&mut *collected.lock().await);
        info!(articles = pairs.len(), dropped, "Page articles fetched");
        Ok(PageResult {
            page,
            pairs,
            dropped,
        })
    }
}
