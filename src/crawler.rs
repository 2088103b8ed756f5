//! Crawl orchestration.
//!
//! [`Crawler::run`] walks index pages `1..=pages`. Before each page worker is
//! spawned it must be admitted by the [`AdmissionGate`], which caps how many
//! pages are in flight; the permit travels with the worker and is returned
//! when the worker ends, whatever the outcome. Inside a page every article is
//! fetched concurrently (see [`DetikScraper::fetch_page_articles`]).
//!
//! A page is tried up to the retry budget. When every attempt fails the page
//! is abandoned and contributes no rows; the run carries on. A failed sink
//! is different: no further pages are admitted, and the error surfaces from
//! [`Crawler::run`] once the running workers have joined. Otherwise the sink
//! is flushed and a [`CrawlSummary`] returned.

use crate::error::{CrawlError, Result};
use crate::models::{CrawlSummary, PageOutcome};
use crate::outputs::tables::DualSink;
use crate::retry::{FixedRetry, retry_any};
use crate::scrapers::detik::DetikScraper;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span};

/// Bounded-permit admission control for page workers.
///
/// Also tracks how many admissions are live and the highest number seen at
/// once.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    permits: Arc<Semaphore>,
    width: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// A live admission; dropping it frees the slot.
#[derive(Debug)]
pub struct Admission {
    in_flight: Arc<AtomicUsize>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for Admission {
    fn drop(&mut self) {
        // Runs before `_permit` is released, so the count never overshoots.
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AdmissionGate {
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            permits: Arc::new(Semaphore::new(width)),
            width,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot.
    pub async fn admit(&self) -> Result<Admission> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| CrawlError::GateClosed)?;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Ok(Admission {
            in_flight: Arc::clone(&self.in_flight),
            _permit: permit,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous admissions observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Drives a full crawl into a [`DualSink`].
pub struct Crawler<W: Write + Send + 'static> {
    scraper: Arc<DetikScraper>,
    sink: Arc<DualSink<W>>,
    gate: AdmissionGate,
    pages: u32,
    page_retry: FixedRetry,
}

impl<W: Write + Send + 'static> Crawler<W> {
    pub fn new(
        scraper: Arc<DetikScraper>,
        sink: Arc<DualSink<W>>,
        gate: AdmissionGate,
        pages: u32,
        page_retry: FixedRetry,
    ) -> Self {
        Self {
            scraper,
            sink,
            gate,
            pages,
            page_retry,
        }
    }

    /// Crawl every page, wait for all workers, then flush the sink.
    pub async fn run(self) -> Result<CrawlSummary> {
        let t0 = Instant::now();
        info!(
            pages = self.pages,
            concurrency = self.gate.width(),
            page_attempts = self.page_retry.max_attempts(),
            "Starting crawl"
        );

        let mut workers = JoinSet::new();
        for page in 1..=self.pages {
            let admission = self.gate.admit().await?;
            if self.sink.is_failed().await {
                error!(page, "Output tables failed; no further pages admitted");
                break;
            }
            debug!(page, in_flight = self.gate.in_flight(), "Page admitted");
            let scraper = Arc::clone(&self.scraper);
            let sink = Arc::clone(&self.sink);
            let retry = self.page_retry;
            workers.spawn(
                async move {
                    let _admission = admission;
                    crawl_page(&scraper, &sink, &retry, page).await
                }
                .instrument(info_span!("page", page)),
            );
        }

        let mut summary = CrawlSummary::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => summary.record_page(&outcome),
                Err(e) => {
                    error!(error = %e, "Page worker panicked");
                    summary.record_page(&PageOutcome::Abandoned);
                }
            }
        }

        let rows = self.sink.finish().await?;
        let elapsed = t0.elapsed();
        info!(
            ?elapsed,
            rows,
            pages_ok = summary.pages_ok,
            pages_failed = summary.pages_failed,
            articles_dropped = summary.articles_dropped,
            peak_in_flight = self.gate.peak(),
            "Crawl complete"
        );
        Ok(summary)
    }
}

async fn crawl_page<W: Write>(
    scraper: &Arc<DetikScraper>,
    sink: &DualSink<W>,
    retry: &FixedRetry,
    page: u32,
) -> PageOutcome {
    let result = retry
        .run(
            |attempt| {
                debug!(attempt, "Fetching page");
                scraper.fetch_page_articles(page)
            },
            retry_any,
        )
        .await;

    let page_result = match result {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Abandoning page");
            return PageOutcome::Abandoned;
        }
    };

    let mut written = 0;
    for pair in &page_result.pairs {
        if let Err(e) = sink.write_pair(pair).await {
            error!(error = %e, link = %pair.link(), "Failed to write pair; stopping page");
            break;
        }
        written += 1;
    }
    info!(written, dropped = page_result.dropped, "Page written");
    PageOutcome::Written {
        pairs: written,
        dropped: page_result.dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlConfig, IndexQuery};
    use crate::models::Record;
    use crate::outputs::tables::testing::SharedTable;
    use crate::text::indonesian::Indonesian;
    use std::time::Duration;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> CrawlConfig {
        CrawlConfig {
            retry_backoff_ms: 5,
            list_selector: "div.list-berita".to_string(),
            title_selectors: vec!["article h1".to_string()],
            body_selectors: vec!["article p".to_string()],
            index: IndexQuery {
                base_url: format!("{}/search/searchall", server.uri()),
                ..IndexQuery::default()
            },
            ..CrawlConfig::default()
        }
    }

    fn index_html(server: &MockServer, page: u32, count: usize) -> String {
        let anchors: String = (0..count)
            .map(|i| format!("<a href=\"{}/news/{page}-{i}\">x</a>", server.uri()))
            .collect();
        format!("<html><body><div class=\"list-berita\">{anchors}</div></body></html>")
    }

    async fn mount_articles(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path_regex(r"^/news/\d+-\d+$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<article><h1>Banjir</h1><p>Hujan deras merendam rumah warga.</p></article>",
            ))
            .mount(server)
            .await;
    }

    fn read(path: &std::path::Path) -> Vec<Record> {
        csv::Reader::from_path(path)
            .unwrap()
            .deserialize()
            .map(|r| r.unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_gate_tracks_peak() {
        let gate = AdmissionGate::new(2);
        let a = gate.admit().await.unwrap();
        let b = gate.admit().await.unwrap();
        assert_eq!(gate.in_flight(), 2);
        drop(a);
        assert_eq!(gate.in_flight(), 1);
        let c = gate.admit().await.unwrap();
        assert_eq!(gate.peak(), 2);
        drop(b);
        drop(c);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_gate_blocks_when_full() {
        let gate = AdmissionGate::new(1);
        let held = gate.admit().await.unwrap();
        let waiting = tokio::time::timeout(Duration::from_millis(50), gate.admit()).await;
        assert!(waiting.is_err());
        drop(held);
        assert!(gate.admit().await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_page_concurrency_never_exceeds_width() {
        let server = MockServer::start().await;
        for page in 1..=5u32 {
            Mock::given(method("GET"))
                .and(path("/search/searchall"))
                .and(query_param("page", page.to_string()))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(index_html(&server, page, 2))
                        .set_delay(Duration::from_millis(100)),
                )
                .mount(&server)
                .await;
        }
        mount_articles(&server).await;

        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("before.csv");
        let norm = dir.path().join("after.csv");
        let cfg = config(&server);
        let scraper = Arc::new(
            DetikScraper::new(reqwest::Client::new(), &cfg, Arc::new(Indonesian::new())).unwrap(),
        );
        let sink = Arc::new(DualSink::create(&raw, &norm).unwrap());
        let gate = AdmissionGate::new(2);
        let crawler = Crawler::new(
            scraper,
            sink,
            gate.clone(),
            5,
            FixedRetry::new("page", 3, Duration::from_millis(5)),
        );

        let summary = crawler.run().await.unwrap();

        assert_eq!(gate.peak(), 2);
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(summary.pages_ok, 5);
        assert_eq!(summary.pairs_written, 10);

        let raw_rows = read(&raw);
        let norm_rows = read(&norm);
        assert_eq!(raw_rows.len(), 10);
        assert_eq!(raw_rows.len(), norm_rows.len());
        for (r, n) in raw_rows.iter().zip(&norm_rows) {
            assert_eq!(r.link, n.link);
        }
    }

    #[tokio::test]
    async fn test_failed_page_is_abandoned_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/searchall"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index_html(&server, 1, 3)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/searchall"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;
        mount_articles(&server).await;

        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("before.csv");
        let norm = dir.path().join("after.csv");
        let cfg = config(&server);
        let scraper = Arc::new(
            DetikScraper::new(reqwest::Client::new(), &cfg, Arc::new(Indonesian::new())).unwrap(),
        );
        let sink = Arc::new(DualSink::create(&raw, &norm).unwrap());
        let crawler = Crawler::new(
            scraper,
            sink,
            AdmissionGate::new(15),
            2,
            FixedRetry::new("page", 3, Duration::from_millis(5)),
        );

        let summary = crawler.run().await.unwrap();

        assert_eq!(summary.pages_ok, 1);
        assert_eq!(summary.pages_failed, 1);
        assert_eq!(summary.pairs_written, 3);
        assert_eq!(read(&raw).len(), 3);
        assert_eq!(read(&norm).len(), 3);
    }

    #[tokio::test]
    async fn test_sink_failure_fails_run_and_stops_admission() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/searchall"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index_html(&server, 1, 2)))
            .expect(1)
            .mount(&server)
            .await;
        mount_articles(&server).await;

        let raw = SharedTable::default();
        let norm = SharedTable::default();
        let sink = Arc::new(DualSink::from_writers(raw.clone(), norm.clone()).unwrap());
        norm.set_broken(true);

        let cfg = config(&server);
        let scraper = Arc::new(
            DetikScraper::new(reqwest::Client::new(), &cfg, Arc::new(Indonesian::new())).unwrap(),
        );
        let crawler = Crawler::new(
            scraper,
            sink,
            AdmissionGate::new(1),
            3,
            FixedRetry::new("page", 3, Duration::from_millis(5)),
        );

        let err = crawler.run().await.unwrap_err();

        assert!(matches!(err, CrawlError::SinkFailed(_)));
        assert!(norm.links().is_empty());
        assert!(raw.links().len() <= 1);
    }

    #[tokio::test]
    async fn test_not_found_articles_contribute_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/searchall"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index_html(&server, 1, 1)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/news/1-0"))
            .respond_with(ResponseTemplate::new(404))
            .expect(3)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("before.csv");
        let norm = dir.path().join("after.csv");
        let cfg = config(&server);
        let scraper = Arc::new(
            DetikScraper::new(reqwest::Client::new(), &cfg, Arc::new(Indonesian::new())).unwrap(),
        );
        let sink = Arc::new(DualSink::create(&raw, &norm).unwrap());
        let crawler = Crawler::new(
            scraper,
            sink,
            AdmissionGate::new(1),
            1,
            FixedRetry::new("page", 3, Duration::from_millis(5)),
        );

        let summary = crawler.run().await.unwrap();

        assert_eq!(summary.pages_ok, 1);
        assert_eq!(summary.pairs_written, 0);
        assert_eq!(summary.articles_dropped, 1);
        assert!(read(&raw).is_empty());
        assert!(read(&norm).is_empty());
    }
}
