//! Index and article scrapers.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing**: read one search-result page and collect the article links
//! 2. **Fetching**: download every linked article and extract title and body
//!
//! Both phases go through [`fetch_html`], which applies the retrieval policy
//! shared by every request:
//!
//! | Response | Action |
//! |----------|--------|
//! | 200 | return the body |
//! | 404 | wait the backoff, try again (logged by the retry loop) |
//! | other status | fail with [`CrawlError::Status`] |
//! | transport error | fail with [`CrawlError::Transport`] |
//!
//! The submodules are:
//! - [`extract`]: selector fallthrough for titles and bodies
//! - [`detik`]: the index page and article fetchers

pub mod detik;
pub mod extract;

use crate::config::HttpConfig;
use crate::error::{CrawlError, Result};
use crate::retry::{FixedRetry, retry_not_found};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};

/// Build the shared HTTP client.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(agent) = &config.user_agent {
        builder = builder.user_agent(agent.clone());
    }
    builder
        .build()
        .map_err(|e| CrawlError::Config(format!("cannot build HTTP client: {e}")))
}

/// GET `url` under the retry policy and return the response body.
#[instrument(level = "debug", skip(client, retry))]
pub async fn fetch_html(client: &Client, url: &str, retry: &FixedRetry) -> Result<String> {
    retry
        .run(|attempt| get_once(client, url, attempt), retry_not_found)
        .await
}

async fn get_once(client: &Client, url: &str, attempt: usize) -> Result<String> {
    let res = client
        .get(url)
        .send()
        .await
        .map_err(|source| CrawlError::Transport {
            url: url.to_string(),
            source,
        })?;

    match res.status() {
        StatusCode::OK => {
            let body = res.text().await.map_err(|source| CrawlError::Transport {
                url: url.to_string(),
                source,
            })?;
            debug!(attempt, bytes = body.len(), "Fetched document");
            Ok(body)
        }
        StatusCode::NOT_FOUND => Err(CrawlError::NotFound {
            url: url.to_string(),
        }),
        status => Err(CrawlError::Status {
            url: url.to_string(),
            status,
        }),
    }
}
