//! Error taxonomy for the crawl pipeline.
//!
//! Every fetch in the pipeline resolves to one of these variants. The retry
//! combinator in [`crate::retry`] decides, per variant, whether another
//! attempt is worth making:
//!
//! | Variant | Retried? |
//! |---------|----------|
//! | [`CrawlError::NotFound`] | yes, up to the budget |
//! | [`CrawlError::Transport`] | no |
//! | [`CrawlError::Status`] | no |
//! | [`CrawlError::Parse`] | no |
//!
//! Once the budget runs out the loop reports [`CrawlError::RetryExhausted`].

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, CrawlError>;

#[derive(Error, Debug)]
pub enum CrawlError {
    /// Connection, DNS, TLS or timeout failure while talking to the server.
    #[error("transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered 404.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// Any other non-200 answer.
    #[error("status code error: {status} fetching {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The document or a selector could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The attempt budget was used up without a success.
    #[error("maximum retries exceeded after {attempts} attempts")]
    RetryExhausted { attempts: usize },

    /// The linguistic capability failed while normalizing an article body.
    #[error("normalization failed: {0}")]
    Normalize(String),

    /// Reading or writing a CSV table failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An earlier write to the output tables failed; the sink takes no more rows.
    #[error("output tables unusable after an earlier write failure: {0}")]
    SinkFailed(String),

    /// The admission gate was closed while a worker waited for a permit.
    #[error("admission gate closed")]
    GateClosed,

    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl CrawlError {
    /// Only a 404 is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CrawlError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_not_found_is_retryable() {
        let not_found = CrawlError::NotFound {
            url: "http://x/".into(),
        };
        assert!(not_found.is_retryable());

        let status = CrawlError::Status {
            url: "http://x/".into(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert!(!status.is_retryable());
        assert!(!CrawlError::Parse("bad".into()).is_retryable());
        assert!(!CrawlError::RetryExhausted { attempts: 3 }.is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let e = CrawlError::RetryExhausted { attempts: 3 };
        assert_eq!(e.to_string(), "maximum retries exceeded after 3 attempts");

        let e = CrawlError::Status {
            url: "http://x/a".into(),
            status: reqwest::StatusCode::FORBIDDEN,
        };
        assert_eq!(
            e.to_string(),
            "status code error: 403 Forbidden fetching http://x/a"
        );
    }
}
