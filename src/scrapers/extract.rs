//! Selector-driven text extraction.
//!
//! Article layouts change over time, so both the title and the body are
//! looked up through an ordered [`SelectorSet`]: the first selector that
//! yields non-empty text wins and the rest are never consulted.

use crate::error::{CrawlError, Result};
use crate::utils::collapse_whitespace;
use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};

/// Ordered candidate selectors, parsed once.
#[derive(Debug, Clone)]
pub struct SelectorSet {
    selectors: Vec<Selector>,
}

impl SelectorSet {
    /// Parse every selector, failing on the first invalid one.
    pub fn parse<S: AsRef<str>>(sources: &[S]) -> Result<Self> {
        let selectors = sources
            .iter()
            .map(|s| {
                Selector::parse(s.as_ref())
                    .map_err(|e| CrawlError::Parse(format!("invalid selector {:?}: {e}", s.as_ref())))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selector> {
        self.selectors.iter()
    }
}

/// How matches of one selector are turned into text.
#[derive(Debug, Clone, Copy)]
pub enum ExtractMode<'a> {
    /// Text of the first matching node only.
    Title,
    /// Every matching node joined by newlines, minus the positions in `skip`.
    Body { skip: &'a [usize] },
}

fn node_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// Return the text of the first selector that produces any.
///
/// An empty string means no selector matched; that is not an error.
pub fn extract_first_match(doc: &Html, selectors: &SelectorSet, mode: ExtractMode<'_>) -> String {
    for selector in selectors.iter() {
        let text = match mode {
            ExtractMode::Title => doc.select(selector).next().map(node_text).unwrap_or_default(),
            ExtractMode::Body { skip } => doc
                .select(selector)
                .enumerate()
                .filter(|(i, _)| !skip.contains(i))
                .map(|(_, el)| node_text(el))
                .join("\n"),
        };
        if !text.trim().is_empty() {
            return text;
        }
    }
    String::new()
}
