//! Okapi BM25 ranking over a normalized table.
//!
//! Each row becomes one document made of its body followed by its title,
//! split on whitespace. Query terms are lowercased and split the same way.
//!
//! Scoring uses `k1 = 1.5`, `b = 0.75`. Terms that occur in more than half of
//! the corpus get a negative raw idf; those are replaced by
//! `epsilon * average_idf` with `epsilon = 0.25`.

use crate::error::Result;
use crate::models::Record;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument};

const K1: f64 = 1.5;
const B: f64 = 0.75;
const EPSILON: f64 = 0.25;

/// BM25 index over a tokenized corpus.
#[derive(Debug)]
pub struct Bm25 {
    term_freqs: Vec<HashMap<String, usize>>,
    doc_len: Vec<usize>,
    avgdl: f64,
    idf: HashMap<String, f64>,
}

impl Bm25 {
    pub fn new(corpus: &[Vec<String>]) -> Self {
        let mut term_freqs = Vec::with_capacity(corpus.len());
        let mut doc_len = Vec::with_capacity(corpus.len());
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in corpus {
            let mut tf: HashMap<String, usize> = HashMap::new();
            for term in doc {
                *tf.entry(term.clone()).or_default() += 1;
            }
            for term in tf.keys() {
                *doc_freq.entry(term.clone()).or_default() += 1;
            }
            doc_len.push(doc.len());
            term_freqs.push(tf);
        }

        let n = corpus.len() as f64;
        let total: usize = doc_len.iter().sum();
        let avgdl = if corpus.is_empty() { 0.0 } else { total as f64 / n };

        let mut idf: HashMap<String, f64> = doc_freq
            .into_iter()
            .map(|(term, df)| {
                let df = df as f64;
                (term, ((n - df + 0.5) / (df + 0.5)).ln())
            })
            .collect();
        if !idf.is_empty() {
            let average = idf.values().sum::<f64>() / idf.len() as f64;
            let floor = EPSILON * average;
            for value in idf.values_mut() {
                if *value < 0.0 {
                    *value = floor;
                }
            }
        }

        Self {
            term_freqs,
            doc_len,
            avgdl,
            idf,
        }
    }

    pub fn len(&self) -> usize {
        self.doc_len.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_len.is_empty()
    }

    /// Score of every document against the query, in corpus order.
    pub fn scores(&self, query: &[String]) -> Vec<f64> {
        self.term_freqs
            .iter()
            .zip(&self.doc_len)
            .map(|(tf, &len)| {
                let norm = K1 * (1.0 - B + B * len as f64 / self.avgdl);
                query
                    .iter()
                    .map(|q| {
                        let f = tf.get(q).copied().unwrap_or(0) as f64;
                        let idf = self.idf.get(q).copied().unwrap_or(0.0);
                        idf * (f * (K1 + 1.0)) / (f + norm)
                    })
                    .sum()
            })
            .collect()
    }

    /// Indices and scores of the `n` best documents, best first.
    ///
    /// Equal scores keep corpus order.
    pub fn top_n(&self, query: &[String], n: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self.scores(query).into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub rank: usize,
    pub title: String,
    pub link: String,
    pub score: f64,
}

/// Read a normalized table, skipping rows with an empty body.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_corpus(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize::<Record>() {
        let record = row?;
        if !record.body.trim().is_empty() {
            records.push(record);
        }
    }
    info!(count = records.len(), "Loaded corpus");
    Ok(records)
}

pub fn tokenize_query(query: &str) -> Vec<String> {
    query.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Rank `records` against `query` and keep positive-scoring hits.
///
/// # Arguments
///
/// * `records` - Rows of a normalized table
/// * `query` - Free-text query; lowercased and split on whitespace
/// * `top` - Maximum number of hits
///
/// # Returns
///
/// Hits ranked from 1, best first. Empty for an empty corpus.
pub fn search(records: &[Record], query: &str, top: usize) -> Vec<Hit> {
    let corpus: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            format!("{} {}", r.body, r.title)
                .split_whitespace()
                .map(str::to_string)
                .collect()
        })
        .collect();
    let index = Bm25::new(&corpus);
    if index.is_empty() {
        return Vec::new();
    }
    let terms = tokenize_query(query);
    debug!(docs = index.len(), terms = terms.len(), "Ranking corpus");

    index
        .top_n(&terms, top)
        .into_iter()
        .enumerate()
        .filter(|(_, (_, score))| *score > 0.0)
        .map(|(i, (doc, score))| Hit {
            rank: i + 1,
            title: records[doc].title.clone(),
            link: records[doc].link.clone(),
            score,
        })
        .collect()
}
