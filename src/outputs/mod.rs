//! Output generation.
//!
//! # Submodules
//!
//! - [`tables`]: the paired raw/normalized CSV tables written by a crawl
//!
//! # Output Structure
//!
//! ```text
//! before.csv   # Title,Body,Link  as extracted
//! after.csv    # Title,Body,Link  with Body tokenized, filtered and stemmed
//! ```
//!
//! Row `i` of both files always describes the same article.

pub mod tables;
