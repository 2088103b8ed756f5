//! Utility functions for string cleanup and file system preparation.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace collapsing for extracted node text
//! - String truncation for logging
//! - Output directory preparation before the sink opens its files

use itertools::Itertools;
use std::io;
use std::path::Path;
use tracing::{debug, instrument};

/// Collapse every run of whitespace to a single space and trim the ends.
///
/// Node text pulled out of HTML keeps the source indentation and line
/// breaks; this flattens it to one line.
///
/// # Arguments
///
/// * `s` - The text to clean up
///
/// # Returns
///
/// The words of `s` joined by single spaces, or `""` if it has none.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(collapse_whitespace("  Hello \n\t world "), "Hello world");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary before `max` bytes,
/// with an ellipsis and byte count indicator appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of bytes to keep
///
/// # Returns
///
/// The original string if it fits in `max` bytes, otherwise a truncated
/// version with `"…(+N bytes)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure the parent directory of an output file exists.
///
/// A bare file name (no parent component) needs nothing.
///
/// # Arguments
///
/// * `path` - Path of the file about to be created
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir)?;
            debug!(dir = %dir.display(), "Output directory ready");
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("Hello   world"), "Hello world");
        assert_eq!(collapse_whitespace("  a\n\tb  c "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        let s = "é".repeat(10);
        let result = truncate_for_log(&s, 3);
        assert!(result.starts_with('é'));
        assert!(result.contains("…(+18 bytes)"));
    }

    #[test]
    fn test_ensure_parent_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a/b/out.csv");
        ensure_parent_dir(&file).unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }

    #[test]
    fn test_ensure_parent_dir_bare_name() {
        ensure_parent_dir(Path::new("out.csv")).unwrap();
    }
}
