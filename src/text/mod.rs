//! Text normalization for the stemmed dataset.
//!
//! [`normalize`] turns the raw body of an article into the form written to
//! the normalized table: tokens are lowercased, stopwords are dropped, each
//! remaining token is stemmed, and the joined result is stemmed once more as
//! a whole. The last step is part of the expected output shape of the
//! normalized table and must not be removed.
//!
//! The dictionary behind tokenizing, stopword lookup and stemming is the
//! [`Linguistics`] trait. [`indonesian::Indonesian`] is the built-in
//! implementation.

pub mod indonesian;

use crate::error::Result;

/// Language capability used by [`normalize`].
pub trait Linguistics: Send + Sync {
    /// Split text into lowercase word tokens.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Whether a token carries no content and should be dropped.
    fn is_stopword(&self, token: &str) -> Result<bool>;

    /// Reduce a token, or any longer text, to its root form.
    fn stem(&self, text: &str) -> Result<String>;
}

/// Normalize raw article text.
///
/// Each stem is followed by one space, so a non-empty result always ends in
/// a space. The final whole-string stem leaves the accumulator as it is for
/// any analyzer that only reduces single words.
///
/// # Arguments
///
/// * `lang` - Tokenizer, stopword list and stemmer to use
/// * `raw` - Extracted article text
///
/// # Returns
///
/// The normalized text, or `""` when no content token survives.
///
/// # Errors
///
/// Propagates the first failure of `lang.is_stopword` or `lang.stem`.
///
/// # Examples
///
/// ```ignore
/// let lang = Indonesian::new();
/// assert_eq!(normalize(&lang, "")?, "");
/// ```
pub fn normalize(lang: &dyn Linguistics, raw: &str) -> Result<String> {
    let mut acc = String::with_capacity(raw.len());
    for token in lang.tokenize(raw) {
        if lang.is_stopword(&token)? {
            continue;
        }
        acc.push_str(&lang.stem(&token)?);
        acc.push(' ');
    }
    lang.stem(&acc)
}

#[cfg(test)]
mod tests {
    use super::indonesian::Indonesian;
    use super::*;
    use crate::error::CrawlError;

    #[test]
    fn test_empty_input() {
        let lang = Indonesian::new();
        assert_eq!(normalize(&lang, "").unwrap(), "");
        assert_eq!(normalize(&lang, "   \n ").unwrap(), "");
    }

    #[test]
    fn test_stopwords_dropped_and_tokens_stemmed() {
        let lang = Indonesian::new();
        let out = normalize(&lang, "Rumah itu dan jalanan").unwrap();
        assert_eq!(out, "rumah jalan ");
    }

    #[test]
    fn test_whole_string_stem_keeps_leading_prefixed_word() {
        let lang = Indonesian::new();
        let out = normalize(&lang, "Dinas pemadam kebakaran").unwrap();
        assert_eq!(out, "dinas padam bakar ");
        let out = normalize(&lang, "Merendam rumah warga").unwrap();
        assert!(out.starts_with("rendam "), "{out:?}");
    }

    #[test]
    fn test_only_stopwords() {
        let lang = Indonesian::new();
        assert_eq!(normalize(&lang, "yang dan di ke dari").unwrap(), "");
    }

    #[test]
    fn test_deterministic() {
        let lang = Indonesian::new();
        let text = "Banjir merendam ratusan rumah warga di Jakarta Timur, Senin (2/1/2023).";
        let a = normalize(&lang, text).unwrap();
        let b = normalize(&lang, text).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    /// Records every call so the order of capability use can be checked.
    struct Recording {
        calls: std::sync::Mutex<Vec<String>>,
    }

    impl Linguistics for Recording {
        fn tokenize(&self, text: &str) -> Vec<String> {
            text.split_whitespace().map(str::to_string).collect()
        }
        fn is_stopword(&self, token: &str) -> Result<bool> {
            Ok(token == "the")
        }
        fn stem(&self, text: &str) -> Result<String> {
            self.calls.lock().unwrap().push(text.to_string());
            Ok(text.to_uppercase())
        }
    }

    #[test]
    fn test_stems_tokens_then_whole_string() {
        let lang = Recording {
            calls: std::sync::Mutex::new(Vec::new()),
        };
        let out = normalize(&lang, "the cat sat").unwrap();
        assert_eq!(out, "CAT SAT ");
        assert_eq!(
            *lang.calls.lock().unwrap(),
            vec!["cat".to_string(), "sat".to_string(), "CAT SAT ".to_string()]
        );
    }

    struct Failing;

    impl Linguistics for Failing {
        fn tokenize(&self, text: &str) -> Vec<String> {
            vec![text.to_string()]
        }
        fn is_stopword(&self, _: &str) -> Result<bool> {
            Err(CrawlError::Normalize("dictionary unavailable".into()))
        }
        fn stem(&self, text: &str) -> Result<String> {
            Ok(text.to_string())
        }
    }

    #[test]
    fn test_capability_failure_propagates() {
        let err = normalize(&Failing, "anything").unwrap_err();
        assert!(matches!(err, CrawlError::Normalize(_)));
    }
}
