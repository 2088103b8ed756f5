//! Dictionary-free Indonesian analyzer.
//!
//! Tokenizing strips URLs, mentions, hashtags and every non-letter before
//! lowercasing and splitting on whitespace. Stemming is rule-based affix
//! stripping in the style of Tala's Porter variant for Bahasa Indonesia:
//!
//! 1. particles: `-kah`, `-lah`, `-pun`
//! 2. possessive pronouns: `-ku`, `-mu`, `-nya`
//! 3. first-order prefixes: `meng-`, `meny-`, `men-`, `mem-`, `me-`, `peng-`,
//!    `peny-`, `pen-`, `pem-`, `di-`, `ter-`, `ke-`
//! 4. derivational suffixes: `-kan`, `-an`, `-i`
//! 5. second-order prefixes: `ber-`, `be-`, `per-`, `pe-`
//!
//! A rule only fires while the word still has more than two vowels, so short
//! roots are left alone. Steps 4 and 5 swap order when no first-order prefix
//! was found. The combination of prefix and suffix allowed follows the
//! usual confix restrictions (no `ke-…-kan` style double strip that would eat
//! the root).

use super::Linguistics;
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").unwrap());
static HANDLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[@#]\S+").unwrap());
static NON_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\s]+").unwrap());

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "ada", "adalah", "adanya", "agar", "akan", "akankah", "aku", "amat", "anda",
        "antara", "apa", "apabila", "apakah", "atau", "ataupun", "bagai", "bagaimana",
        "bagi", "bahkan", "bahwa", "banyak", "baru", "begitu", "belum", "berapa",
        "besar", "beberapa", "biasa", "bila", "bisa", "boleh", "bukan", "bukanlah",
        "cukup", "dahulu", "dalam", "dan", "dapat", "dari", "daripada", "demikian",
        "dengan", "di", "dia", "diri", "dulu", "hal", "hampir", "hanya", "hingga",
        "ia", "ialah", "ini", "inilah", "itu", "itulah", "jadi", "jika", "jikalau",
        "juga", "justru", "kalau", "kami", "kamu", "kapan", "karena", "ke", "kemudian",
        "kenapa", "kepada", "ketika", "kini", "kita", "lagi", "lain", "lalu", "lebih",
        "maka", "mana", "masih", "mau", "melainkan", "meng", "mereka", "merupakan",
        "mungkin", "nanti", "nya", "oleh", "pada", "padahal", "para", "pasti", "perlu",
        "pernah", "pula", "pun", "saat", "saja", "salah", "sambil", "sampai", "sangat",
        "saya", "se", "sebab", "sebagai", "sebelum", "sedang", "sedangkan", "sehingga",
        "sejak", "selain", "selama", "semua", "sementara", "sendiri", "seperti",
        "serta", "sesudah", "setelah", "setiap", "siapa", "suatu", "sudah", "supaya",
        "tak", "tanpa", "tapi", "telah", "tentang", "tentu", "terhadap", "tersebut",
        "tetapi", "tidak", "untuk", "wah", "walau", "walaupun", "ya", "yaitu", "yakni",
        "yang",
    ]
    .into_iter()
    .collect()
});

const PARTICLES: &[&str] = &["kah", "lah", "pun"];
const POSSESSIVES: &[&str] = &["nya", "ku", "mu"];

/// Which prefix family was removed; constrains the suffixes that may follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    None,
    /// di-, me-, ter- and their nasal variants
    Di,
    /// pe- and per-
    Per,
    /// ke- and the pe- nasal variants
    Ke,
    /// be- and ber-
    Ber,
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn measure(word: &str) -> usize {
    word.chars().filter(|c| is_vowel(*c)).count()
}

fn starts_with_vowel(s: &str) -> bool {
    s.chars().next().is_some_and(is_vowel)
}

fn strip_any_suffix(word: &str, suffixes: &[&str]) -> Option<String> {
    suffixes
        .iter()
        .find_map(|s| word.strip_suffix(s))
        .map(str::to_string)
}

fn remove_first_order_prefix(word: &str) -> Option<(String, Prefix)> {
    if let Some(rest) = word.strip_prefix("meny").filter(|r| starts_with_vowel(r)) {
        return Some((format!("s{rest}"), Prefix::Di));
    }
    if let Some(rest) = word.strip_prefix("peny").filter(|r| starts_with_vowel(r)) {
        return Some((format!("s{rest}"), Prefix::Ke));
    }
    for (prefix, kind) in [("meng", Prefix::Di), ("peng", Prefix::Ke)] {
        if let Some(rest) = word.strip_prefix(prefix) {
            return Some((rest.to_string(), kind));
        }
    }
    for (prefix, kind) in [("mem", Prefix::Di), ("pem", Prefix::Ke)] {
        if let Some(rest) = word.strip_prefix(prefix) {
            let root = if starts_with_vowel(rest) {
                format!("p{rest}")
            } else {
                rest.to_string()
            };
            return Some((root, kind));
        }
    }
    for (prefix, kind) in [
        ("men", Prefix::Di),
        ("pen", Prefix::Ke),
        ("ter", Prefix::Di),
        ("di", Prefix::Di),
        ("me", Prefix::Di),
        ("ke", Prefix::Ke),
    ] {
        if let Some(rest) = word.strip_prefix(prefix) {
            return Some((rest.to_string(), kind));
        }
    }
    None
}

fn remove_second_order_prefix(word: &str) -> Option<(String, Prefix)> {
    if word == "belajar" || word == "pelajar" {
        return Some(("ajar".to_string(), Prefix::Ber));
    }
    for (prefix, kind) in [("ber", Prefix::Ber), ("per", Prefix::Per)] {
        if let Some(rest) = word.strip_prefix(prefix) {
            return Some((rest.to_string(), kind));
        }
    }
    // be- only before a consonant followed by "er" (bekerja -> kerja)
    if let Some(rest) = word.strip_prefix("be") {
        let mut chars = rest.chars();
        if chars.next().is_some_and(|c| !is_vowel(c)) && chars.as_str().starts_with("er") {
            return Some((rest.to_string(), Prefix::Ber));
        }
    }
    word.strip_prefix("pe")
        .map(|rest| (rest.to_string(), Prefix::Per))
}

fn remove_suffix(word: &str, prefix: Prefix) -> Option<String> {
    if !matches!(prefix, Prefix::Ke | Prefix::Per) {
        if let Some(rest) = word.strip_suffix("kan") {
            return Some(rest.to_string());
        }
    }
    if prefix != Prefix::Di {
        if let Some(rest) = word.strip_suffix("an") {
            return Some(rest.to_string());
        }
    }
    if matches!(prefix, Prefix::None | Prefix::Di | Prefix::Per) {
        if let Some(rest) = word.strip_suffix('i').filter(|r| !r.ends_with('s')) {
            return Some(rest.to_string());
        }
    }
    None
}

/// Stem one word by stripping its affixes.
///
/// Particles (`-lah`, `-kah`, ...) go first, then possessive pronouns
/// (`-ku`, `-mu`, `-nya`), then a first or second order prefix together with
/// the derivational suffix it allows. Every step stops once the word has two
/// vowels or fewer left.
///
/// # Arguments
///
/// * `text` - A single word; case is ignored
///
/// # Returns
///
/// The lowercased root.
pub fn stem_word(text: &str) -> String {
    let mut word = text.to_lowercase();

    for set in [PARTICLES, POSSESSIVES] {
        if measure(&word) <= 2 {
            return word;
        }
        if let Some(rest) = strip_any_suffix(&word, set) {
            word = rest;
        }
    }
    if measure(&word) <= 2 {
        return word;
    }

    match remove_first_order_prefix(&word) {
        Some((rest, prefix)) => {
            word = rest;
            if measure(&word) > 2 {
                if let Some(rest) = remove_suffix(&word, prefix) {
                    word = rest;
                }
            }
            if measure(&word) > 2 {
                if let Some((rest, _)) = remove_second_order_prefix(&word) {
                    word = rest;
                }
            }
        }
        None => {
            let mut prefix = Prefix::None;
            if let Some((rest, kind)) = remove_second_order_prefix(&word) {
                word = rest;
                prefix = kind;
            }
            if measure(&word) > 2 {
                if let Some(rest) = remove_suffix(&word, prefix) {
                    word = rest;
                }
            }
        }
    }
    word
}

/// Built-in Indonesian [`Linguistics`] implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct Indonesian;

impl Indonesian {
    pub fn new() -> Self {
        Self
    }
}

impl Linguistics for Indonesian {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let text = URL.replace_all(text, " ");
        let text = HANDLE.replace_all(&text, " ");
        let text = NON_LETTER.replace_all(&text, " ");
        text.to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    fn is_stopword(&self, token: &str) -> Result<bool> {
        Ok(STOPWORDS.contains(token))
    }

    /// Stem a single word. Text containing whitespace is not a root of any
    /// word and comes back lowercased but otherwise unchanged.
    fn stem(&self, text: &str) -> Result<String> {
        if text.contains(char::is_whitespace) {
            return Ok(text.to_lowercase());
        }
        Ok(stem_word(text))
    }
}
