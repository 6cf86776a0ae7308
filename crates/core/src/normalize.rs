//! Text cleanup for slide content.
//!
//! Slide fragments are generated by templating tools that sometimes emit
//! typographic dashes or mis-decoded bytes. Text is folded to plain dashes,
//! NFC-normalized, and whitespace is collapsed the way a browser would.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse HTML whitespace runs (including newlines) into one space.
/// Non-breaking spaces are not HTML whitespace and survive.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\n\r\x0C]+").unwrap());

/// Characters folded to an ASCII hyphen.
const DASH_CHARS: &[char] = &[
    '\u{2013}', // en dash
    '\u{2014}', // em dash
    '\u{0096}', // cp1252 en dash decoded as latin-1
    '\u{0097}', // cp1252 em dash decoded as latin-1
    '\u{FFFD}', // replacement character
];

/// Cleaner for text pulled out of slide fragments.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    /// Whether to fold typographic dashes to `-`.
    fold_dashes: bool,
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self { fold_dashes: true }
    }
}

impl TextCleaner {
    /// Create a cleaner with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to fold typographic dashes.
    pub fn with_fold_dashes(mut self, fold: bool) -> Self {
        self.fold_dashes = fold;
        self
    }

    /// Fold dashes and NFC-normalize without touching whitespace.
    pub fn clean_chars(&self, text: &str) -> String {
        let folded: String = if self.fold_dashes {
            text.chars()
                .map(|c| if DASH_CHARS.contains(&c) { '-' } else { c })
                .collect()
        } else {
            text.to_string()
        };

        folded.nfc().collect()
    }

    /// Clean a run of HTML text.
    ///
    /// All whitespace, including source newlines, collapses to one space.
    /// Leading and trailing space is kept so adjacent runs stay separated;
    /// callers trim at paragraph boundaries.
    pub fn clean_inline(&self, text: &str) -> String {
        let cleaned = self.clean_chars(text);
        WHITESPACE_COLLAPSE_REGEX.replace_all(&cleaned, " ").into_owned()
    }
}
