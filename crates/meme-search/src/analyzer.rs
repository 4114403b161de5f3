//! Text analysis for the meme index.
//!
//! The analyzer turns names, tags and queries into index terms:
//! word tokens (dotted runs such as `u.s.a` stay whole), lowercased,
//! English stop words dropped, then Snowball-stemmed.

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use meme_core::defaults::MIN_TOKEN_LEN;

/// Common English words that carry no search signal.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "for", "from", "have", "if", "in",
    "is", "it", "may", "not", "of", "on", "or", "tbd", "that", "the", "this", "to", "us", "we",
    "when", "will", "with", "yet", "you", "your",
];

/// Tokenizing, stop-word filtering, stemming analyzer.
pub struct Analyzer {
    token_re: Regex,
    stemmer: Stemmer,
    min_len: usize,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            // Word runs, optionally joined by single dots
            token_re: Regex::new(r"\w+(?:\.?\w+)*").expect("static token regex"),
            stemmer: Stemmer::create(Algorithm::English),
            min_len: MIN_TOKEN_LEN,
        }
    }

    /// Drop tokens with fewer than `min_len` characters.
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    /// Analyze free text (a meme name or a query) into terms, in order.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        self.token_re
            .find_iter(text)
            .filter_map(|m| self.term(m.as_str()))
            .collect()
    }

    /// Analyze a comma-delimited keyword list (joined tags).
    ///
    /// Each keyword is analyzed on its own, so multi-word tags contribute
    /// every word.
    pub fn analyze_keywords(&self, joined: &str) -> Vec<String> {
        joined
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .flat_map(|k| self.analyze(k))
            .collect()
    }

    fn term(&self, token: &str) -> Option<String> {
        let lower = token.to_lowercase();
        if lower.chars().count() < self.min_len || STOP_WORDS.contains(&lower.as_str()) {
            return None;
        }
        Some(self.stemmer.stem(&lower).into_owned())
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_stems() {
        let a = Analyzer::new();
        assert_eq!(a.analyze("Dancing Cats"), vec!["danc", "cat"]);
        assert_eq!(a.analyze("dance"), a.analyze("dancing"));
    }

    #[test]
    fn test_drops_stop_words() {
        let a = Analyzer::new();
        assert_eq!(a.analyze("the cat is a x"), vec!["cat", "x"]);
        assert!(a.analyze("to be or not").is_empty());
    }

    #[test]
    fn test_min_len() {
        let a = Analyzer::new().with_min_len(2);
        assert_eq!(a.analyze("x marks spot"), vec!["mark", "spot"]);
    }

    #[test]
    fn test_dotted_tokens_kept_together() {
        let a = Analyzer::new();
        assert_eq!(a.analyze("u.s.a flag"), vec!["u.s.a", "flag"]);
    }

    #[test]
    fn test_punctuation_splits() {
        let a = Analyzer::new();
        assert_eq!(a.analyze("doge-meme!!"), vec!["doge", "meme"]);
    }

    #[test]
    fn test_keywords_split_on_commas() {
        let a = Analyzer::new();
        assert_eq!(
            a.analyze_keywords("Dog, funny ,, big dogs"),
            vec!["dog", "funni", "big", "dog"]
        );
    }

    #[test]
    fn test_empty_input() {
        let a = Analyzer::new();
        assert!(a.analyze("").is_empty());
        assert!(a.analyze_keywords("").is_empty());
        assert!(a.analyze("?!").is_empty());
    }
}
