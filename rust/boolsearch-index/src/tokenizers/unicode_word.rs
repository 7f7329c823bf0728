//! Tokenizer over Unicode alphanumeric runs.

use std::str::CharIndices;

use super::{DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, Tokenizer, truncate_str};
use crate::tokenizers::TokenizerKind;

/// Extracts the longest continuous sequences of Unicode alphanumeric characters.
///
/// Unlike [`AsciiWordTokenizer`](super::AsciiWordTokenizer), apostrophes and
/// hyphens always split words here (`sea-level` yields `sea` and `level`).
pub struct UnicodeWordTokenizer {
    max_term_length: usize,
    min_term_length: usize,
}

impl UnicodeWordTokenizer {
    pub fn with_lengths(max_term_length: usize, min_term_length: usize) -> Self {
        Self {
            max_term_length,
            min_term_length,
        }
    }

    pub fn new() -> Self {
        Self::with_lengths(DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH)
    }
}

impl Default for UnicodeWordTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator that yields word tokens from a string input.
pub struct UnicodeWordIter<'a> {
    input: &'a str,
    char_indices: CharIndices<'a>,
    max_term_length: usize,
    min_term_length: usize,
}

impl<'a> UnicodeWordIter<'a> {
    fn new(input: &'a str, max_term_length: usize, min_term_length: usize) -> Self {
        Self {
            input,
            char_indices: input.char_indices(),
            max_term_length,
            min_term_length,
        }
    }

    /// Skips separators, then consumes one alphanumeric run.
    fn next_word(&mut self) -> Option<&'a str> {
        let (start, _) = self
            .char_indices
            .by_ref()
            .find(|(_, ch)| ch.is_alphanumeric())?;
        let end = self
            .char_indices
            .by_ref()
            .find(|(_, ch)| !ch.is_alphanumeric())
            .map_or(self.input.len(), |(pos, _)| pos);
        Some(&self.input[start..end])
    }
}

impl<'a> Iterator for UnicodeWordIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let word = self.next_word()?;
            if word.len() >= self.min_term_length {
                return Some(truncate_str(word, self.max_term_length));
            }
        }
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    type TokenIter<'a> = UnicodeWordIter<'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        UnicodeWordIter::new(input, self.max_term_length, self.min_term_length)
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::UnicodeWord
    }

    fn max_term_length(&self) -> usize {
        self.max_term_length
    }

    fn min_term_length(&self) -> usize {
        self.min_term_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_word_tokenizer() {
        let tokenizer = UnicodeWordTokenizer::new();

        let terms: Vec<&str> = tokenizer.tokenize("Coral reefs, 20-30m below.").collect();
        assert_eq!(terms, vec!["Coral", "reefs", "20", "30m", "below"]);

        assert_eq!(tokenizer.tokenize("").count(), 0);
        assert_eq!(tokenizer.tokenize("!@#$%^&*()").count(), 0);

        let terms: Vec<&str> = tokenizer.tokenize("café naïve résumé").collect();
        assert_eq!(terms, vec!["café", "naïve", "résumé"]);

        let terms: Vec<&str> = tokenizer.tokenize("don't sea-level").collect();
        assert_eq!(terms, vec!["don", "t", "sea", "level"]);

        assert_eq!(tokenizer.name(), "unicode-word");
    }

    #[test]
    fn test_length_limits() {
        let tokenizer = UnicodeWordTokenizer::with_lengths(3, 1);
        let terms: Vec<&str> = tokenizer.tokenize("cat elephant café").collect();
        assert_eq!(terms, vec!["cat", "ele", "caf"]);

        let tokenizer = UnicodeWordTokenizer::with_lengths(128, 3);
        let terms: Vec<&str> = tokenizer.tokenize("a bb cat dog 我 elephant").collect();
        assert_eq!(terms, vec!["cat", "dog", "我", "elephant"]);
    }

    #[test]
    fn test_mixed_scripts() {
        let tokenizer = UnicodeWordTokenizer::new();
        let terms: Vec<&str> = tokenizer
            .tokenize("Ozean 海洋，污染！ ים 1998年 🌊 Zürich")
            .collect();
        assert_eq!(terms, vec!["Ozean", "海洋", "污染", "ים", "1998年", "Zürich"]);
    }
}
