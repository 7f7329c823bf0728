//! Text analysis shared by index construction and query parsing.

use boolsearch_common::Result;

use crate::{
    normalizers::{Normalizer, NormalizerKind, create_normalizer},
    tokenizers::{Tokenizer, TokenizerType, create_tokenizer},
};

/// Tokenizer, minimum term length and normalizer bundled together.
///
/// Building the analyzer from the same settings on both sides keeps the
/// query vocabulary identical to the indexed one.
pub struct TermAnalyzer {
    tokenizer: TokenizerType,
    normalizer: Box<dyn Normalizer>,
}

impl TermAnalyzer {
    pub fn new(
        tokenizer: &str,
        min_term_length: usize,
        normalizer: NormalizerKind,
    ) -> Result<TermAnalyzer> {
        Ok(TermAnalyzer {
            tokenizer: create_tokenizer(tokenizer, min_term_length)?,
            normalizer: create_normalizer(normalizer),
        })
    }

    pub fn tokenizer(&self) -> &TokenizerType {
        &self.tokenizer
    }

    pub fn normalizer(&self) -> &dyn Normalizer {
        self.normalizer.as_ref()
    }

    /// Tokenizes `text`, drops short tokens and normalizes the rest.
    /// Repeated terms are kept; callers deduplicate as needed.
    pub fn analyze<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        self.tokenizer
            .tokenize(text)
            .filter_map(|token| self.normalize_token(token))
    }

    /// Normalizes one raw token; `None` when nothing is left of it.
    pub fn normalize_token(&self, token: &str) -> Option<String> {
        let term = self.normalizer.normalize(token);
        (!term.is_empty()).then(|| term.into_owned())
    }

    /// Returns the sorted distinct terms of `text`.
    pub fn distinct_terms(&self, text: &str) -> Vec<String> {
        let mut terms: Vec<String> = self.analyze(text).collect();
        terms.sort_unstable();
        terms.dedup();
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_terms() {
        let analyzer = TermAnalyzer::new("ascii-word", 2, NormalizerKind::SuffixStemmer).unwrap();
        let terms = analyzer.distinct_terms("Oceans and the OCEAN: a ship's war-time sailing.");
        assert_eq!(terms, vec!["and", "ocean", "sail", "ship", "the", "war-time"]);
    }

    #[test]
    fn test_min_length_applies_before_normalization() {
        let analyzer = TermAnalyzer::new("ascii-word", 3, NormalizerKind::Lowercase).unwrap();
        let terms: Vec<String> = analyzer.analyze("A an Ant").collect();
        assert_eq!(terms, vec!["ant"]);
    }

    #[test]
    fn test_unknown_tokenizer() {
        assert!(TermAnalyzer::new("whitespace", 1, NormalizerKind::Lowercase).is_err());
    }
}
