//! Tokenizers for extracting terms from document text and query strings.
//!
//! Tokenizers are used in two key scenarios:
//!
//! 1. **Index Creation**: the term-pair extractor breaks every document into
//!    terms. Each distinct term of a document becomes one `(term, doc_id)` pair.
//!
//! 2. **Query Processing**: the query lexer runs the same tokenizer over the
//!    operand text of a query, so that query terms are scanned with exactly the
//!    character class that was used at build time.
//!
//! The tokenizers return iterators of string slices to avoid memory allocations during
//! the tokenization process. Case folding and stemming are applied afterwards by a
//! [`Normalizer`](crate::normalizers::Normalizer).

pub mod ascii_word;
pub mod unicode_word;

use boolsearch_common::{Result, error::Error};

pub use ascii_word::AsciiWordTokenizer;
pub use unicode_word::UnicodeWordTokenizer;

/// Longer terms are cut back to this many bytes.
pub const DEFAULT_MAX_TERM_LENGTH: usize = 128;

/// Terms shorter than this many bytes are skipped.
pub const DEFAULT_MIN_TERM_LENGTH: usize = 1;

/// Splits text into raw terms.
///
/// Terms are borrowed from the input. A term over
/// [`max_term_length`](Tokenizer::max_term_length) is truncated on a
/// character boundary, one under
/// [`min_term_length`](Tokenizer::min_term_length) is skipped.
pub trait Tokenizer: Send + Sync {
    type TokenIter<'a>: Iterator<Item = &'a str>
    where
        Self: 'a;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a>;

    fn kind(&self) -> TokenizerKind;

    /// Name recorded in the index manifest.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn max_term_length(&self) -> usize;

    fn min_term_length(&self) -> usize;
}

/// Creates the tokenizer registered under `name` (`ascii-word` or
/// `unicode-word`). A `min_term_length` of zero is treated as one.
pub fn create_tokenizer(name: &str, min_term_length: usize) -> Result<TokenizerType> {
    let min_term_length = min_term_length.max(DEFAULT_MIN_TERM_LENGTH);
    let tokenizer = match TokenizerKind::try_from(name)? {
        TokenizerKind::AsciiWord => TokenizerType::AsciiWord(AsciiWordTokenizer::with_lengths(
            DEFAULT_MAX_TERM_LENGTH,
            min_term_length,
        )),
        TokenizerKind::UnicodeWord => TokenizerType::UnicodeWord(
            UnicodeWordTokenizer::with_lengths(DEFAULT_MAX_TERM_LENGTH, min_term_length),
        ),
    };
    Ok(tokenizer)
}

/// Cuts `term` to at most `max_len` bytes without splitting a character.
pub(crate) fn truncate_str(term: &str, max_len: usize) -> &str {
    if term.len() <= max_len {
        return term;
    }
    let boundary = (0..=max_len)
        .rev()
        .find(|&i| term.is_char_boundary(i))
        .unwrap_or(0);
    &term[..boundary]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerKind {
    /// ASCII letters and digits, joined across single internal apostrophes
    /// and hyphens (`don't`, `sea-level`). Everything else separates words.
    AsciiWord,
    /// Longest runs of Unicode alphanumeric characters.
    UnicodeWord,
}

impl TokenizerKind {
    pub const fn name(&self) -> &'static str {
        match self {
            TokenizerKind::AsciiWord => "ascii-word",
            TokenizerKind::UnicodeWord => "unicode-word",
        }
    }
}

impl TryFrom<&str> for TokenizerKind {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        [TokenizerKind::AsciiWord, TokenizerKind::UnicodeWord]
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| Error::invalid_arg("tokenizer", format!("Unrecognized tokenizer: {name}")))
    }
}

/// Any of the built-in tokenizers, selected at runtime by name.
pub enum TokenizerType {
    AsciiWord(AsciiWordTokenizer),
    UnicodeWord(UnicodeWordTokenizer),
}

macro_rules! dispatch {
    ($self:expr, $tokenizer:ident => $body:expr) => {
        match $self {
            TokenizerType::AsciiWord($tokenizer) => $body,
            TokenizerType::UnicodeWord($tokenizer) => $body,
        }
    };
}

impl Tokenizer for TokenizerType {
    type TokenIter<'a> = Box<dyn Iterator<Item = &'a str> + 'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        dispatch!(self, t => Box::new(t.tokenize(input)))
    }

    fn kind(&self) -> TokenizerKind {
        dispatch!(self, t => t.kind())
    }

    fn max_term_length(&self) -> usize {
        dispatch!(self, t => t.max_term_length())
    }

    fn min_term_length(&self) -> usize {
        dispatch!(self, t => t.min_term_length())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tokenizer() {
        assert!(create_tokenizer("ascii-word", 1).is_ok());
        assert!(create_tokenizer("unicode-word", 1).is_ok());
        assert!(create_tokenizer("unknown", 1).is_err());

        assert_eq!(create_tokenizer("ascii-word", 1).unwrap().name(), "ascii-word");
        assert_eq!(
            create_tokenizer("unicode-word", 1).unwrap().name(),
            "unicode-word"
        );

        let tokenizer = create_tokenizer("ascii-word", 0).unwrap();
        assert_eq!(tokenizer.min_term_length(), 1);
        let tokenizer = create_tokenizer("ascii-word", 3).unwrap();
        assert_eq!(tokenizer.min_term_length(), 3);
        assert_eq!(tokenizer.max_term_length(), DEFAULT_MAX_TERM_LENGTH);
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("ocean", 10), "ocean");
        assert_eq!(truncate_str("ocean", 3), "oce");
        // 'é' occupies bytes 3..5, so a 4-byte cut falls back to 3.
        assert_eq!(truncate_str("café", 4), "caf");
        assert_eq!(truncate_str("éa", 1), "");

        let long = "z".repeat(200);
        assert_eq!(truncate_str(&long, DEFAULT_MAX_TERM_LENGTH).len(), DEFAULT_MAX_TERM_LENGTH);
    }
}
