//! ASCII Word Tokenizer - the default word rule for English corpora.
//!
//! A word is a run of ASCII letters and digits. A single apostrophe or hyphen
//! between two alphanumeric characters is kept inside the word, so `don't`,
//! `o'neil` and `sea-level` are single terms while `rock--roll`, `-x` and
//! `cats'` are split at the joiner. Any other byte (including non-ASCII text)
//! separates words.

use super::{DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, Tokenizer, truncate_str};
use crate::tokenizers::TokenizerKind;

pub struct AsciiWordTokenizer {
    max_term_length: usize,
    min_term_length: usize,
}

impl AsciiWordTokenizer {
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

impl Default for AsciiWordTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn is_joiner(b: u8) -> bool {
    b == b'\'' || b == b'-'
}

/// Iterator over ASCII words. Scans bytes; every word boundary falls on an
/// ASCII byte, so the yielded slices are always valid `str` slices.
pub struct AsciiWordIter<'a> {
    input: &'a str,
    pos: usize,
    max_term_length: usize,
    min_term_length: usize,
}

impl<'a> AsciiWordIter<'a> {
    fn next_word(&mut self) -> Option<&'a str> {
        let bytes = self.input.as_bytes();
        let mut i = self.pos;
        while i < bytes.len() && !bytes[i].is_ascii_alphanumeric() {
            i += 1;
        }
        if i == bytes.len() {
            self.pos = i;
            return None;
        }

        let start = i;
        while i < bytes.len() {
            if bytes[i].is_ascii_alphanumeric() {
                i += 1;
            } else if is_joiner(bytes[i])
                && i + 1 < bytes.len()
                && bytes[i + 1].is_ascii_alphanumeric()
            {
                i += 2;
            } else {
                break;
            }
        }
        self.pos = i;
        Some(&self.input[start..i])
    }
}

impl<'a> Iterator for AsciiWordIter<'a> {
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

impl Tokenizer for AsciiWordTokenizer {
    type TokenIter<'a> = AsciiWordIter<'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        AsciiWordIter {
            input,
            pos: 0,
            max_term_length: self.max_term_length,
            min_term_length: self.min_term_length,
        }
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::AsciiWord
    }

    fn max_term_length(&self) -> usize {
        self.max_term_length
    }

    fn min_term_length(&self) -> usize {
        self.min_term_length
    }
}
