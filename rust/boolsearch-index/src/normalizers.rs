//! Term normalizers applied to tokenizer output.
//!
//! A normalizer maps a raw token to the form stored in the term dictionary.
//! The same normalizer must run at build time and at query time; the index
//! manifest records which one was used.

use std::borrow::Cow;

use boolsearch_common::{Result, error::Error};

/// Maps a token to its dictionary form.
pub trait Normalizer: Send + Sync {
    fn normalize<'a>(&self, token: &'a str) -> Cow<'a, str>;

    fn kind(&self) -> NormalizerKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizerKind {
    /// Case folding only.
    Lowercase,
    /// Case folding followed by English suffix stripping.
    SuffixStemmer,
}

impl NormalizerKind {
    pub const fn name(&self) -> &'static str {
        match self {
            NormalizerKind::Lowercase => "lowercase",
            NormalizerKind::SuffixStemmer => "suffix-stemmer",
        }
    }

    /// The normalizer selected by the `stemming` build option.
    pub fn for_stemming(stemming: bool) -> NormalizerKind {
        if stemming {
            NormalizerKind::SuffixStemmer
        } else {
            NormalizerKind::Lowercase
        }
    }
}

impl TryFrom<&str> for NormalizerKind {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        match name {
            "lowercase" => Ok(NormalizerKind::Lowercase),
            "suffix-stemmer" => Ok(NormalizerKind::SuffixStemmer),
            _ => Err(Error::invalid_arg(
                "name",
                format!("Unrecognized normalizer: {name}"),
            )),
        }
    }
}

pub fn create_normalizer(kind: NormalizerKind) -> Box<dyn Normalizer> {
    match kind {
        NormalizerKind::Lowercase => Box::new(Lowercase),
        NormalizerKind::SuffixStemmer => Box::new(SuffixStemmer),
    }
}

pub struct Lowercase;

impl Normalizer for Lowercase {
    fn normalize<'a>(&self, token: &'a str) -> Cow<'a, str> {
        lowercase(token)
    }

    fn kind(&self) -> NormalizerKind {
        NormalizerKind::Lowercase
    }
}

pub struct SuffixStemmer;

impl Normalizer for SuffixStemmer {
    fn normalize<'a>(&self, token: &'a str) -> Cow<'a, str> {
        match lowercase(token) {
            Cow::Borrowed(token) => stem(token),
            Cow::Owned(token) => Cow::Owned(stem(&token).into_owned()),
        }
    }

    fn kind(&self) -> NormalizerKind {
        NormalizerKind::SuffixStemmer
    }
}

fn lowercase(token: &str) -> Cow<'_, str> {
    if token.chars().any(char::is_uppercase) {
        Cow::Owned(token.to_lowercase())
    } else {
        Cow::Borrowed(token)
    }
}

/// Suffix rewrite rules, tried in order; the first applicable one wins.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("ization", "ize"),
    ("ational", "ate"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("iveness", "ive"),
    ("tional", "tion"),
    ("biliti", "ble"),
    ("lessly", "less"),
    ("ments", "ment"),
    ("ations", "ation"),
    ("ation", "ate"),
    ("encies", "ency"),
    ("ness", ""),
    ("ment", ""),
    ("tion", ""),
    ("sion", ""),
    ("able", ""),
    ("ible", ""),
    ("ship", ""),
    ("hood", ""),
    ("ward", ""),
    ("wise", ""),
    ("ing", ""),
    ("ed", ""),
    ("ly", ""),
    ("es", "e"),
    ("s", ""),
];

/// Shortest stem (in characters) a rule may leave behind.
const MIN_STEM_LEN: usize = 3;

/// Strips one English suffix from an already case-folded token.
///
/// Tokens of at most three characters are returned unchanged. Otherwise
/// leading and trailing joiners are trimmed, a possessive `'s` is dropped and
/// the first applicable rule of [`SUFFIX_RULES`] is applied.
pub fn stem(token: &str) -> Cow<'_, str> {
    let char_len = |s: &str| s.chars().count();
    if char_len(token) <= MIN_STEM_LEN {
        return Cow::Borrowed(token);
    }

    let mut t = token.trim_matches(|c| c == '-' || c == '\'');
    if let Some(base) = t.strip_suffix("'s") {
        if char_len(base) >= MIN_STEM_LEN {
            t = base;
        }
    }

    for (suffix, replacement) in SUFFIX_RULES {
        if let Some(base) = t.strip_suffix(suffix) {
            if char_len(base) >= MIN_STEM_LEN {
                return if replacement.is_empty() {
                    Cow::Borrowed(base)
                } else {
                    Cow::Owned(format!("{base}{replacement}"))
                };
            }
        }
    }
    Cow::Borrowed(t)
}
