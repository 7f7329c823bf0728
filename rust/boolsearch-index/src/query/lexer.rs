//! Query tokenization.
//!
//! Parentheses are always tokens of their own. The remaining text is scanned
//! with the index's tokenizer; a raw word spelling `AND`, `OR` or `NOT` in any
//! case is an operator, every other word is normalized into a term.
//! Punctuation therefore never hides an operator (`ocean AND,ship` is a
//! conjunction), while `androids` stays a single term.

use crate::{analyzer::TermAnalyzer, tokenizers::Tokenizer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    Term(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

fn keyword(word: &str) -> Option<QueryToken> {
    if word.eq_ignore_ascii_case("and") {
        Some(QueryToken::And)
    } else if word.eq_ignore_ascii_case("or") {
        Some(QueryToken::Or)
    } else if word.eq_ignore_ascii_case("not") {
        Some(QueryToken::Not)
    } else {
        None
    }
}

pub fn tokenize_query(query: &str, analyzer: &TermAnalyzer) -> Vec<QueryToken> {
    let mut tokens = Vec::new();
    let push_words = |text: &str, tokens: &mut Vec<QueryToken>| {
        for word in analyzer.tokenizer().tokenize(text) {
            match keyword(word) {
                Some(op) => tokens.push(op),
                None => tokens.extend(analyzer.normalize_token(word).map(QueryToken::Term)),
            }
        }
    };

    let mut start = 0;
    for (pos, ch) in query.char_indices() {
        let paren = match ch {
            '(' => QueryToken::LParen,
            ')' => QueryToken::RParen,
            _ => continue,
        };
        push_words(&query[start..pos], &mut tokens);
        tokens.push(paren);
        start = pos + 1;
    }
    push_words(&query[start..], &mut tokens);
    tokens
}
