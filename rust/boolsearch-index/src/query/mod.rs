//! Boolean retrieval over a loaded [`InvertedIndex`].
//!
//! A query string is lexed with the index's own analyzer, converted into a
//! postfix plan by the shunting-yard [`parser`] and executed as set algebra
//! by the [`evaluator`].

pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod set_ops;

use boolsearch_common::Result;

pub use evaluator::{PostingSource, evaluate};
pub use lexer::{QueryToken, tokenize_query};
pub use parser::{QueryOp, QueryPlan, parse};

use crate::{analyzer::TermAnalyzer, read::InvertedIndex};

/// Matching documents of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Number of matching documents before truncation.
    pub total_hits: usize,
    /// The first `limit` matching ids, ascending.
    pub hits: Vec<u32>,
}

/// Parses `query` into its evaluation plan.
pub fn plan_query(query: &str, analyzer: &TermAnalyzer) -> Result<QueryPlan> {
    parse(&tokenize_query(query, analyzer))
}

impl InvertedIndex {
    /// Returns the evaluation plan of `query` without running it.
    pub fn explain(&self, query: &str) -> Result<QueryPlan> {
        plan_query(query, self.analyzer())
    }

    /// Evaluates `query` and keeps at most `limit` hits.
    pub fn search(&self, query: &str, limit: usize) -> Result<SearchResult> {
        let plan = self.explain(query)?;
        let mut hits = evaluate(&plan, self)?;
        let total_hits = hits.len();
        hits.truncate(limit);
        log::debug!("Query '{query}' ({plan}): {total_hits} hits");
        Ok(SearchResult { total_hits, hits })
    }
}
