//! Index construction.
//!
//! The build pipeline runs in four stages:
//! - [`extract`]: tokenizes and normalizes every document into its distinct terms,
//! - [`runs`]: accumulates `(term, doc_id)` pairs in memory, spills sorted runs to
//!   temporary storage and k-way merges them back in `(term, doc_id)` order,
//! - [`assembler`]: folds the merged stream into posting lists and writes the
//!   dictionary and postings file,
//! - [`builder`]: drives the stages and writes the document table and manifest.

pub mod assembler;
pub mod builder;
pub mod extract;
pub mod runs;

use boolsearch_common::Result;

/// A streaming consumer of a term-ordered posting stream.
///
/// For each term, in ascending byte order, `start_term` is called once, then
/// `push_doc` at least once with non-decreasing document ids, then `end_term`.
pub trait PostingSink {
    /// Begins the posting list of `term`.
    fn start_term(&mut self, term: &[u8]) -> Result<()>;

    /// Adds a document to the current term.
    fn push_doc(&mut self, doc_id: u32) -> Result<()>;

    /// Completes the current term.
    fn end_term(&mut self) -> Result<()>;
}
