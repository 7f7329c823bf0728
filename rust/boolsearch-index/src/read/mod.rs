//! Read side of the index: loading the artifacts written by the builder and
//! fetching posting lists for the query evaluator.

mod index;

pub use index::InvertedIndex;
