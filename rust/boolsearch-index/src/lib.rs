//! Disk-resident inverted index with boolean retrieval.
//!
//! # Overview
//!
//! The crate has two halves that share one on-disk format:
//!
//! 1. **Index Construction** ([`write`]): a corpus of plain text documents is
//!    enumerated, each document is reduced to its distinct normalized terms,
//!    the resulting `(term, doc_id)` pairs are sorted with a disk-backed
//!    external merge sort, and the sorted stream is folded into a term
//!    dictionary and a file of delta/varint encoded posting lists.
//! 2. **Boolean Retrieval** ([`read`], [`query`]): the dictionary and document
//!    table are loaded once, and queries using `AND`, `OR`, `NOT` and
//!    parentheses are evaluated as set algebra over posting lists.
//!
//! # Quick Start
//!
//! ```no_run
//! use boolsearch_index::{IndexBuilder, IndexBuilderConfig, InvertedIndex};
//!
//! let builder = IndexBuilder::new(IndexBuilderConfig::default())?;
//! builder.build("data_text".as_ref(), "index".as_ref())?;
//!
//! let index = InvertedIndex::open("index")?;
//! let result = index.search("ocean AND NOT (ship OR war)", 10)?;
//! for doc in result.hits.iter().filter_map(|&id| index.document(id)) {
//!     println!("{}\t{}", doc.source, doc.path);
//! }
//! # Ok::<(), boolsearch_common::error::Error>(())
//! ```

pub mod analyzer;
pub mod artifacts;
pub mod codec;
pub mod corpus;
pub mod normalizers;
pub mod query;
pub mod read;
pub mod tokenizers;
pub mod write;

pub use analyzer::TermAnalyzer;
pub use codec::PostingsEncoding;
pub use query::SearchResult;
pub use read::InvertedIndex;
pub use tokenizers::{Tokenizer, create_tokenizer};
pub use write::builder::{BuildSummary, IndexBuilder, IndexBuilderConfig};
pub use write::runs::RunConfig;
