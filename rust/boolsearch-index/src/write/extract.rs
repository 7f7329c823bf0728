//! Per-document term extraction.

use std::sync::Arc;

use boolsearch_common::{Result, error::Error};
use rayon::prelude::*;

use crate::{analyzer::TermAnalyzer, corpus::CorpusDocument};

/// The distinct terms of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub doc_id: u32,
    /// Sorted and duplicate-free.
    pub terms: Vec<String>,
    pub input_bytes: u64,
}

/// Turns documents into their distinct term sets. Holds no mutable state, so
/// a single extractor serves all worker threads.
#[derive(Clone)]
pub struct TermPairExtractor {
    analyzer: Arc<TermAnalyzer>,
}

impl TermPairExtractor {
    pub fn new(analyzer: Arc<TermAnalyzer>) -> TermPairExtractor {
        TermPairExtractor { analyzer }
    }

    /// Extracts the terms of `text`. Invalid UTF-8 is replaced, not rejected.
    pub fn extract_bytes(&self, doc_id: u32, bytes: &[u8]) -> ExtractedDocument {
        let text = String::from_utf8_lossy(bytes);
        ExtractedDocument {
            doc_id,
            terms: self.analyzer.distinct_terms(&text),
            input_bytes: bytes.len() as u64,
        }
    }

    pub fn extract(&self, doc_id: u32, doc: &CorpusDocument) -> Result<ExtractedDocument> {
        let bytes = std::fs::read(&doc.path)
            .map_err(|e| Error::io(doc.path.display().to_string(), e))?;
        Ok(self.extract_bytes(doc_id, &bytes))
    }

    /// Extracts a batch of consecutive documents in parallel. `first_doc_id`
    /// is the id of `docs[0]`; the result keeps the input order.
    pub fn extract_batch(
        &self,
        first_doc_id: u32,
        docs: &[CorpusDocument],
    ) -> Result<Vec<ExtractedDocument>> {
        docs.into_par_iter()
            .enumerate()
            .map(|(i, doc)| self.extract(first_doc_id + i as u32, doc))
            .collect()
    }
}
