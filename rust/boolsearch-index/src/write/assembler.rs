//! Folds the sorted pair stream into the dictionary and postings file.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use boolsearch_common::{Result, error::Error};

use crate::{
    artifacts::{DictionaryEntry, DictionaryWriter, POSTINGS_FILE},
    codec::{PostingsEncoding, encode_postings},
    write::PostingSink,
};

/// Totals of an assembled index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblySummary {
    pub term_count: u64,
    pub pair_count: u64,
    pub postings_bytes: u64,
}

/// Writes `dict.tsv` and `postings.bin` from a term-ordered posting stream.
///
/// Terms must arrive in strictly ascending byte order; a term that is not
/// greater than its predecessor is rejected rather than written twice.
/// Repeated document ids within a term are collapsed.
pub struct InvertedIndexAssembler {
    encoding: PostingsEncoding,
    postings_path: PathBuf,
    postings: BufWriter<File>,
    dictionary: DictionaryWriter,
    term: Vec<u8>,
    has_term: bool,
    in_term: bool,
    docs: Vec<u32>,
    scratch: Vec<u8>,
    summary: AssemblySummary,
}

impl InvertedIndexAssembler {
    pub fn create(dir: &Path, encoding: PostingsEncoding) -> Result<InvertedIndexAssembler> {
        let postings_path = dir.join(POSTINGS_FILE);
        let postings = File::create(&postings_path)
            .map(|file| BufWriter::with_capacity(1024 * 1024, file))
            .map_err(|e| Error::io(postings_path.display().to_string(), e))?;
        Ok(InvertedIndexAssembler {
            encoding,
            postings_path,
            postings,
            dictionary: DictionaryWriter::create(dir)?,
            term: Vec::new(),
            has_term: false,
            in_term: false,
            docs: Vec::new(),
            scratch: Vec::new(),
            summary: AssemblySummary::default(),
        })
    }

    fn flush_term(&mut self) -> Result<()> {
        if self.docs.is_empty() {
            return Err(Error::invalid_operation(format!(
                "term '{}' has no postings",
                String::from_utf8_lossy(&self.term)
            )));
        }
        self.docs.sort_unstable();
        self.docs.dedup();

        self.scratch.clear();
        encode_postings(self.encoding, &self.docs, &mut self.scratch);
        self.postings
            .write_all(&self.scratch)
            .map_err(|e| Error::io(self.postings_path.display().to_string(), e))?;

        let term = std::str::from_utf8(&self.term)
            .map_err(|_| Error::invalid_arg("term", "term is not valid UTF-8"))?;
        self.dictionary.write_entry(&DictionaryEntry {
            term: term.to_string(),
            doc_freq: self.docs.len() as u32,
            offset: self.summary.postings_bytes,
            length: self.scratch.len() as u64,
        })?;

        self.summary.term_count += 1;
        self.summary.pair_count += self.docs.len() as u64;
        self.summary.postings_bytes += self.scratch.len() as u64;
        self.docs.clear();
        Ok(())
    }

    /// Flushes both files and returns the totals.
    pub fn finish(mut self) -> Result<AssemblySummary> {
        if self.in_term {
            return Err(Error::invalid_operation("finish inside an open term"));
        }
        self.postings
            .flush()
            .map_err(|e| Error::io(self.postings_path.display().to_string(), e))?;
        self.dictionary.finish()?;
        Ok(self.summary)
    }
}

impl PostingSink for InvertedIndexAssembler {
    fn start_term(&mut self, term: &[u8]) -> Result<()> {
        if self.in_term {
            return Err(Error::invalid_operation("start_term inside an open term"));
        }
        if term.is_empty() || term.iter().any(|&b| b == b'\t' || b == b'\n' || b == b'\r') {
            return Err(Error::invalid_arg(
                "term",
                format!("'{}' cannot be stored in the dictionary", term.escape_ascii()),
            ));
        }
        if self.has_term && term <= self.term.as_slice() {
            return Err(Error::invalid_operation(format!(
                "terms out of order: '{}' after '{}'",
                String::from_utf8_lossy(term),
                String::from_utf8_lossy(&self.term)
            )));
        }
        self.term.clear();
        self.term.extend_from_slice(term);
        self.has_term = true;
        self.in_term = true;
        Ok(())
    }

    fn push_doc(&mut self, doc_id: u32) -> Result<()> {
        if !self.in_term {
            return Err(Error::invalid_operation("push_doc outside of a term"));
        }
        if self.docs.last() != Some(&doc_id) {
            self.docs.push(doc_id);
        }
        Ok(())
    }

    fn end_term(&mut self) -> Result<()> {
        if !self.in_term {
            return Err(Error::invalid_operation("end_term outside of a term"));
        }
        self.in_term = false;
        self.flush_term()
    }
}
