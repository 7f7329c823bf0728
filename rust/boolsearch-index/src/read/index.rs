//! Loaded, immutable inverted index.
//!
//! Opening an index reads the manifest, the document table and the whole
//! dictionary into memory; posting lists stay on disk and are fetched with
//! positional reads. No method takes `&mut self`, so one `InvertedIndex`
//! serves any number of concurrent queries.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use boolsearch_common::{Result, error::Error, verify_data};
use boolsearch_io::{FileReader, ReadAt};

use crate::{
    analyzer::TermAnalyzer,
    artifacts::{
        self, DictionaryEntry, DocumentRecord, IndexManifest, POSTINGS_FILE,
    },
    codec::decode_postings,
    normalizers::NormalizerKind,
};

pub struct InvertedIndex {
    dir: PathBuf,
    manifest: IndexManifest,
    documents: Vec<DocumentRecord>,
    dictionary: Vec<DictionaryEntry>,
    postings: Arc<dyn ReadAt>,
    postings_size: u64,
    analyzer: TermAnalyzer,
}

impl InvertedIndex {
    pub fn open(dir: impl AsRef<Path>) -> Result<InvertedIndex> {
        let dir = dir.as_ref();
        let manifest = IndexManifest::read(dir)?;
        let documents = artifacts::read_documents(dir)?;
        if documents.len() != manifest.doc_count as usize {
            return Err(Error::index_corruption(
                artifacts::DOCS_FILE,
                format!(
                    "{} documents, manifest says {}",
                    documents.len(),
                    manifest.doc_count
                ),
            ));
        }
        let dictionary = artifacts::read_dictionary(dir)?;

        let postings_path = dir.join(POSTINGS_FILE);
        let io_err = |e| Error::io(postings_path.display().to_string(), e);
        let reader = FileReader::open(&postings_path).map_err(io_err)?;
        let postings_size = reader.size().map_err(io_err)?;

        // Queries are analyzed with the build's tokenizer and normalizer but
        // without the minimum length: a short query term simply matches nothing.
        let normalizer = NormalizerKind::try_from(manifest.normalizer.as_str())
            .map_err(|e| Error::index_corruption(artifacts::MANIFEST_FILE, e.to_string()))?;
        let analyzer = TermAnalyzer::new(&manifest.tokenizer, 1, normalizer)
            .map_err(|e| Error::index_corruption(artifacts::MANIFEST_FILE, e.to_string()))?;

        log::debug!(
            "Opened index {}: {} documents, {} terms, {postings_size} postings bytes",
            dir.display(),
            documents.len(),
            dictionary.len()
        );
        Ok(InvertedIndex {
            dir: dir.to_path_buf(),
            manifest,
            documents,
            dictionary,
            postings: Arc::new(reader),
            postings_size,
            analyzer,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Analyzer that maps query text to dictionary terms.
    pub fn analyzer(&self) -> &TermAnalyzer {
        &self.analyzer
    }

    pub fn doc_count(&self) -> u32 {
        self.documents.len() as u32
    }

    pub fn term_count(&self) -> usize {
        self.dictionary.len()
    }

    pub fn document(&self, doc_id: u32) -> Option<&DocumentRecord> {
        self.documents.get(doc_id as usize)
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn dictionary(&self) -> &[DictionaryEntry] {
        &self.dictionary
    }

    pub fn lookup(&self, term: &str) -> Option<&DictionaryEntry> {
        self.dictionary
            .binary_search_by(|entry| entry.term.as_str().cmp(term))
            .ok()
            .map(|i| &self.dictionary[i])
    }

    /// Returns the posting list of `term`, or an empty list for a term that
    /// is not in the dictionary.
    pub fn posting_list(&self, term: &str) -> Result<Vec<u32>> {
        match self.lookup(term) {
            Some(entry) => self.read_postings(entry),
            None => Ok(Vec::new()),
        }
    }

    /// Reads and validates the posting list described by `entry`.
    pub fn read_postings(&self, entry: &DictionaryEntry) -> Result<Vec<u32>> {
        let end = entry.offset.checked_add(entry.length);
        if end.is_none_or(|end| end > self.postings_size) {
            return Err(Error::index_corruption(
                POSTINGS_FILE,
                format!(
                    "range {}+{} of term '{}' is outside the {}-byte postings file",
                    entry.offset, entry.length, entry.term, self.postings_size
                ),
            ));
        }
        let bytes = self
            .postings
            .read_at(entry.byte_range())
            .map_err(|e| Error::io(self.dir.join(POSTINGS_FILE).display().to_string(), e))?;
        verify_data!(postings, bytes.len() as u64 == entry.length);
        decode_postings(
            self.manifest.encoding,
            &bytes,
            entry.doc_freq as usize,
            self.doc_count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use boolsearch_common::error::ErrorKind;

    use super::*;
    use crate::write::builder::{IndexBuilder, IndexBuilderConfig};

    fn build_sample() -> (tempfile::TempDir, tempfile::TempDir) {
        let corpus = tempfile::tempdir().unwrap();
        let src = corpus.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("0.txt"), "ocean pollution").unwrap();
        std::fs::write(src.join("1.txt"), "ocean biology").unwrap();
        std::fs::write(src.join("2.txt"), "ship war").unwrap();
        let out = tempfile::tempdir().unwrap();
        IndexBuilder::new(IndexBuilderConfig::default())
            .unwrap()
            .build(corpus.path(), out.path())
            .unwrap();
        (corpus, out)
    }

    #[test]
    fn test_open_and_lookup() {
        let (_corpus, out) = build_sample();
        let index = InvertedIndex::open(out.path()).unwrap();
        assert_eq!(index.doc_count(), 3);
        assert_eq!(index.term_count(), 5);
        assert_eq!(index.posting_list("ocean").unwrap(), vec![0, 1]);
        assert_eq!(index.posting_list("ship").unwrap(), vec![2]);
        assert!(index.posting_list("whale").unwrap().is_empty());
        assert_eq!(index.document(1).unwrap().source, "src");
        assert!(index.document(3).is_none());
        assert_eq!(index.manifest().tokenizer, "ascii-word");
    }

    #[test]
    fn test_index_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InvertedIndex>();
    }

    #[test]
    fn test_truncated_postings_file() {
        let (_corpus, out) = build_sample();
        let postings = out.path().join(POSTINGS_FILE);
        let len = std::fs::metadata(&postings).unwrap().len();
        let file = std::fs::OpenOptions::new().write(true).open(&postings).unwrap();
        file.set_len(len - 1).unwrap();
        drop(file);

        let index = InvertedIndex::open(out.path()).unwrap();
        let last = index.dictionary().last().unwrap().term.clone();
        let err = index.posting_list(&last).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::IndexCorruption { .. }));
        // Other terms are still readable.
        assert_eq!(index.posting_list("ocean").unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_missing_manifest() {
        let (_corpus, out) = build_sample();
        std::fs::remove_file(out.path().join(artifacts::MANIFEST_FILE)).unwrap();
        let err = InvertedIndex::open(out.path()).err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::Io { .. }));
    }
}
