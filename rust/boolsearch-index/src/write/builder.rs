//! # Index Builder
//!
//! Drives a complete index build from a corpus directory:
//!
//! 1. enumerate the corpus and assign document ids,
//! 2. extract the distinct terms of each document, in parallel batches,
//! 3. feed the pairs to the external sorter in document id order,
//! 4. merge the sorted runs into the [`InvertedIndexAssembler`],
//! 5. write the document table and, last, the manifest.
//!
//! The manifest is removed at the start of a build and written only after
//! every other artifact is complete, so a directory with a manifest always
//! holds a consistent index.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use boolsearch_common::{Result, error::Error, verify_arg};
use boolsearch_io::{TemporaryFileStore, temp_file_store};
use serde::Serialize;

use crate::{
    analyzer::TermAnalyzer,
    artifacts::{self, DocumentRecord, FORMAT_VERSION, IndexManifest, MANIFEST_FILE},
    codec::PostingsEncoding,
    corpus::{self, CorpusOptions},
    normalizers::NormalizerKind,
    tokenizers::TokenizerKind,
    write::{
        assembler::InvertedIndexAssembler,
        extract::TermPairExtractor,
        runs::{ExternalSorter, RunConfig},
    },
};

#[derive(Debug, Clone)]
pub struct IndexBuilderConfig {
    /// Tokens shorter than this many bytes are dropped before normalization.
    pub min_token_len: usize,
    /// Apply the suffix stemmer after case folding.
    pub stemming: bool,
    pub tokenizer: String,
    pub encoding: PostingsEncoding,
    pub corpus: CorpusOptions,
    pub run: RunConfig,
    /// Parent directory for spilled runs. Defaults to the system temp directory.
    pub temp_dir: Option<PathBuf>,
    /// Number of documents extracted in parallel before their pairs are
    /// handed to the sorter.
    pub batch_size: usize,
}

impl IndexBuilderConfig {
    pub const DEFAULT_MIN_TOKEN_LEN: usize = 2;
    pub const DEFAULT_BATCH_SIZE: usize = 256;

    pub fn validate(&self) -> Result<()> {
        verify_arg!(min_token_len, self.min_token_len >= 1);
        verify_arg!(batch_size, self.batch_size >= 1);
        TokenizerKind::try_from(self.tokenizer.as_str())?;
        self.run.validate()
    }

    pub fn normalizer(&self) -> NormalizerKind {
        NormalizerKind::for_stemming(self.stemming)
    }
}

impl Default for IndexBuilderConfig {
    fn default() -> Self {
        IndexBuilderConfig {
            min_token_len: Self::DEFAULT_MIN_TOKEN_LEN,
            stemming: true,
            tokenizer: TokenizerKind::AsciiWord.name().to_string(),
            encoding: PostingsEncoding::default(),
            corpus: CorpusOptions::default(),
            run: RunConfig::default(),
            temp_dir: None,
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }
}

/// Outcome of a successful build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub documents: u32,
    pub pairs: u64,
    pub input_bytes: u64,
    pub terms: u64,
    pub postings_bytes: u64,
    pub spilled_runs: usize,
    pub merge_passes: usize,
    pub encoding: PostingsEncoding,
    pub sources: BTreeMap<String, u32>,
    pub elapsed_ms: u64,
}

pub struct IndexBuilder {
    config: IndexBuilderConfig,
    temp_store: Option<Arc<dyn TemporaryFileStore>>,
}

impl IndexBuilder {
    pub fn new(config: IndexBuilderConfig) -> Result<IndexBuilder> {
        config.validate()?;
        Ok(IndexBuilder {
            config,
            temp_store: None,
        })
    }

    /// Uses `store` for spilled runs instead of a scratch directory.
    pub fn with_temp_store(mut self, store: Arc<dyn TemporaryFileStore>) -> IndexBuilder {
        self.temp_store = Some(store);
        self
    }

    pub fn config(&self) -> &IndexBuilderConfig {
        &self.config
    }

    fn temp_store(&self) -> Result<Arc<dyn TemporaryFileStore>> {
        match &self.temp_store {
            Some(store) => Ok(store.clone()),
            None => {
                let parent = self.config.temp_dir.as_deref();
                temp_file_store::create_file_based(parent).map_err(|e| {
                    let context = parent
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "temp dir".to_string());
                    Error::io(context, e)
                })
            }
        }
    }

    /// Builds the index of the corpus at `corpus_root` into `out_dir`,
    /// replacing any index already there.
    pub fn build(&self, corpus_root: &Path, out_dir: &Path) -> Result<BuildSummary> {
        let started = Instant::now();
        let config = &self.config;

        let docs = corpus::enumerate_documents(corpus_root, &config.corpus)?;
        let doc_count = u32::try_from(docs.len())
            .map_err(|_| Error::invalid_arg("corpus", "more than u32::MAX documents"))?;
        log::info!(
            "Indexing {doc_count} documents from {}",
            corpus_root.display()
        );

        let mut sources = BTreeMap::<String, u32>::new();
        let records: Vec<DocumentRecord> = docs
            .iter()
            .enumerate()
            .map(|(doc_id, doc)| {
                *sources.entry(doc.source.clone()).or_default() += 1;
                DocumentRecord {
                    doc_id: doc_id as u32,
                    source: doc.source.clone(),
                    path: doc.path_string(),
                }
            })
            .collect();
        if let Some(doc) = records
            .iter()
            .find(|doc| doc.path.contains(['\n', '\r']) || doc.source.contains('\t'))
        {
            return Err(Error::invalid_arg(
                "corpus",
                format!("document path cannot be stored in the table: {:?}", doc.path),
            ));
        }

        std::fs::create_dir_all(out_dir)
            .map_err(|e| Error::io(out_dir.display().to_string(), e))?;
        remove_stale_manifest(out_dir)?;

        let analyzer = TermAnalyzer::new(
            &config.tokenizer,
            config.min_token_len,
            config.normalizer(),
        )?;
        let extractor = TermPairExtractor::new(Arc::new(analyzer));
        let mut sorter = ExternalSorter::new(config.run.clone(), self.temp_store()?)?;

        let mut input_bytes = 0u64;
        let mut first_doc_id = 0u32;
        for batch in docs.chunks(config.batch_size) {
            for doc in extractor.extract_batch(first_doc_id, batch)? {
                input_bytes += doc.input_bytes;
                sorter.push_document(doc.doc_id, &doc.terms)?;
            }
            first_doc_id += batch.len() as u32;
        }
        log::debug!(
            "Extraction complete: {input_bytes} bytes, {} runs spilled",
            sorter.run_count()
        );

        let mut assembler = InvertedIndexAssembler::create(out_dir, config.encoding)?;
        let sort_stats = sorter.finish(&mut assembler)?;
        let assembly = assembler.finish()?;
        log::debug!(
            "Assembled {} terms, {} postings bytes",
            assembly.term_count,
            assembly.postings_bytes
        );

        artifacts::write_documents(out_dir, &records)?;

        IndexManifest {
            format_version: FORMAT_VERSION,
            encoding: config.encoding,
            tokenizer: config.tokenizer.clone(),
            normalizer: config.normalizer().name().to_string(),
            stemming: config.stemming,
            min_token_len: config.min_token_len,
            doc_count,
            term_count: assembly.term_count,
            pair_count: assembly.pair_count,
            postings_bytes: assembly.postings_bytes,
            sources: sources.clone(),
        }
        .write(out_dir)?;

        let summary = BuildSummary {
            documents: doc_count,
            pairs: sort_stats.pair_count,
            input_bytes,
            terms: assembly.term_count,
            postings_bytes: assembly.postings_bytes,
            spilled_runs: sort_stats.spilled_runs,
            merge_passes: sort_stats.merge_passes,
            encoding: config.encoding,
            sources,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        log::info!(
            "Built index in {}: {} documents, {} terms, {} pairs, {} postings bytes, {} ms",
            out_dir.display(),
            summary.documents,
            summary.terms,
            summary.pairs,
            summary.postings_bytes,
            summary.elapsed_ms
        );
        Ok(summary)
    }
}

fn remove_stale_manifest(out_dir: &Path) -> Result<()> {
    let path = out_dir.join(MANIFEST_FILE);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path.display().to_string(), e)),
    }
}
