//! Corpus enumeration and document id assignment.
//!
//! A corpus root contains one directory per source tag, each holding plain
//! text documents named `*.txt`. Documents are ordered by their full path
//! string and numbered densely from zero, so enumerating an unchanged corpus
//! always reproduces the same ids.

use std::path::{Path, PathBuf};

use boolsearch_common::{Result, error::Error};

/// A discovered document, before its id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusDocument {
    pub source: String,
    pub path: PathBuf,
}

impl CorpusDocument {
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorpusOptions {
    /// Source tags to include. Empty means every subdirectory of the root.
    pub sources: Vec<String>,
    /// Keep only the first `max_docs` documents of the sorted list.
    pub max_docs: Option<usize>,
}

/// Lists the documents of the corpus at `root` in id order: the position of
/// a document in the returned vector is its doc id.
pub fn enumerate_documents(root: &Path, options: &CorpusOptions) -> Result<Vec<CorpusDocument>> {
    let sources = if options.sources.is_empty() {
        list_sources(root)?
    } else {
        let mut sources = options.sources.clone();
        sources.sort_unstable();
        sources.dedup();
        sources
    };

    let mut docs = Vec::new();
    for source in sources {
        let dir = root.join(&source);
        if !dir.is_dir() {
            log::warn!("Skipping missing source directory {}", dir.display());
            continue;
        }
        for path in list_text_files(&dir)? {
            docs.push(CorpusDocument {
                source: source.clone(),
                path,
            });
        }
    }

    docs.sort_by_cached_key(CorpusDocument::path_string);
    if let Some(max_docs) = options.max_docs {
        docs.truncate(max_docs);
    }
    if docs.is_empty() {
        return Err(Error::corpus_empty(root.display().to_string()));
    }
    log::debug!("Enumerated {} documents under {}", docs.len(), root.display());
    Ok(docs)
}

fn read_dir_entries(dir: &Path) -> Result<Vec<std::fs::DirEntry>> {
    let context = || dir.display().to_string();
    std::fs::read_dir(dir)
        .map_err(|e| Error::io(context(), e))?
        .map(|entry| entry.map_err(|e| Error::io(context(), e)))
        .collect()
}

fn list_sources(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Err(Error::corpus_empty(root.display().to_string()));
    }
    let mut sources: Vec<String> = read_dir_entries(root)?
        .into_iter()
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    sources.sort();
    Ok(sources)
}

fn list_text_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(read_dir_entries(dir)?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "txt"))
        .collect())
}
