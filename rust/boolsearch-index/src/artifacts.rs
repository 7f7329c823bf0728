//! Persisted index artifacts.
//!
//! An index directory holds four files:
//!
//! - `docs.tsv`: `doc_id \t source \t path`, one row per document, in id order.
//! - `dict.tsv`: `term \t doc_freq \t offset \t length`, ascending by term.
//! - `postings.bin`: the concatenated posting list blobs.
//! - `manifest.json`: format version, encoding and analysis options, counts.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use boolsearch_common::{Result, error::Error};
use serde::{Deserialize, Serialize};

use crate::codec::PostingsEncoding;

pub const DOCS_FILE: &str = "docs.tsv";
pub const DICTIONARY_FILE: &str = "dict.tsv";
pub const POSTINGS_FILE: &str = "postings.bin";
pub const MANIFEST_FILE: &str = "manifest.json";

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRecord {
    pub doc_id: u32,
    pub source: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub term: String,
    pub doc_freq: u32,
    pub offset: u64,
    pub length: u64,
}

impl DictionaryEntry {
    pub fn byte_range(&self) -> std::ops::Range<u64> {
        self.offset..self.offset + self.length
    }
}

/// Description of a built index, written last so that its presence marks a
/// complete build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub encoding: PostingsEncoding,
    pub tokenizer: String,
    pub normalizer: String,
    pub stemming: bool,
    pub min_token_len: usize,
    pub doc_count: u32,
    pub term_count: u64,
    pub pair_count: u64,
    pub postings_bytes: u64,
    pub sources: BTreeMap<String, u32>,
}

impl IndexManifest {
    pub fn write(&self, dir: &Path) -> Result<()> {
        let path = dir.join(MANIFEST_FILE);
        let mut writer = create(&path)?;
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| Error::io(path.display().to_string(), e.into()))?;
        writer
            .write_all(b"\n")
            .and_then(|_| writer.flush())
            .map_err(|e| Error::io(path.display().to_string(), e))
    }

    pub fn read(dir: &Path) -> Result<IndexManifest> {
        let path = dir.join(MANIFEST_FILE);
        let text = read_text(&path)?;
        let manifest: IndexManifest = serde_json::from_str(&text)
            .map_err(|e| Error::index_corruption(MANIFEST_FILE, e.to_string()))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(Error::index_corruption(
                MANIFEST_FILE,
                format!(
                    "unsupported format version {} (expected {FORMAT_VERSION})",
                    manifest.format_version
                ),
            ));
        }
        Ok(manifest)
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| Error::io(path.display().to_string(), e))
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path.display().to_string(), e))?;
    String::from_utf8(bytes).map_err(|e| {
        Error::index_corruption(
            file_name(path),
            format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
        )
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parse_field<T: std::str::FromStr>(
    file: &str,
    line_no: usize,
    name: &str,
    value: &str,
) -> Result<T> {
    value.parse().map_err(|_| {
        Error::index_corruption(
            file,
            format!("line {}: invalid {name} '{value}'", line_no + 1),
        )
    })
}

pub fn write_documents(dir: &Path, docs: &[DocumentRecord]) -> Result<()> {
    let path = dir.join(DOCS_FILE);
    let mut writer = create(&path)?;
    let io_err = |e| Error::io(path.display().to_string(), e);
    for doc in docs {
        writeln!(writer, "{}\t{}\t{}", doc.doc_id, doc.source, doc.path).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}

/// Loads `docs.tsv`, requiring row `i` to carry doc id `i`.
pub fn read_documents(dir: &Path) -> Result<Vec<DocumentRecord>> {
    let text = read_text(&dir.join(DOCS_FILE))?;
    let mut docs = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let mut fields = line.splitn(3, '\t');
        let (Some(doc_id), Some(source), Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(Error::index_corruption(
                DOCS_FILE,
                format!("line {}: expected 3 fields", line_no + 1),
            ));
        };
        let doc_id: u32 = parse_field(DOCS_FILE, line_no, "doc_id", doc_id)?;
        if doc_id as usize != docs.len() {
            return Err(Error::index_corruption(
                DOCS_FILE,
                format!("line {}: doc_id {doc_id} does not match its row", line_no + 1),
            ));
        }
        docs.push(DocumentRecord {
            doc_id,
            source: source.to_string(),
            path: path.to_string(),
        });
    }
    Ok(docs)
}

/// Streams dictionary rows to `dict.tsv`.
pub struct DictionaryWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl DictionaryWriter {
    pub fn create(dir: &Path) -> Result<DictionaryWriter> {
        let path = dir.join(DICTIONARY_FILE);
        let writer = create(&path)?;
        Ok(DictionaryWriter { path, writer })
    }

    pub fn write_entry(&mut self, entry: &DictionaryEntry) -> Result<()> {
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}",
            entry.term, entry.doc_freq, entry.offset, entry.length
        )
        .map_err(|e| Error::io(self.path.display().to_string(), e))
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::io(self.path.display().to_string(), e))
    }
}

/// Loads `dict.tsv`, requiring strictly ascending terms.
pub fn read_dictionary(dir: &Path) -> Result<Vec<DictionaryEntry>> {
    let text = read_text(&dir.join(DICTIONARY_FILE))?;
    let mut entries: Vec<DictionaryEntry> = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split('\t').collect();
        let &[term, doc_freq, offset, length] = fields.as_slice() else {
            return Err(Error::index_corruption(
                DICTIONARY_FILE,
                format!("line {}: expected 4 fields, got {}", line_no + 1, fields.len()),
            ));
        };
        if let Some(prev) = entries.last() {
            if prev.term.as_str() >= term {
                return Err(Error::index_corruption(
                    DICTIONARY_FILE,
                    format!(
                        "line {}: term '{term}' is not after '{}'",
                        line_no + 1,
                        prev.term
                    ),
                ));
            }
        }
        let doc_freq = parse_field(DICTIONARY_FILE, line_no, "doc_freq", doc_freq)?;
        let offset = parse_field(DICTIONARY_FILE, line_no, "offset", offset)?;
        let length = parse_field(DICTIONARY_FILE, line_no, "length", length)?;
        entries.push(DictionaryEntry {
            term: term.to_string(),
            doc_freq,
            offset,
            length,
        });
    }
    Ok(entries)
}
