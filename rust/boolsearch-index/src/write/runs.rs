//! External sort of `(term, doc_id)` pairs.
//!
//! Pairs are accumulated in a [`RunBuffer`] until it reaches the configured
//! size, then sorted and spilled to temporary storage as a *run*. At the end,
//! the runs are k-way merged into a [`PostingSink`]. When there are more runs
//! than the merge fan-in allows, groups of runs are first merged into new,
//! larger runs.
//!
//! # Run format
//!
//! A run is a sequence of term records in ascending term order, followed by a
//! two-byte zero terminator:
//!
//! ```text
//! term_len: u16 (non-zero) | term: [u8; term_len] | doc_count: u32 | doc_ids: [u32; doc_count]
//! ```
//!
//! All integers are little-endian. Documents within a record are ascending.

use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    io::{BufReader, Read, Write},
    sync::Arc,
};

use ahash::AHashMap;
use boolsearch_common::{Result, error::Error, verify_arg};
use boolsearch_io::{TemporaryFileStore, TemporaryWritable};

use crate::write::PostingSink;

/// Sizing of the external sort.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Approximate in-memory size of a run buffer before it is spilled.
    pub max_run_size: usize,
    /// Maximum number of runs merged at once.
    pub max_merge_fan_in: usize,
}

impl RunConfig {
    pub const DEFAULT_MAX_RUN_SIZE: usize = 64 * 1024 * 1024;
    pub const DEFAULT_MAX_MERGE_FAN_IN: usize = 64;

    pub fn validate(&self) -> Result<()> {
        verify_arg!(max_run_size, self.max_run_size > 0);
        verify_arg!(max_merge_fan_in, self.max_merge_fan_in >= 2);
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            max_run_size: Self::DEFAULT_MAX_RUN_SIZE,
            max_merge_fan_in: Self::DEFAULT_MAX_MERGE_FAN_IN,
        }
    }
}

/// Pair accumulated in a run buffer. `term` indexes `RunBuffer::terms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PairEntry {
    term: u32,
    doc: u32,
}

/// In-memory accumulator for one run.
#[derive(Default)]
pub struct RunBuffer {
    term_ids: AHashMap<Box<str>, u32>,
    terms: Vec<Box<str>>,
    term_bytes: usize,
    entries: Vec<PairEntry>,
}

impl RunBuffer {
    pub fn new() -> RunBuffer {
        RunBuffer::default()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rough heap footprint: pair entries plus interned terms (counted twice
    /// for the map key and the id table) with a per-term overhead.
    pub fn estimate_size(&self) -> usize {
        self.entries.len() * std::mem::size_of::<PairEntry>()
            + self.term_bytes * 2
            + self.terms.len() * 48
    }

    fn map_term(&mut self, term: &str) -> u32 {
        if let Some(&id) = self.term_ids.get(term) {
            return id;
        }
        let id = self.terms.len() as u32;
        let term: Box<str> = term.into();
        self.term_bytes += term.len();
        self.term_ids.insert(term.clone(), id);
        self.terms.push(term);
        id
    }

    /// Adds one pair per term of a document.
    pub fn push_document(&mut self, doc_id: u32, terms: &[String]) {
        for term in terms {
            let term = self.map_term(term);
            self.entries.push(PairEntry { term, doc: doc_id });
        }
    }

    /// Sorts the buffered pairs by `(term bytes, doc_id)`, writes them out in
    /// the run format and clears the buffer.
    pub fn spill(&mut self, writer: &mut dyn Write) -> Result<()> {
        let mut sorted_to_current: Vec<u32> = (0..self.terms.len() as u32).collect();
        sorted_to_current.sort_unstable_by(|&a, &b| {
            self.terms[a as usize]
                .as_bytes()
                .cmp(self.terms[b as usize].as_bytes())
        });
        let mut current_to_sorted = vec![0u32; sorted_to_current.len()];
        for (sorted, &current) in sorted_to_current.iter().enumerate() {
            current_to_sorted[current as usize] = sorted as u32;
        }
        for entry in self.entries.iter_mut() {
            entry.term = current_to_sorted[entry.term as usize];
        }
        self.entries.sort_unstable();

        let mut docs = Vec::new();
        let mut pos = 0;
        while pos < self.entries.len() {
            let term_id = self.entries[pos].term;
            docs.clear();
            while pos < self.entries.len() && self.entries[pos].term == term_id {
                docs.push(self.entries[pos].doc);
                pos += 1;
            }
            docs.dedup();
            let term = &self.terms[sorted_to_current[term_id as usize] as usize];
            write_record(writer, term.as_bytes(), &docs)?;
        }
        writer.write_all(&0u16.to_le_bytes())?;
        writer.flush()?;

        self.clear();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.term_ids.clear();
        self.terms.clear();
        self.term_bytes = 0;
        self.entries.clear();
    }
}

fn write_record(writer: &mut dyn Write, term: &[u8], docs: &[u32]) -> Result<()> {
    if term.is_empty() || term.len() > u16::MAX as usize {
        return Err(Error::invalid_arg(
            "term",
            format!("term length {} is not representable in a run", term.len()),
        ));
    }
    writer.write_all(&(term.len() as u16).to_le_bytes())?;
    writer.write_all(term)?;
    writer.write_all(&(docs.len() as u32).to_le_bytes())?;
    let mut buf = Vec::with_capacity(docs.len() * 4);
    for doc in docs {
        buf.extend_from_slice(&doc.to_le_bytes());
    }
    writer.write_all(&buf)?;
    Ok(())
}

/// Sequential reader over one spilled run.
pub struct RunDecoder {
    reader: BufReader<Box<dyn Read + Send>>,
    term: Vec<u8>,
    docs: Vec<u32>,
    done: bool,
}

impl RunDecoder {
    pub fn new(reader: Box<dyn Read + Send>) -> RunDecoder {
        RunDecoder {
            reader: BufReader::with_capacity(64 * 1024, reader),
            term: Vec::new(),
            docs: Vec::new(),
            done: false,
        }
    }

    /// Advances to the next term record. Returns `false` at the end of the run.
    pub fn next_term(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        let mut buf2 = [0u8; 2];
        self.reader.read_exact(&mut buf2)?;
        let term_len = u16::from_le_bytes(buf2) as usize;
        if term_len == 0 {
            self.done = true;
            self.term.clear();
            self.docs.clear();
            return Ok(false);
        }
        self.term.resize(term_len, 0);
        self.reader.read_exact(&mut self.term)?;

        let mut buf4 = [0u8; 4];
        self.reader.read_exact(&mut buf4)?;
        let doc_count = u32::from_le_bytes(buf4) as usize;
        if doc_count == 0 {
            return Err(Error::invalid_operation("run record without documents"));
        }
        let mut bytes = vec![0u8; doc_count * 4];
        self.reader.read_exact(&mut bytes)?;
        self.docs.clear();
        self.docs.extend(
            bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])),
        );
        Ok(true)
    }

    pub fn term(&self) -> &[u8] {
        &self.term
    }

    pub fn docs(&self) -> &[u32] {
        &self.docs
    }
}

struct MergeCursor {
    omit_term_comparison: bool,
    decoder: RunDecoder,
}

impl PartialEq for MergeCursor {
    fn eq(&self, other: &MergeCursor) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeCursor {}

impl Ord for MergeCursor {
    fn cmp(&self, other: &MergeCursor) -> Ordering {
        let term_ord = if self.omit_term_comparison {
            Ordering::Equal
        } else {
            self.decoder.term().cmp(other.decoder.term())
        };
        // BinaryHeap is a max-heap; reverse so the least term (then the least
        // first document) is on top.
        term_ord
            .then_with(|| self.decoder.docs()[0].cmp(&other.decoder.docs()[0]))
            .reverse()
    }
}

impl PartialOrd for MergeCursor {
    fn partial_cmp(&self, other: &MergeCursor) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Merges sorted runs into `sink` in `(term, doc_id)` order.
///
/// Two heaps are used: the term heap orders cursors by their current term;
/// all cursors positioned on the least term are moved to the document heap
/// and drained by first document id without comparing terms again.
pub fn merge_runs<S>(decoders: Vec<RunDecoder>, sink: &mut S) -> Result<()>
where
    S: ?Sized + PostingSink,
{
    let mut term_heap = BinaryHeap::with_capacity(decoders.len());
    for mut decoder in decoders {
        if decoder.next_term()? {
            term_heap.push(MergeCursor {
                omit_term_comparison: false,
                decoder,
            });
        }
    }

    let mut doc_heap = BinaryHeap::new();
    while let Some(mut cursor) = term_heap.pop() {
        sink.start_term(cursor.decoder.term())?;

        while term_heap
            .peek()
            .is_some_and(|next| next.decoder.term() == cursor.decoder.term())
        {
            if let Some(mut same) = term_heap.pop() {
                same.omit_term_comparison = true;
                doc_heap.push(same);
            }
        }
        cursor.omit_term_comparison = true;
        doc_heap.push(cursor);

        while let Some(mut cursor) = doc_heap.pop() {
            for &doc in cursor.decoder.docs() {
                sink.push_doc(doc)?;
            }
            if cursor.decoder.next_term()? {
                cursor.omit_term_comparison = false;
                term_heap.push(cursor);
            }
        }
        sink.end_term()?;
    }
    Ok(())
}

/// A sink that writes the merged stream back out as a new run.
pub struct RunWriterSink {
    writer: Box<dyn TemporaryWritable>,
    term: Vec<u8>,
    docs: Vec<u32>,
}

impl RunWriterSink {
    pub fn new(writer: Box<dyn TemporaryWritable>) -> RunWriterSink {
        RunWriterSink {
            writer,
            term: Vec::new(),
            docs: Vec::new(),
        }
    }

    pub fn finish(mut self) -> Result<Box<dyn Read + Send>> {
        self.writer.write_all(&0u16.to_le_bytes())?;
        self.writer.flush()?;
        Ok(self.writer.into_reader()?)
    }
}

impl PostingSink for RunWriterSink {
    fn start_term(&mut self, term: &[u8]) -> Result<()> {
        self.term.clear();
        self.term.extend_from_slice(term);
        self.docs.clear();
        Ok(())
    }

    fn push_doc(&mut self, doc_id: u32) -> Result<()> {
        if self.docs.last() != Some(&doc_id) {
            self.docs.push(doc_id);
        }
        Ok(())
    }

    fn end_term(&mut self) -> Result<()> {
        write_record(self.writer.as_mut(), &self.term, &self.docs)
    }
}

/// Statistics of a completed external sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortStats {
    pub pair_count: u64,
    pub spilled_runs: usize,
    pub merge_passes: usize,
}

/// Disk-backed sorter for the pair stream of a whole corpus.
pub struct ExternalSorter {
    config: RunConfig,
    temp_store: Arc<dyn TemporaryFileStore>,
    buffer: RunBuffer,
    runs: Vec<Box<dyn Read + Send>>,
    stats: SortStats,
}

impl ExternalSorter {
    pub fn new(config: RunConfig, temp_store: Arc<dyn TemporaryFileStore>) -> Result<Self> {
        config.validate()?;
        Ok(ExternalSorter {
            config,
            temp_store,
            buffer: RunBuffer::new(),
            runs: Vec::new(),
            stats: SortStats::default(),
        })
    }

    /// Adds the pairs of one document. Documents must be pushed in ascending
    /// id order.
    pub fn push_document(&mut self, doc_id: u32, terms: &[String]) -> Result<()> {
        self.buffer.push_document(doc_id, terms);
        self.stats.pair_count += terms.len() as u64;
        if self.buffer.estimate_size() >= self.config.max_run_size {
            self.spill()?;
        }
        Ok(())
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    fn spill(&mut self) -> Result<()> {
        let mut writer = self
            .temp_store
            .allocate_writable(Some(self.buffer.estimate_size()))?;
        log::debug!(
            "Spilling run {}: {} pairs, {} terms",
            self.runs.len(),
            self.buffer.entry_count(),
            self.buffer.term_count()
        );
        self.buffer.spill(writer.as_mut())?;
        self.runs.push(writer.into_reader()?);
        self.stats.spilled_runs += 1;
        Ok(())
    }

    fn merge_pass(&mut self) -> Result<()> {
        let runs = std::mem::take(&mut self.runs);
        let input_runs = runs.len();
        let mut runs = runs.into_iter().peekable();
        while runs.peek().is_some() {
            let group: Vec<RunDecoder> = runs
                .by_ref()
                .take(self.config.max_merge_fan_in)
                .map(RunDecoder::new)
                .collect();
            let mut sink = RunWriterSink::new(self.temp_store.allocate_writable(None)?);
            merge_runs(group, &mut sink)?;
            self.runs.push(sink.finish()?);
        }
        self.stats.merge_passes += 1;
        log::debug!(
            "Merge pass {}: {input_runs} runs into {}",
            self.stats.merge_passes,
            self.runs.len()
        );
        Ok(())
    }

    /// Flushes the buffer and merges every run into `sink`.
    pub fn finish<S>(mut self, sink: &mut S) -> Result<SortStats>
    where
        S: ?Sized + PostingSink,
    {
        if !self.buffer.is_empty() {
            self.spill()?;
        }
        while self.runs.len() > self.config.max_merge_fan_in {
            self.merge_pass()?;
        }
        let decoders = std::mem::take(&mut self.runs)
            .into_iter()
            .map(RunDecoder::new)
            .collect();
        merge_runs(decoders, sink)?;
        self.stats.merge_passes += 1;
        Ok(self.stats)
    }
}
