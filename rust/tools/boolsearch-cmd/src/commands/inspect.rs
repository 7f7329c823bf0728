//! Inspect command implementation

use anyhow::{Context, Result};
use boolsearch_index::{InvertedIndex, PostingsEncoding};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{InspectArgs, utils::format_size};

#[derive(Serialize)]
struct InspectSummary {
    format_version: u32,
    encoding: PostingsEncoding,
    tokenizer: String,
    normalizer: String,
    min_token_len: usize,
    doc_count: u32,
    term_count: u64,
    pair_count: u64,
    postings_bytes: u64,
    sources: BTreeMap<String, u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    terms: Vec<TermInfo>,
}

#[derive(Serialize)]
struct TermInfo {
    term: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_freq: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    postings: Vec<u32>,
}

pub fn run(args: InspectArgs) -> Result<()> {
    let index = InvertedIndex::open(&args.index)
        .with_context(|| format!("Failed to open index {}", args.index.display()))?;
    let summary = inspect_index(&index, args.term.as_deref())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn inspect_index(index: &InvertedIndex, term: Option<&str>) -> Result<InspectSummary> {
    let manifest = index.manifest();
    let terms = match term {
        Some(input) => lookup_terms(index, input)?,
        None => Vec::new(),
    };
    Ok(InspectSummary {
        format_version: manifest.format_version,
        encoding: manifest.encoding,
        tokenizer: manifest.tokenizer.clone(),
        normalizer: manifest.normalizer.clone(),
        min_token_len: manifest.min_token_len,
        doc_count: manifest.doc_count,
        term_count: manifest.term_count,
        pair_count: manifest.pair_count,
        postings_bytes: manifest.postings_bytes,
        sources: manifest.sources.clone(),
        terms,
    })
}

/// Normalizes `input` the way queries are and reports the dictionary entry
/// and decoded posting list of each resulting term.
fn lookup_terms(index: &InvertedIndex, input: &str) -> Result<Vec<TermInfo>> {
    let mut terms = index.analyzer().distinct_terms(input);
    if terms.is_empty() {
        terms.push(input.to_string());
    }
    terms
        .into_iter()
        .map(|term| match index.lookup(&term) {
            Some(entry) => {
                let postings = index
                    .read_postings(entry)
                    .with_context(|| format!("Failed to read postings of '{term}'"))?;
                Ok(TermInfo {
                    doc_freq: Some(entry.doc_freq),
                    offset: Some(entry.offset),
                    length: Some(entry.length),
                    postings,
                    term,
                })
            }
            None => Ok(TermInfo {
                term,
                doc_freq: None,
                offset: None,
                length: None,
                postings: Vec::new(),
            }),
        })
        .collect()
}

fn print_summary(summary: &InspectSummary) {
    println!("Format version: {}", summary.format_version);
    println!("Encoding:       {}", summary.encoding);
    println!("Tokenizer:      {}", summary.tokenizer);
    println!("Normalizer:     {}", summary.normalizer);
    println!("Min token len:  {}", summary.min_token_len);
    println!("Documents:      {}", summary.doc_count);
    for (source, count) in &summary.sources {
        println!("  {source}: {count}");
    }
    println!("Terms:          {}", summary.term_count);
    println!("Pairs:          {}", summary.pair_count);
    println!("Postings:       {}", format_size(summary.postings_bytes));

    for info in &summary.terms {
        match info.doc_freq {
            Some(doc_freq) => {
                let ids: Vec<String> = info.postings.iter().map(u32::to_string).collect();
                println!(
                    "Term '{}': df={} offset={} length={} docs=[{}]",
                    info.term,
                    doc_freq,
                    info.offset.unwrap_or_default(),
                    info.length.unwrap_or_default(),
                    ids.join(", ")
                );
            }
            None => println!("Term '{}': not in dictionary", info.term),
        }
    }
}
