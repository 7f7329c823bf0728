//! Query command implementation

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use boolsearch_common::error::Error;
use boolsearch_index::InvertedIndex;

use crate::QueryArgs;

const PROMPT: &str = "query> ";

pub fn run(args: QueryArgs) -> Result<()> {
    let index = InvertedIndex::open(&args.index)
        .with_context(|| format!("Failed to open index {}", args.index.display()))?;
    log::info!(
        "Loaded index {}: {} documents, {} terms",
        args.index.display(),
        index.doc_count(),
        index.term_count()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &args.query {
        Some(query) => run_query(&index, query, &args, &mut out),
        None => run_interactive(&index, &args, io::stdin().lock(), &mut out),
    }
}

/// Evaluates one query and prints the hit count followed by one
/// `doc_id \t source \t path` row per hit.
fn run_query(
    index: &InvertedIndex,
    query: &str,
    args: &QueryArgs,
    out: &mut dyn Write,
) -> Result<()> {
    if args.explain {
        let plan = index.explain(query)?;
        writeln!(out, "plan: {plan}")?;
    }
    let result = index.search(query, args.limit)?;
    writeln!(out, "hits: {}", result.total_hits)?;
    for doc_id in result.hits {
        let doc = index
            .document(doc_id)
            .with_context(|| format!("Document {doc_id} missing from the document table"))?;
        writeln!(out, "{}\t{}\t{}", doc.doc_id, doc.source, doc.path)?;
    }
    Ok(())
}

/// Reads queries line by line until an empty line or end of input. A query
/// that fails on its own (bad syntax, a corrupt posting list) reports its
/// error and the loop moves on; any other failure ends the session.
fn run_interactive(
    index: &InvertedIndex,
    args: &QueryArgs,
    mut input: impl BufRead,
    out: &mut dyn Write,
) -> Result<()> {
    let mut line = String::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            break;
        }
        if let Err(e) = run_query(index, query, args, out) {
            if !is_query_error(&e) {
                return Err(e);
            }
            writeln!(out, "error: {e:#}")?;
        }
    }
    Ok(())
}

fn is_query_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<Error>().is_some_and(Error::is_query_error)
}
