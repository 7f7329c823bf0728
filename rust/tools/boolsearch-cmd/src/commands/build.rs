//! Build command implementation

use anyhow::{Context, Result};
use boolsearch_index::{
    BuildSummary, IndexBuilder, IndexBuilderConfig, PostingsEncoding, RunConfig,
    corpus::CorpusOptions,
};

use crate::{
    BuildArgs,
    utils::{format_elapsed, format_size, validate_dir_exists},
};

pub fn run(args: BuildArgs) -> Result<()> {
    let json = args.json;
    let summary = build_index(args)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn builder_config(args: &BuildArgs) -> Result<IndexBuilderConfig> {
    let encoding = PostingsEncoding::try_from(args.encoding.as_str())
        .with_context(|| format!("Invalid --encoding value '{}'", args.encoding))?;
    Ok(IndexBuilderConfig {
        min_token_len: args.min_token_len,
        stemming: !args.no_stemming,
        tokenizer: args.tokenizer.clone(),
        encoding,
        corpus: CorpusOptions {
            sources: args.sources.clone(),
            max_docs: args.max_docs,
        },
        run: RunConfig {
            max_run_size: args.run_size_mb.saturating_mul(1024 * 1024),
            max_merge_fan_in: args.fan_in,
        },
        temp_dir: args.temp_dir.clone(),
        ..Default::default()
    })
}

fn build_index(args: BuildArgs) -> Result<BuildSummary> {
    validate_dir_exists(&args.corpus)?;
    let config = builder_config(&args)?;
    let builder = IndexBuilder::new(config).context("Invalid build options")?;
    builder.build(&args.corpus, &args.out).with_context(|| {
        format!(
            "Failed to build index from {} into {}",
            args.corpus.display(),
            args.out.display()
        )
    })
}

fn print_summary(summary: &BuildSummary) {
    println!("Documents:      {}", summary.documents);
    for (source, count) in &summary.sources {
        println!("  {source}: {count}");
    }
    println!("Pairs:          {}", summary.pairs);
    println!("Input:          {}", format_size(summary.input_bytes));
    println!("Terms:          {}", summary.terms);
    println!(
        "Postings:       {} ({})",
        format_size(summary.postings_bytes),
        summary.encoding
    );
    println!("Spilled runs:   {}", summary.spilled_runs);
    println!("Merge passes:   {}", summary.merge_passes);
    println!("Elapsed:        {}", format_elapsed(summary.elapsed_ms));
}
