use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "boolsearch-cmd")]
#[command(about = "Build and query disk-resident boolean search indexes")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace). RUST_LOG overrides it.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a directory of text documents
    Build(BuildArgs),

    /// Run boolean queries against an index
    Query(QueryArgs),

    /// Display summary information about an index
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Corpus root; every subdirectory is a source holding `*.txt` documents
    #[arg(long)]
    pub corpus: PathBuf,

    /// Output index directory
    #[arg(long)]
    pub out: PathBuf,

    /// Tokens shorter than this are dropped
    #[arg(long, default_value_t = 2)]
    pub min_token_len: usize,

    /// Disable suffix stemming (terms are only lowercased)
    #[arg(long)]
    pub no_stemming: bool,

    /// Index at most this many documents
    #[arg(long)]
    pub max_docs: Option<usize>,

    /// Restrict the build to a source subdirectory (can be specified multiple times)
    #[arg(long = "source")]
    pub sources: Vec<String>,

    /// Parent directory for spilled runs
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// In-memory run size in MiB before spilling to disk
    #[arg(long, default_value_t = 64)]
    pub run_size_mb: usize,

    /// Maximum number of runs merged at once
    #[arg(long, default_value_t = 64)]
    pub fan_in: usize,

    /// Postings encoding: delta-varint or fixed-u32
    #[arg(long, default_value = "delta-varint")]
    pub encoding: String,

    /// Tokenizer: ascii-word or unicode-word
    #[arg(long, default_value = "ascii-word")]
    pub tokenizer: String,

    /// Print the build summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Index directory
    #[arg(long)]
    pub index: PathBuf,

    /// Maximum number of rows printed per query
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Print the evaluation plan before the results
    #[arg(long)]
    pub explain: bool,

    /// Query text; when omitted, queries are read from stdin one per line
    pub query: Option<String>,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Index directory
    #[arg(long)]
    pub index: PathBuf,

    /// Dump the dictionary entry and posting list of this term
    #[arg(long)]
    pub term: Option<String>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build(args) => commands::build::run(args),
        Commands::Query(args) => commands::query::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
    }
}
