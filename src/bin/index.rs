//! wikirace Index Builder
//!
//! Builds a title index directory from a `{"title": "location"}` JSON file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use wikirace::index::{build_from_json, BulkOptions, TitleIndex, DEFAULT_BATCH_SIZE};

/// wikirace Index Builder
#[derive(Parser, Debug)]
#[command(name = "wikirace-index")]
#[command(about = "Build a title → shard-location index from a JSON mapping")]
#[command(version)]
struct Args {
    /// JSON object mapping titles to shard locations
    #[arg(short, long)]
    input: PathBuf,

    /// Index directory to create (replaced if it exists)
    #[arg(short, long)]
    output: PathBuf,

    /// Entries buffered in memory per sorted run
    #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Print this many entries from the finished index
    #[arg(short, long, default_value = "5")]
    sample: usize,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wikirace=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    tracing::info!("wikirace index builder v{}", wikirace::VERSION);
    tracing::info!("Input: {}", args.input.display());
    tracing::info!("Output: {}", args.output.display());

    let options = BulkOptions {
        batch_size: args.batch_size,
        ..BulkOptions::default()
    };

    let report = match build_from_json(&args.input, &args.output, &options) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Index build failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        entries = report.summary.entry_count,
        source_entries = report.source_entries,
        runs = report.runs,
        bytes = report.summary.file_size,
        "Index built"
    );

    let index = match TitleIndex::open(&args.output) {
        Ok(index) => index,
        Err(e) => {
            tracing::error!("Failed to reopen index: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("{} entries in {}", index.entry_count(), args.output.display());
    for (title, location) in index.iter().take(args.sample) {
        println!(
            "  {} -> {}",
            String::from_utf8_lossy(title),
            String::from_utf8_lossy(location)
        );
    }

    ExitCode::SUCCESS
}
