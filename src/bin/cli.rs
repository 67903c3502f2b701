//! wikirace CLI
//!
//! Look up titles and articles in a local or remote index.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use wikirace::{PathTransformer, StoreConfig, WikiData, WikiError};

/// wikirace CLI
#[derive(Parser, Debug)]
#[command(name = "wikirace-cli")]
#[command(about = "Query a wikirace title index")]
#[command(version)]
struct Args {
    /// Index directory, or r2://bucket/prefix (credentials from R2_* env vars)
    #[arg(short, long)]
    index: String,

    /// Base directory for relative shard locations
    #[arg(long)]
    shard_root: Option<PathBuf>,

    /// Rewrite `..` to `.` in stored locations
    #[arg(long)]
    collapse_parent_dirs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show where a title is stored
    Locate {
        /// Article title (case fallbacks apply)
        title: String,
    },

    /// Print an article
    Page {
        /// Article title (case fallbacks apply)
        title: String,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,

        /// Print only the outgoing links
        #[arg(long)]
        links_only: bool,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wikirace=debug"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_not_found() => {
            tracing::error!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), WikiError> {
    let mut config = StoreConfig::from_env(args.index);
    config.shard_root = args.shard_root;
    if args.collapse_parent_dirs {
        config.path_transformer = PathTransformer::collapse_parent_dirs();
    }

    let store = WikiData::open(config)?;
    let result = execute(&store, args.command);
    store.close()?;
    result
}

fn execute(store: &WikiData, command: Commands) -> Result<(), WikiError> {
    match command {
        Commands::Locate { title } => {
            let resolution = store.locate(&title)?;
            println!("{}\t{}", resolution.matched_title, resolution.location);
        }

        Commands::Page {
            title,
            json,
            links_only,
        } => {
            let page = store.get_page(&title)?;
            if json {
                let out = serde_json::to_string_pretty(&page)
                    .map_err(|e| WikiError::Runtime(format!("cannot encode page: {}", e)))?;
                println!("{}", out);
            } else if links_only {
                for link in &page.links {
                    println!("{}", link);
                }
            } else {
                println!("{}", page.title);
                println!("{}", page.url);
                println!();
                println!("{}", page.content);
                println!();
                println!("{} links", page.links.len());
            }
        }
    }
    Ok(())
}
