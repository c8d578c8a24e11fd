//! # ADbS Memory CLI (`adbs-memory`)
//!
//! Thin command-line front end over the [`adbs_memory`] library.
//!
//! ## Usage
//!
//! ```bash
//! adbs-memory [--config <toml>] [--db <store>] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `adbs-memory init` | Create or upgrade the store |
//! | `adbs-memory index <path>` | Index a file or directory tree |
//! | `adbs-memory sync <path>` | Remove documents whose files are gone |
//! | `adbs-memory query "<text>"` | Semantic search with keyword fallback |
//! | `adbs-memory stats` | Store statistics |
//!
//! Set `ADBS_DEBUG=1` to log at debug level and print full error chains.

use adbs_memory::config;
use adbs_memory::engine::Engine;
use adbs_memory::format;
use adbs_memory::progress::ProgressMode;
use adbs_memory::vector::VectorIndex;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment toggle for verbose logging and full error detail.
const DEBUG_ENV: &str = "ADBS_DEBUG";

/// ADbS Memory: incrementally index a directory tree and query it by
/// meaning or by keyword.
#[derive(Parser)]
#[command(
    name = "adbs-memory",
    about = "ADbS Memory: a local, file-backed knowledge store with keyword and semantic search",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `.adbs/config.toml` when that file exists; otherwise
    /// built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store file. Overrides `[store].path` from the config.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Skip the embedding model and run keyword-only.
    #[arg(long, global = true)]
    no_embeddings: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the store file and schema.
    ///
    /// Idempotent: running it against an existing store upgrades the
    /// schema in place without touching indexed data.
    Init,

    /// Index a file or a directory tree.
    ///
    /// Only files whose content changed since the last run are rewritten.
    Index {
        /// File or directory to index.
        path: PathBuf,

        /// Progress output on stderr. Defaults to `human` on a terminal.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Remove documents whose files no longer exist.
    Sync {
        /// Root of the indexed tree.
        path: PathBuf,
    },

    /// Search indexed content.
    ///
    /// Uses semantic search when an embedding model is available and
    /// falls back to keyword search when it finds nothing.
    Query {
        /// The search text.
        text: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,

        /// Print results as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show document, chunk and vector counts.
    Stats,
}

fn main() -> ExitCode {
    let debug = std::env::var_os(DEBUG_ENV).is_some();
    init_logging(debug);

    let cli = Cli::parse();

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(run(cli)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if debug {
                eprintln!("Error: {:?}", err);
            } else {
                eprintln!("Error: {}", err);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut cfg = config::load_or_default(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        cfg.store.path = db;
    }
    if cli.no_embeddings {
        cfg.embedding.enabled = false;
    }
    cfg.resolve_store_path(&std::env::current_dir()?);

    match cli.command {
        Commands::Init => {
            let engine = Engine::open(cfg).await?;
            println!(
                "Store initialized at {}",
                engine.config().store.path.display()
            );
            engine.close().await;
        }
        Commands::Index { path, progress } => {
            let engine = Engine::open(cfg).await?;
            let reporter = progress
                .unwrap_or_else(ProgressMode::default_for_tty)
                .reporter();
            let report = engine.index(&path, reporter.as_ref()).await?;
            println!("Indexing complete. Updated {} documents.", report.updated);
            engine.close().await;
        }
        Commands::Sync { path } => {
            // Pruning never embeds, so skip the model probe.
            let engine = Engine::open_with(cfg, VectorIndex::Absent).await?;
            let report = engine.sync(&path).await?;
            if report.is_in_sync() {
                println!("DB is in sync with filesystem.");
            } else {
                println!("Pruned {} ghost files.", report.pruned);
            }
            engine.close().await;
        }
        Commands::Query { text, limit, json } => {
            let engine = Engine::open(cfg).await?;
            let limit = limit.unwrap_or(engine.config().retrieval.default_limit);
            let results = engine.query(&text, limit).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No results.");
            } else {
                println!("{}", format::to_text(&results)?);
            }
            engine.close().await;
        }
        Commands::Stats => {
            let engine = Engine::open(cfg).await?;
            let stats = engine.stats().await?;
            println!("{}", format::to_text(&stats)?);
            engine.close().await;
        }
    }

    Ok(())
}
