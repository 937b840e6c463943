//! # Image Harvest CLI (`harvest`)
//!
//! ## Usage
//!
//! ```bash
//! harvest --config ./harvest.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `harvest run` | Search, download, dedupe and save new images |
//! | `harvest search <query>` | Print candidate image URLs without downloading |
//! | `harvest fetch <url>` | Download one URL through the dedupe ledger |
//! | `harvest ledger` | Show the ledger location and size |
//!
//! The Serper API key is read from the environment variable named by
//! `search.api_key_env` (default `SERPER_KEY`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use image_harvest::config::{self, Config};
use image_harvest::credentials::EnvCredentials;
use image_harvest::download::HttpFetcher;
use image_harvest::harvest::{self, Harvester};
use image_harvest::ledger::HashLedger;
use image_harvest::models::CandidateOutcome;
use image_harvest::progress::ProgressMode;
use image_harvest::search::{ImageSearch, SerperSearch};

/// Image Harvest — search-driven image downloader that never saves the same
/// content twice.
#[derive(Parser)]
#[command(
    name = "harvest",
    about = "Search-driven image downloader with content-hash deduplication",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./harvest.toml`. A missing file means built-in defaults.
    #[arg(long, global = true, default_value = "./harvest.toml")]
    config: PathBuf,

    /// Progress output on stderr. Defaults to `human` on a terminal, `off` otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, download, dedupe and save new images.
    ///
    /// Stops once `max_new` new images are saved or the candidates run out.
    Run {
        /// Search query (overrides `harvest.query`).
        #[arg(long)]
        query: Option<String>,

        /// Number of new images to save (overrides `harvest.max_new`).
        #[arg(long)]
        max_new: Option<usize>,

        /// Pause after each save in milliseconds (overrides `harvest.delay_ms`).
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Output directory (overrides `paths.output_dir`).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Ledger file (overrides `paths.ledger`).
        #[arg(long)]
        ledger: Option<PathBuf>,
    },

    /// Print candidate image URLs for a query, one per line.
    Search {
        query: String,

        /// Number of results to request.
        #[arg(long, default_value_t = 10)]
        num: usize,
    },

    /// Download a single image URL, skipping it if the content was saved before.
    Fetch { url: String },

    /// Show the ledger path and number of known fingerprints.
    Ledger,
}

fn search_stage(cfg: &Config) -> anyhow::Result<SerperSearch> {
    let credentials = EnvCredentials::new(cfg.search.api_key_env.clone());
    Ok(SerperSearch::new(&cfg.search, Box::new(credentials))?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load_config(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
    let progress_mode = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);

    match cli.command {
        Commands::Run {
            query,
            max_new,
            delay_ms,
            output_dir,
            ledger,
        } => {
            if let Some(query) = query {
                cfg.harvest.query = query;
            }
            if let Some(max_new) = max_new {
                cfg.harvest.max_new = max_new;
            }
            if let Some(delay_ms) = delay_ms {
                cfg.harvest.delay_ms = delay_ms;
            }
            if let Some(output_dir) = output_dir {
                cfg.paths.output_dir = output_dir;
            }
            if let Some(ledger) = ledger {
                cfg.paths.ledger = ledger;
            }

            let search = search_stage(&cfg)?;
            let fetcher = HttpFetcher::new(&cfg.download)?;
            let reporter = progress_mode.reporter();

            let summary = Harvester::new(&cfg, &search, &fetcher)
                .with_progress(reporter.as_ref())
                .run()
                .await?;

            println!("harvest '{}'", cfg.harvest.query);
            println!("  loaded: {} known hashes", summary.known_before);
            println!("  candidates: {}", summary.candidates);
            println!("  considered: {}", summary.considered);
            println!("  duplicates: {}", summary.duplicates);
            println!("  skipped: {}", summary.skipped);
            println!(
                "  saved: {} new images into {}",
                summary.saved,
                cfg.paths.output_dir.display()
            );
            for path in &summary.saved_paths {
                println!("    {}", path.display());
            }
            println!("ok");
        }
        Commands::Search { query, num } => {
            let search = search_stage(&cfg)?;
            let candidates = search.search(&query, num).await?;
            for candidate in &candidates {
                println!("{}", candidate.url);
            }
            eprintln!("{} candidate URLs", candidates.len());
        }
        Commands::Fetch { url } => {
            let fetcher = HttpFetcher::new(&cfg.download)?;
            match harvest::fetch_one(&cfg, &fetcher, &url).await? {
                CandidateOutcome::Saved(path) => println!("saved {}", path),
                CandidateOutcome::Duplicate => println!("duplicate: content already saved"),
                CandidateOutcome::Skipped(reason) => {
                    anyhow::bail!("could not download {}: {}", url, reason)
                }
            }
        }
        Commands::Ledger => {
            let ledger = HashLedger::load(&cfg.paths.ledger)?;
            println!("ledger: {}", ledger.path().display());
            println!("  entries: {}", ledger.len());
        }
    }

    Ok(())
}
