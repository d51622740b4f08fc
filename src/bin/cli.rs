//! Polite Crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use polite_crawler::{
    error::Result,
    models::{Config, CrawlSummary},
    pipeline,
};

/// Polite Crawler - priority-aware, per-host throttled web crawler
#[derive(Parser, Debug)]
#[command(
    name = "polite-crawler",
    version,
    about = "Priority-aware web crawler that stays polite to every host"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "crawler.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl from the configured (or given) seed URLs
    Crawl {
        /// Seed URL, one per worker; replaces the configured seeds
        #[arg(long = "seed")]
        seeds: Vec<String>,

        /// Number of workers (default: one per seed)
        #[arg(long)]
        workers: Option<usize>,

        /// Total page quota
        #[arg(long)]
        max_pages: Option<usize>,

        /// Print pages and summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging from the verbosity flag or the configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_summary(summary: &CrawlSummary) {
    println!();
    println!("Pages crawled:     {}", summary.pages_crawled());
    println!("Unique URLs seen:  {}", summary.unique_urls_seen);
    println!("Hosts owned:       {}", summary.hosts_owned);
    println!("Left in frontiers: {}", summary.frontier_left());
    for worker in &summary.workers {
        println!(
            "  {}: {} pages, {} hosts contacted, {} queued",
            worker.worker, worker.pages_crawled, worker.hosts_contacted, worker.frontier_left
        );
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_exists = cli.config.exists();
    let mut config = if config_exists {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    init_logging(cli.verbose, &config.logging.level);

    if config_exists {
        log::info!("Loaded configuration from {}", cli.config.display());
    } else {
        log::info!(
            "No configuration at {}; using defaults",
            cli.config.display()
        );
    }

    match cli.command {
        Command::Crawl {
            seeds,
            workers,
            max_pages,
            json,
        } => {
            if !seeds.is_empty() {
                config.crawl.workers = seeds.len();
                config.crawl.seeds = seeds;
            }
            if let Some(workers) = workers {
                config.crawl.workers = workers;
            }
            if let Some(max_pages) = max_pages {
                config.crawl.max_pages = max_pages;
            }

            let summary = pipeline::run_crawler(&config, |page| {
                if json {
                    println!("{}", serde_json::to_string(&page)?);
                } else {
                    println!("{} {}", page.status, page.url);
                }
                Ok(())
            })
            .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }

        Command::Validate => {
            pipeline::run_validate(&cli.config)?;
        }
    }

    Ok(())
}
