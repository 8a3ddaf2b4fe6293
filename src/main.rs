//! Asura Crow main entry point
//!
//! This is the command-line interface for the Asura Crow crawler.

use asura_crow::config::{load_config_with_hash, validate_http_url, Config};
use asura_crow::crawler::Coordinator;
use asura_crow::output::print_report;
use asura_crow::storage::{open_store_or_log, seeds_from_store, SqliteUrlStore, UrlStore};
use clap::Parser;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Asura Crow: a concurrent web crawler
///
/// Asura Crow crawls outward from a set of seed URLs, extracts the visible text of every
/// page, and posts it to an indexing service.
#[derive(Parser, Debug)]
#[command(name = "asura-crow")]
#[command(version)]
#[command(about = "A concurrent web crawler feeding an indexing service", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Additional seed URL (may be repeated)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Repeat the crawl every SECS seconds instead of running once
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    every: Option<u64>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "every")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    for seed in &cli.seeds {
        validate_http_url("seed URL", seed)?;
    }

    if cli.dry_run {
        return handle_dry_run(&config, &cli.seeds);
    }

    // An unavailable store degrades to configured seeds only
    let store = open_store_or_log(Path::new(&config.store.database_path))
        .map(|store| Arc::new(Mutex::new(store)));

    let mut coordinator = Coordinator::from_config(&config)?;
    if let Some(store) = &store {
        coordinator = coordinator.with_store(store.clone());
    }

    match cli.every {
        None => handle_crawl(&coordinator, &config, &cli.seeds, store.as_ref()).await,
        Some(secs) => {
            let mut interval = tokio::time::interval(Duration::from_secs(secs));
            loop {
                interval.tick().await;
                if let Err(e) =
                    handle_crawl(&coordinator, &config, &cli.seeds, store.as_ref()).await
                {
                    tracing::error!("Crawl failed: {:#}", e);
                }
            }
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("asura_crow=info,warn"),
            1 => EnvFilter::new("asura_crow=debug,info"),
            2 => EnvFilter::new("asura_crow=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Merges configured, command-line and stored seeds, keeping the first occurrence
fn collect_seeds(
    config: &Config,
    extra: &[String],
    store: Option<&dyn UrlStore>,
) -> Vec<String> {
    let stored = store.map(seeds_from_store).unwrap_or_default();

    let mut seen = HashSet::new();
    config
        .store
        .seeds
        .iter()
        .chain(extra)
        .cloned()
        .chain(stored)
        .filter(|seed| seen.insert(seed.clone()))
        .collect()
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, extra_seeds: &[String]) -> anyhow::Result<()> {
    println!("=== Asura Crow Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Queue capacity: {}", config.crawler.queue_capacity);
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!(
        "  Connect timeout: {}s",
        config.crawler.connect_timeout_secs
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nIndexer:");
    println!("  Endpoint: {}", config.indexer.endpoint);

    println!("\nStore:");
    println!("  Database: {}", config.store.database_path);

    // Read stored seeds without creating the database
    let database = Path::new(&config.store.database_path);
    let store = if database.exists() {
        open_store_or_log(database)
    } else {
        None
    };
    let stored = collect_seeds(
        config,
        extra_seeds,
        store.as_ref().map(|s| s as &dyn UrlStore),
    );

    println!("\nSeeds ({}):", stored.len());
    for seed in &stored {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    if stored.is_empty() {
        println!("✗ No seed URLs; a crawl would not start");
    } else {
        println!("✓ Would start crawling with {} seed URLs", stored.len());
    }

    Ok(())
}

/// Handles one crawl run
async fn handle_crawl(
    coordinator: &Coordinator,
    config: &Config,
    extra_seeds: &[String],
    store: Option<&Arc<Mutex<SqliteUrlStore>>>,
) -> anyhow::Result<()> {
    let seeds = match store {
        Some(store) => {
            let store = store.lock().unwrap_or_else(PoisonError::into_inner);
            collect_seeds(config, extra_seeds, Some(&*store))
        }
        None => collect_seeds(config, extra_seeds, None),
    };
    tracing::info!("Total seed URLs: {}", seeds.len());

    let report = match coordinator.run(seeds).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    print_report(&report);

    if report.is_success() {
        tracing::info!("Crawl completed successfully");
    } else {
        tracing::warn!(
            "Crawl completed with {} failed URLs",
            report.failure_count()
        );
    }

    Ok(())
}
