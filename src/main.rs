mod analyzer;
mod config;
mod gate;
mod model;
mod normalizer;
mod operator;
mod parser;
mod pipeline;
mod scraper;
mod storage;

use crate::config::{load_config, AppConfig};
use crate::operator::{Operator, StdinOperator};
use crate::pipeline::ScrapeSession;
use crate::scraper::{DealNewsSource, EbaySource, HttpFetcher};
use crate::storage::{reconciler, SqliteStorage};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resell-sniper", about = "Finds deals worth reselling on the marketplace")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Scrape deals, price them on the marketplace and export the batch
    Run,
    /// Mark pursued products as correctly matched and/or feasible
    Review,
    /// Remove rows without a category or marketplace price
    Prune,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let cli = Cli::parse();

    // Load configuration from file
    let config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let mut storage = match SqliteStorage::new(&config.database_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize storage: {:?}", e);
            return;
        }
    };

    let mut operator = StdinOperator;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config, &mut storage, &mut operator).await,
        Command::Review => match reconciler::review_session(&mut storage, &mut operator) {
            Ok(changed) => info!("Successfully saved {} review change(s) to {}", changed, config.database_path),
            Err(e) => error!("Review failed: {}", e),
        },
        Command::Prune => match reconciler::prune_dataset(&mut storage) {
            Ok(pruned) => info!("Pruned {} row(s) from {}", pruned, config.database_path),
            Err(e) => error!("Prune failed: {}", e),
        },
    }
}

/// Full batch: scrape, look up, report, then merge into the dataset.
async fn run(config: &AppConfig, storage: &mut SqliteStorage, operator: &mut dyn Operator) {
    let started = Utc::now();

    let fetcher = match HttpFetcher::new(config.policy.wait_timeout()) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return;
        }
    };
    let session = ScrapeSession::new(
        Box::new(DealNewsSource::new(fetcher.clone())),
        Box::new(EbaySource::new(fetcher, config.marketplace.clone())),
    );

    info!("🚀 Starting run in {:?} mode", config.listing.mode);
    let report = pipeline::run(config, &session, operator).await;
    session.close().await;

    let stats = &report.stats;
    info!(
        "Run finished: {} source(s), {} aborted | {} rows, {} not deals, {} normalized, {} kept | {} error(s)",
        stats.sources,
        stats.sources_aborted,
        stats.rows,
        stats.rejected,
        stats.normalized,
        stats.kept,
        report.ledger.len()
    );

    if !report.ledger.is_empty() {
        match storage.save_errors(started, report.ledger.records()) {
            Ok(()) => {
                if let Ok(counts) = storage.last_run_error_counts() {
                    for (phase, count) in counts {
                        info!("  {} error(s) in {}", count, phase);
                    }
                }
            }
            Err(e) => warn!("Failed to save error ledger: {}", e),
        }
    }

    if config.confirm_export {
        match operator.confirm("Would you like to export the batch?") {
            Ok(true) => {}
            Ok(false) => {
                info!("Export skipped");
                return;
            }
            Err(e) => {
                warn!("Export confirmation failed, skipping export: {}", e);
                return;
            }
        }
    }

    match reconciler::export(storage, report.products) {
        Ok(summary) => info!(
            "Successfully exported to {}: {} added, {} pruned, {} total",
            config.database_path, summary.added, summary.pruned, summary.total
        ),
        Err(e) => error!("Export failed: {}", e),
    }
}
