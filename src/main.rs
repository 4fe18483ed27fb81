//! # Claim Review Harvest
//!
//! Crawls fact-checking sites, extracts their claim reviews, and writes one
//! JSON dataset in which every site's verdict is also reduced to a canonical
//! `TRUE` / `FALSE` / `MIXTURE` / `OTHER` rating.
//!
//! ## Usage
//!
//! ```sh
//! claim_review_harvest -w politifact,snopes --maxclaims 500 -o claims.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: every page goes through a durable cache, so an
//!    interrupted run resumes where it stopped ([`fetch`])
//! 2. **Extraction**: one parser per site turns listing and review pages into
//!    records ([`extractors`])
//! 3. **Normalization**: site labels are mapped to canonical ratings
//!    ([`normalize`])
//! 4. **Orchestration**: sites are crawled concurrently under a global record
//!    limit, then deduplicated and summarized ([`pipeline`])
//! 5. **Output**: records and the run summary are written as JSON
//!    ([`outputs`])

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extractors;
mod fetch;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod utils;

use cli::Cli;
use config::HarvestConfig;
use fetch::cache::FsCacheStore;
use fetch::transport::{ReqwestTransport, RetryTransport};
use fetch::{CachedFetcher, Request};
use normalize::RatingNormalizer;
use outputs::json;
use pipeline::{Limit, Pipeline, PipelineOptions};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if args.list_sites {
        for extractor in extractors::registry() {
            let site = extractor.site();
            println!("{:<16} {:<20} {}", site.id, site.name, site.base_url);
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => HarvestConfig::load(path)?,
        None => HarvestConfig::default(),
    };
    args.apply_to(&mut config);
    config.validate()?;
    info!(cache_dir = %config.cache_dir.display(), "claim_review_harvest starting up");

    // Early check: the cache directory must be writable before any fetch.
    if let Err(e) = ensure_writable_dir(&config.cache_dir).await {
        error!(
            path = %config.cache_dir.display(),
            error = %e,
            "Cache directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let transport = RetryTransport::from_config(ReqwestTransport::new(&config)?, &config);
    let store = Arc::new(FsCacheStore::new(&config.cache_dir));
    debug!(root = %store.root().display(), "Page cache opened");
    let fetcher = CachedFetcher::new(transport, store);

    if let Some(url) = &args.invalidate {
        let removed = fetcher.invalidate(&Request::get(url)).await?;
        if removed {
            info!(%url, "Removed cached page");
        } else {
            warn!(%url, "Nothing cached for this URL");
        }
        return Ok(());
    }

    let sites = extractors::select(&args.websites)?;
    let normalizer = RatingNormalizer::from_registry(&sites);
    let limit = Limit::from_max_claims(args.maxclaims);
    info!(
        sites = ?sites.iter().map(|e| e.site().id).collect::<Vec<_>>(),
        ?limit,
        "Starting harvest"
    );

    let pipeline = Pipeline::new(&fetcher, &normalizer, PipelineOptions::from_config(&config, limit));

    let stop = pipeline.stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing in-flight pages");
            stop.stop();
        }
    });

    let harvest = pipeline.run(&sites).await;
    harvest.summary.log();

    if let Err(e) = json::write_harvest(&harvest, &args.output).await {
        error!(path = %args.output.display(), error = %e, "Failed to write JSON output");
        return Err(e);
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        records = harvest.records.len(),
        "Execution complete"
    );

    Ok(())
}
