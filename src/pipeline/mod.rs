//! Orchestration of a harvest run.
//!
//! [`Pipeline::run`] drives one crawl per selected site, at most
//! `site_concurrency` at a time. A crawl walks the site's listing pages in
//! order and fetches the review pages of each listing through an ordered
//! window of `prefetch_window` requests, so records leave a site in page
//! order. The run loop merges the crawls and is the only place that looks at
//! records across sites: it drops duplicate `(source, url)` pairs, normalizes
//! ratings, and enforces the global [`Limit`].
//!
//! Stopping is cooperative. Reaching the limit or an external
//! [`StopSignal::stop`] keeps every crawl from starting another fetch; what
//! is already in flight gets `grace_window` to land, then the run returns with
//! whatever it has. Failures never escape a crawl: they end up in the
//! [`RunSummary`].

pub mod job;
pub mod summary;

use async_stream::stream;
use futures::stream::{self, Stream, StreamExt};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, info, instrument, warn};

use crate::config::HarvestConfig;
use crate::extractors::SourceExtractor;
use crate::fetch::{Fetch, FetchOrigin};
use crate::models::{NormalizedRecord, RawRecord};
use crate::normalize::RatingNormalizer;
use crate::utils::truncate_for_log;
use job::{ExtractorJob, ListingFailure};
use summary::{RunSummary, SiteReport};

/// Cap on the number of records a run emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Unlimited,
    Max(usize),
}

impl Limit {
    /// `0` means no limit.
    pub fn from_max_claims(max_claims: usize) -> Self {
        match max_claims {
            0 => Limit::Unlimited,
            n => Limit::Max(n),
        }
    }

    pub fn is_reached(&self, count: usize) -> bool {
        match self {
            Limit::Unlimited => false,
            Limit::Max(max) => count >= *max,
        }
    }
}

/// Shared "no new work" flag. Clones observe the same flag.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`stop`](Self::stop) has been called.
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub limit: Limit,
    pub site_concurrency: usize,
    pub prefetch_window: usize,
    pub grace_window: Duration,
    /// Review URLs that are never fetched.
    pub avoid_urls: HashSet<String>,
}

impl PipelineOptions {
    pub fn from_config(config: &HarvestConfig, limit: Limit) -> Self {
        Self {
            limit,
            site_concurrency: config.site_concurrency.max(1),
            prefetch_window: config.prefetch_window.max(1),
            grace_window: config.grace_window(),
            avoid_urls: config.avoid_urls.iter().cloned().collect(),
        }
    }
}

/// Result of a run: records grouped by site in selection order, page order
/// within a site.
#[derive(Debug)]
pub struct Harvest {
    pub records: Vec<NormalizedRecord>,
    pub summary: RunSummary,
}

enum SiteEvent {
    Record(RawRecord),
    Finished(ExtractorJob),
}

enum ReviewOutcome {
    Parsed(FetchOrigin, Vec<RawRecord>),
    Failed,
    /// Not fetched because the run is stopping.
    Skipped,
}

pub struct Pipeline<'a, F> {
    fetcher: &'a F,
    normalizer: &'a RatingNormalizer,
    options: PipelineOptions,
    stop: StopSignal,
}

impl<'a, F: Fetch> Pipeline<'a, F> {
    pub fn new(fetcher: &'a F, normalizer: &'a RatingNormalizer, options: PipelineOptions) -> Self {
        Self {
            fetcher,
            normalizer,
            options,
            stop: StopSignal::new(),
        }
    }

    /// Handle for stopping the run from outside (Ctrl-C).
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    #[instrument(level = "info", skip_all, fields(sites = extractors.len(), limit = ?self.options.limit))]
    pub async fn run(&self, extractors: &[Box<dyn SourceExtractor>]) -> Harvest {
        let started = std::time::Instant::now();
        let mut merged = pin!(
            stream::iter(extractors.iter().map(|e| self.crawl(e.as_ref()).boxed_local()))
                .flatten_unordered(self.options.site_concurrency)
        );

        let mut records: Vec<NormalizedRecord> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut kept: HashMap<String, usize> = HashMap::new();
        let mut jobs: HashMap<&'static str, ExtractorJob> = HashMap::new();
        let mut summary = RunSummary::default();
        let mut deadline: Option<Instant> = None;

        loop {
            let next = match deadline {
                Some(at) => match timeout_at(at, merged.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!(
                            grace_ms = self.options.grace_window.as_millis(),
                            "Grace window elapsed; dropping in-flight work"
                        );
                        break;
                    }
                },
                None => tokio::select! {
                    biased;
                    next = merged.next() => next,
                    _ = self.stop.stopped() => {
                        info!("Stop requested; draining in-flight work");
                        deadline = Some(Instant::now() + self.options.grace_window);
                        continue;
                    }
                },
            };
            let Some(event) = next else { break };

            match event {
                SiteEvent::Finished(job) => {
                    jobs.insert(job.site(), job);
                }
                SiteEvent::Record(record) => {
                    if !seen.insert((record.source.clone(), record.url.clone())) {
                        debug!(site = %record.source, url = %record.url, "Dropping duplicate record");
                        summary.duplicates_dropped += 1;
                        continue;
                    }
                    if self.options.limit.is_reached(records.len()) {
                        summary.discarded_after_limit += 1;
                        continue;
                    }
                    *kept.entry(record.source.clone()).or_default() += 1;
                    records.push(self.normalizer.normalize_record(record));

                    if self.options.limit.is_reached(records.len()) && !summary.limit_reached {
                        summary.limit_reached = true;
                        info!(records = records.len(), "Record limit reached; stopping all sites");
                        self.stop.stop();
                    }
                }
            }
        }

        let order: HashMap<&str, usize> = extractors
            .iter()
            .enumerate()
            .map(|(i, e)| (e.site().id, i))
            .collect();
        records.sort_by_key(|r| order.get(r.record.source.as_str()).copied().unwrap_or(usize::MAX));

        summary.sites = extractors
            .iter()
            .map(|e| {
                let id = e.site().id;
                let kept = kept.get(id).copied().unwrap_or(0);
                match jobs.remove(id) {
                    Some(job) => job.into_report(kept),
                    None => SiteReport::cancelled(id, kept),
                }
            })
            .collect();
        summary.total_records = records.len();
        summary.elapsed_ms = started.elapsed().as_millis();

        Harvest { records, summary }
    }

    /// Walk one site, yielding its records in page order and finally its job.
    fn crawl<'s>(&'s self, extractor: &'s dyn SourceExtractor) -> impl Stream<Item = SiteEvent> + 's {
        stream! {
            let site = extractor.site();
            let mut job = ExtractorJob::new(site.id);
            info!(site = site.id, "Crawling site");

            for page in extractor.list_pages() {
                if job.series_ended(page.series) {
                    continue;
                }
                if self.stop.is_stopped() {
                    info!(site = site.id, last_page = ?job.cursor(), "Stop requested; no further pages");
                    job.cancel();
                    break;
                }
                job.start_page(&page);

                let body = match self.fetcher.fetch(&page.request).await {
                    Ok(fetched) => {
                        job.listing_fetched(fetched.origin);
                        fetched.body
                    }
                    Err(e) => {
                        match job.listing_failed(&page, &e) {
                            ListingFailure::Site => {
                                error!(site = site.id, url = %page.request.url, error = %e, "First listing page failed; giving up on site");
                                break;
                            }
                            ListingFailure::Series => {
                                info!(site = site.id, series = page.series, page = page.page, error = %e, "Listing series ended");
                            }
                            ListingFailure::Page => {
                                warn!(site = site.id, url = %page.request.url, error = %e, "Skipping listing page");
                            }
                        }
                        continue;
                    }
                };

                let listing = extractor.parse_listing(&page, &body);
                debug!(
                    site = site.id,
                    series = page.series,
                    page = page.page,
                    reviews = listing.reviews.len(),
                    "Parsed listing page"
                );
                if listing.reviews.is_empty() || listing.last_page {
                    job.end_series(page.series);
                }

                let urls: Vec<String> = listing
                    .reviews
                    .into_iter()
                    .unique()
                    .filter(|url| {
                        let avoid = self.options.avoid_urls.contains(url);
                        if avoid {
                            debug!(site = site.id, %url, "Skipping avoided URL");
                        }
                        !avoid
                    })
                    .collect();

                let mut reviews = pin!(
                    stream::iter(urls)
                        .map(|url| self.fetch_review(extractor, url))
                        .buffered(self.options.prefetch_window)
                );
                while let Some(outcome) = reviews.next().await {
                    match outcome {
                        ReviewOutcome::Parsed(origin, records) => {
                            job.review_fetched(origin, records.len());
                            for record in records {
                                yield SiteEvent::Record(record);
                            }
                        }
                        ReviewOutcome::Failed => job.review_failed(),
                        ReviewOutcome::Skipped => job.cancel(),
                    }
                }
            }

            job.finish();
            yield SiteEvent::Finished(job);
        }
    }

    async fn fetch_review(&self, extractor: &dyn SourceExtractor, url: String) -> ReviewOutcome {
        if self.stop.is_stopped() {
            return ReviewOutcome::Skipped;
        }
        let site = extractor.site().id;
        match self.fetcher.fetch(&extractor.review_request(&url)).await {
            Ok(fetched) => {
                let records = extractor.parse_page(&url, &fetched.body);
                if records.is_empty() {
                    debug!(
                        site,
                        %url,
                        preview = %truncate_for_log(&fetched.body, 200),
                        "No records on review page"
                    );
                }
                ReviewOutcome::Parsed(fetched.origin, records)
            }
            Err(e) => {
                warn!(site, %url, error = %e, "Skipping review page");
                ReviewOutcome::Failed
            }
        }
    }
}
