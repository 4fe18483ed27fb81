//! Crawl state of one site for one run.

use std::collections::HashSet;

use super::summary::{SiteReport, SiteStatus};
use crate::error::FetchError;
use crate::extractors::PageRef;
use crate::fetch::FetchOrigin;

/// Consecutive listing failures that end a series.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
enum JobState {
    Running,
    Completed,
    Failed(String),
    Cancelled,
}

/// What a failed listing page means for the crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFailure {
    /// Skip the page and keep going.
    Page,
    /// The series is over.
    Series,
    /// The site's very first listing page failed; the job is over.
    Site,
}

#[derive(Debug)]
pub struct ExtractorJob {
    site: &'static str,
    /// Last listing page requested, as `(series, page)`.
    cursor: Option<(u16, u32)>,
    extracted: usize,
    pages_fetched: usize,
    pages_failed: usize,
    reviews_fetched: usize,
    reviews_failed: usize,
    from_cache: usize,
    consecutive_failures: u32,
    ended_series: HashSet<u16>,
    state: JobState,
}

impl ExtractorJob {
    pub fn new(site: &'static str) -> Self {
        Self {
            site,
            cursor: None,
            extracted: 0,
            pages_fetched: 0,
            pages_failed: 0,
            reviews_fetched: 0,
            reviews_failed: 0,
            from_cache: 0,
            consecutive_failures: 0,
            ended_series: HashSet::new(),
            state: JobState::Running,
        }
    }

    pub fn site(&self) -> &'static str {
        self.site
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    pub fn cursor(&self) -> Option<(u16, u32)> {
        self.cursor
    }

    pub fn series_ended(&self, series: u16) -> bool {
        self.ended_series.contains(&series)
    }

    pub fn end_series(&mut self, series: u16) {
        self.ended_series.insert(series);
        self.consecutive_failures = 0;
    }

    pub fn start_page(&mut self, page: &PageRef) {
        self.cursor = Some((page.series, page.page));
    }

    pub fn listing_fetched(&mut self, origin: FetchOrigin) {
        self.pages_fetched += 1;
        self.consecutive_failures = 0;
        self.count_origin(origin);
    }

    /// Record a failed listing page and decide how the crawl continues.
    ///
    /// A 404 once the site has served listing pages is how most sites say a
    /// series is over; it ends the series without counting as a failure.
    pub fn listing_failed(&mut self, page: &PageRef, error: &FetchError) -> ListingFailure {
        if self.pages_fetched > 0 && error.status() == Some(404) {
            self.end_series(page.series);
            return ListingFailure::Series;
        }
        self.pages_failed += 1;
        if self.pages_fetched == 0 && self.pages_failed == 1 {
            self.state = JobState::Failed(error.to_string());
            return ListingFailure::Site;
        }
        self.consecutive_failures += 1;
        if !error.is_transient() || self.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
            self.end_series(page.series);
            return ListingFailure::Series;
        }
        ListingFailure::Page
    }

    pub fn review_fetched(&mut self, origin: FetchOrigin, records: usize) {
        self.reviews_fetched += 1;
        self.extracted += records;
        self.count_origin(origin);
    }

    pub fn review_failed(&mut self) {
        self.reviews_failed += 1;
    }

    fn count_origin(&mut self, origin: FetchOrigin) {
        if origin == FetchOrigin::Cache {
            self.from_cache += 1;
        }
    }

    /// Stop before the site ran out of pages.
    pub fn cancel(&mut self) {
        if self.is_running() {
            self.state = JobState::Cancelled;
        }
    }

    /// The site ran out of pages.
    pub fn finish(&mut self) {
        if self.is_running() {
            self.state = JobState::Completed;
        }
    }

    /// Final report. `records` is what the run kept after deduplication and
    /// the global limit.
    pub fn into_report(self, records: usize) -> SiteReport {
        let failures = self.pages_failed + self.reviews_failed;
        let status = match self.state {
            JobState::Failed(reason) => SiteStatus::Failed { reason },
            JobState::Running | JobState::Cancelled => SiteStatus::Cancelled,
            JobState::Completed if failures > 0 => SiteStatus::Partial,
            JobState::Completed => SiteStatus::Completed,
        };
        SiteReport {
            site: self.site.to_string(),
            status,
            records,
            extracted: self.extracted,
            pages_fetched: self.pages_fetched,
            pages_failed: self.pages_failed,
            reviews_fetched: self.reviews_fetched,
            reviews_failed: self.reviews_failed,
            from_cache: self.from_cache,
        }
    }
}
