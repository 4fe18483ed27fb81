//! Per-run outcome report.

use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// How a site's crawl ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SiteStatus {
    /// Ran out of listing pages without a single failure.
    Completed,
    /// Ran out of listing pages, some pages could not be fetched.
    Partial,
    /// Could not start (first listing page unreachable).
    Failed { reason: String },
    /// Stopped by the record limit or an external stop.
    Cancelled,
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteStatus::Completed => f.write_str("completed"),
            SiteStatus::Partial => f.write_str("partial"),
            SiteStatus::Failed { reason } => write!(f, "failed: {reason}"),
            SiteStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteReport {
    pub site: String,
    pub status: SiteStatus,
    /// Records kept in the output.
    pub records: usize,
    /// Records the extractor produced, before deduplication and the limit.
    pub extracted: usize,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub reviews_fetched: usize,
    pub reviews_failed: usize,
    /// Fetches answered from the cache.
    pub from_cache: usize,
}

impl SiteReport {
    /// Report for a site whose crawl never reported back before the run
    /// ended.
    pub fn cancelled(site: &str, records: usize) -> Self {
        Self {
            site: site.to_string(),
            status: SiteStatus::Cancelled,
            records,
            extracted: records,
            pages_fetched: 0,
            pages_failed: 0,
            reviews_fetched: 0,
            reviews_failed: 0,
            from_cache: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub sites: Vec<SiteReport>,
    pub total_records: usize,
    pub duplicates_dropped: usize,
    /// Records that arrived after the limit was reached.
    pub discarded_after_limit: usize,
    pub limit_reached: bool,
    pub elapsed_ms: u128,
}

impl RunSummary {
    pub fn site(&self, id: &str) -> Option<&SiteReport> {
        self.sites.iter().find(|s| s.site == id)
    }

    pub fn failed_sites(&self) -> impl Iterator<Item = &SiteReport> {
        self.sites
            .iter()
            .filter(|s| matches!(s.status, SiteStatus::Failed { .. }))
    }

    /// One log line per site, then the totals.
    pub fn log(&self) {
        for s in &self.sites {
            match s.status {
                SiteStatus::Failed { .. } | SiteStatus::Partial => warn!(
                    site = %s.site,
                    status = %s.status,
                    records = s.records,
                    pages_failed = s.pages_failed,
                    reviews_failed = s.reviews_failed,
                    "Site finished with failures"
                ),
                _ => info!(
                    site = %s.site,
                    status = %s.status,
                    records = s.records,
                    from_cache = s.from_cache,
                    "Site finished"
                ),
            }
        }
        info!(
            total_records = self.total_records,
            failed_sites = self.failed_sites().count(),
            duplicates_dropped = self.duplicates_dropped,
            discarded_after_limit = self.discarded_after_limit,
            limit_reached = self.limit_reached,
            elapsed_ms = self.elapsed_ms,
            "Run summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_with_reason() {
        let failed = SiteStatus::Failed {
            reason: "connection reset".into(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"], "connection reset");
        assert_eq!(serde_json::to_value(SiteStatus::Partial).unwrap()["state"], "partial");
    }

    #[test]
    fn test_failed_sites_filter() {
        let mut gamma = SiteReport::cancelled("gamma", 0);
        gamma.status = SiteStatus::Failed {
            reason: "404".into(),
        };
        let summary = RunSummary {
            sites: vec![SiteReport::cancelled("alpha", 3), gamma],
            ..RunSummary::default()
        };
        let failed: Vec<&str> = summary.failed_sites().map(|s| s.site.as_str()).collect();
        assert_eq!(failed, vec!["gamma"]);
        assert_eq!(summary.site("alpha").map(|s| s.records), Some(3));
    }
}
