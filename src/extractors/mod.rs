//! Per-site claim-review extractors.
//!
//! Every fact-checking site is one implementation of [`SourceExtractor`]. An
//! extractor is a stateless parser: it knows how a site paginates, which
//! markup holds the claim, the verdict and the metadata, and what the site's
//! verdict labels mean. It never fetches anything itself; the pipeline fetches
//! the requests it describes and hands the bodies back.
//!
//! Crawling a site is a two-level walk:
//!
//! 1. [`SourceExtractor::list_pages`] yields listing pages, grouped in numbered
//!    *series* (one per listing section of the site)
//! 2. [`SourceExtractor::parse_listing`] turns a listing page into review URLs
//! 3. [`SourceExtractor::parse_page`] turns a review page into records
//!
//! # Supported Sources
//!
//! | Id | Module | Language | Notes |
//! |----|--------|----------|-------|
//! | `politifact` | [`politifact`] | eng | Verdict from the rating image |
//! | `snopes` | [`snopes`] | eng | |
//! | `checkyourfact` | [`checkyourfact`] | eng | Verdict inside the body text |
//! | `truthorfiction` | [`truthorfiction`] | eng | |
//! | `fullfact` | [`fullfact`] | eng | Several claims per page, several sections |
//! | `africacheck` | [`africacheck`] | eng | Several claims per page, several layouts |
//! | `afp` / `afp-fr` | [`afp`] | eng / fra | schema.org ClaimReview metadata |
//! | `polygraph` | [`polygraph`] | eng | |
//! | `eufactcheck` | [`eufactcheck`] | eng | Verdict prefixed to the title |
//! | `fatabyyano` | [`fatabyyano`] | ara | |
//! | `vishvasnews` | [`vishvasnews`] | many | POST pagination, per-record language |
//!
//! Adding a site means adding a module and one line to [`registry`]; nothing
//! in the pipeline changes.

pub mod afp;
pub mod africacheck;
pub mod checkyourfact;
pub mod dates;
pub mod eufactcheck;
pub mod fatabyyano;
pub mod fullfact;
pub mod html;
pub mod politifact;
pub mod polygraph;
pub mod snopes;
pub mod truthorfiction;
pub mod vishvasnews;

use std::collections::HashSet;
use tracing::warn;

use crate::error::{ParseError, SelectionError};
use crate::fetch::Request;
use crate::models::{CanonicalRating, RawRecord};

/// Static identity of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteInfo {
    /// Registry key, also written to every record's `source` field.
    pub id: &'static str,
    pub name: &'static str,
    pub base_url: &'static str,
    /// ISO 639-3 code of the site's default language.
    pub language: &'static str,
}

/// One listing page to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub request: Request,
    /// Listing section the page belongs to. Pages of a series are yielded in
    /// order and a series ends as a whole.
    pub series: u16,
    pub page: u32,
}

/// Review URLs found on one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub reviews: Vec<String>,
    /// The site says there is nothing after this page.
    pub last_page: bool,
}

impl Listing {
    pub fn new(reviews: Vec<String>) -> Self {
        Self {
            reviews,
            last_page: false,
        }
    }

    pub fn last(mut self, last_page: bool) -> Self {
        self.last_page = last_page;
        self
    }
}

pub type RatingVocabulary = &'static [(&'static str, CanonicalRating)];

/// Contract every site extractor implements.
pub trait SourceExtractor: Send + Sync {
    fn site(&self) -> &'static SiteInfo;

    /// Listing pages in crawl order. The iterator is lazy and finite; the
    /// pipeline stops pulling a series as soon as it runs out of reviews.
    fn list_pages(&self) -> Box<dyn Iterator<Item = PageRef> + Send + '_>;

    fn parse_listing(&self, page: &PageRef, body: &str) -> Listing;

    fn review_request(&self, url: &str) -> Request {
        Request::get(url)
    }

    /// Parse one review page. Items that cannot be parsed are logged and
    /// skipped; an empty vector means nothing usable was on the page.
    fn parse_page(&self, url: &str, body: &str) -> Vec<RawRecord>;

    /// Published verdict labels and what they mean.
    fn rating_vocabulary(&self) -> RatingVocabulary;
}

/// Upper bound on listing pages per series.
pub const MAX_LISTING_PAGES: u32 = 1_000;

/// Numbered listing pages `first..first + count` of one series.
pub fn numbered_pages<F>(series: u16, first: u32, count: u32, make: F) -> impl Iterator<Item = PageRef> + Send
where
    F: Fn(u32) -> Request + Send,
{
    (first..first.saturating_add(count)).map(move |page| PageRef {
        request: make(page),
        series,
        page,
    })
}

/// Collect per-item parse results, logging and dropping the failures.
pub fn keep_parsed<I>(site: &SiteInfo, url: &str, items: I) -> Vec<RawRecord>
where
    I: IntoIterator<Item = Result<RawRecord, ParseError>>,
{
    items
        .into_iter()
        .filter_map(|item| match item {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(site = site.id, %url, error = %e, "Skipping unparseable item");
                None
            }
        })
        .collect()
}

/// All extractors, in a fixed order.
pub fn registry() -> Vec<Box<dyn SourceExtractor>> {
    vec![
        Box::new(politifact::Politifact),
        Box::new(snopes::Snopes),
        Box::new(checkyourfact::CheckYourFact),
        Box::new(truthorfiction::TruthOrFiction),
        Box::new(fullfact::FullFact),
        Box::new(africacheck::AfricaCheck),
        Box::new(afp::Afp::english()),
        Box::new(afp::Afp::french()),
        Box::new(polygraph::Polygraph),
        Box::new(eufactcheck::EuFactCheck),
        Box::new(fatabyyano::Fatabyyano),
        Box::new(vishvasnews::VishvasNews),
    ]
}

/// Resolve site ids against the registry. An empty selection means every
/// site. Unknown ids are reported all at once.
pub fn select(ids: &[String]) -> Result<Vec<Box<dyn SourceExtractor>>, SelectionError> {
    let all = registry();
    if ids.is_empty() {
        return Ok(all);
    }
    let known: HashSet<&str> = all.iter().map(|e| e.site().id).collect();
    let wanted: Vec<String> = ids
        .iter()
        .map(|id| id.trim().to_ascii_lowercase())
        .filter(|id| !id.is_empty())
        .collect();
    let mut unknown: Vec<String> = wanted
        .iter()
        .filter(|id| !known.contains(id.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        unknown.dedup();
        return Err(SelectionError::UnknownSites(unknown));
    }
    Ok(all
        .into_iter()
        .filter(|e| wanted.iter().any(|id| id == e.site().id))
        .collect())
}
