//! [EUfactcheck](https://eufactcheck.eu).
//!
//! Headlines read `"<Verdict>: <claim>"` (older posts use an en dash). Blog
//! posts share the listing with fact checks and are skipped.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::dates::{DateLocale, parse_date};
use super::html::{body_text, first_attr, first_text, hrefs, links_in, selector, text};
use super::{
    Listing, MAX_LISTING_PAGES, PageRef, RatingVocabulary, SiteInfo, SourceExtractor, keep_parsed,
    numbered_pages,
};
use crate::error::ParseError;
use crate::fetch::Request;
use crate::models::{CanonicalRating::*, RawRecord};
use crate::utils::clean_opt;

static SITE: SiteInfo = SiteInfo {
    id: "eufactcheck",
    name: "EUfactcheck",
    base_url: "https://eufactcheck.eu",
    language: "eng",
};

const VOCABULARY: RatingVocabulary = &[
    ("true", True),
    ("mostly true", True),
    ("mostly false", False),
    ("false", False),
    ("uncertain", Other),
];

static LISTING: Lazy<Selector> = Lazy::new(|| selector("a.post-thumbnail-rollover[href]"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| selector("div.page-title-head h1"));
static TIME: Lazy<Selector> = Lazy::new(|| selector("time.entry-date[datetime]"));
static CONTENT: Lazy<Selector> = Lazy::new(|| selector("div.entry-content"));
static AUTHOR: Lazy<Selector> = Lazy::new(|| selector("span.fn"));
static TAGS: Lazy<Selector> = Lazy::new(|| selector("div.entry-tags a"));

#[derive(Debug, Clone, Copy, Default)]
pub struct EuFactCheck;

impl SourceExtractor for EuFactCheck {
    fn site(&self) -> &'static SiteInfo {
        &SITE
    }

    fn list_pages(&self) -> Box<dyn Iterator<Item = PageRef> + Send + '_> {
        Box::new(numbered_pages(0, 1, MAX_LISTING_PAGES, |n| {
            Request::get(format!("https://eufactcheck.eu/page/{n}/"))
        }))
    }

    fn parse_listing(&self, _page: &PageRef, body: &str) -> Listing {
        let doc = Html::parse_document(body);
        let base = Url::parse(SITE.base_url).expect("static url");
        let reviews = hrefs(&doc, &LISTING, &base)
            .into_iter()
            .filter(|u| !u.contains("blogpost"))
            .collect();
        Listing::new(reviews)
    }

    fn parse_page(&self, url: &str, body: &str) -> Vec<RawRecord> {
        let doc = Html::parse_document(body);
        keep_parsed(&SITE, url, [parse_review(url, &doc)])
    }

    fn rating_vocabulary(&self) -> RatingVocabulary {
        VOCABULARY
    }
}

/// Split `"<Verdict>: <claim>"`.
fn split_headline(headline: &str) -> Option<(String, String)> {
    let (rating, claim) = headline
        .split_once(':')
        .or_else(|| headline.split_once(['–', '—']))?;
    Some((clean_opt(rating)?, clean_opt(claim)?))
}

fn parse_review(url: &str, doc: &Html) -> Result<RawRecord, ParseError> {
    let headline = first_text(doc, &HEADLINE).ok_or(ParseError::Missing("headline"))?;
    let (rating, claim) =
        split_headline(&headline).ok_or(ParseError::Missing("verdict prefix in headline"))?;
    let base = Url::parse(url).map_err(|_| ParseError::Missing("valid url"))?;

    let content = doc.select(&CONTENT).next();
    // "Jane Doe, Universiteit Utrecht"
    let author = first_text(doc, &AUTHOR).and_then(|a| a.split(", ").next().and_then(clean_opt));

    let record = RawRecord::new(SITE.id, &claim, url)?
        .with_title(Some(claim))
        .with_rating(Some(rating))
        .with_date(first_attr(doc, &TIME, "datetime").and_then(|d| parse_date(&d, DateLocale::English)))
        .with_review_author(author)
        .with_body(content.and_then(body_text))
        .with_links(content.map(|c| links_in(c, &base)).unwrap_or_default())
        .with_tags(doc.select(&TAGS).map(text))
        .with_language(SITE.language);
    Ok(record)
}
