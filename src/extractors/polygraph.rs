//! [Polygraph.info](https://www.polygraph.info).
//!
//! The headline doubles as the claim text. The verdict is the second span of
//! the `verdict` box, and the person who made the claim is the `h4.author`
//! block above the article.

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

static SITE: SiteInfo = SiteInfo {
    id: "polygraph",
    name: "Polygraph.info",
    base_url: "https://www.polygraph.info",
    language: "eng",
};

const VOCABULARY: RatingVocabulary = &[
    ("true", True),
    ("likely true", True),
    ("false", False),
    ("misleading", Mixture),
    ("partially false", Mixture),
    ("partially true", Mixture),
    ("unclear", Other),
    ("uncertain", Other),
    ("unsubstantiated", Other),
];

static LISTING: Lazy<Selector> = Lazy::new(|| selector("a.title[href]"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1.title.pg-title"));
static TIME: Lazy<Selector> = Lazy::new(|| selector("time[datetime]"));
static BODY: Lazy<Selector> = Lazy::new(|| selector("div#article-content"));
static VERDICT: Lazy<Selector> = Lazy::new(|| selector("div.verdict span"));
static CLAIMER: Lazy<Selector> = Lazy::new(|| selector("h4.author"));
static REVIEWER: Lazy<Selector> = Lazy::new(|| selector("a.links__item-link"));

#[derive(Debug, Clone, Copy, Default)]
pub struct Polygraph;

impl SourceExtractor for Polygraph {
    fn site(&self) -> &'static SiteInfo {
        &SITE
    }

    fn list_pages(&self) -> Box<dyn Iterator<Item = PageRef> + Send + '_> {
        Box::new(numbered_pages(0, 0, MAX_LISTING_PAGES, |n| {
            Request::get(format!("https://www.polygraph.info/z/7205?p={n}"))
        }))
    }

    fn parse_listing(&self, _page: &PageRef, body: &str) -> Listing {
        let doc = Html::parse_document(body);
        let base = Url::parse(SITE.base_url).expect("static url");
        Listing::new(hrefs(&doc, &LISTING, &base))
    }

    fn parse_page(&self, url: &str, body: &str) -> Vec<RawRecord> {
        let doc = Html::parse_document(body);
        keep_parsed(&SITE, url, [parse_review(url, &doc)])
    }

    fn rating_vocabulary(&self) -> RatingVocabulary {
        VOCABULARY
    }
}

fn parse_review(url: &str, doc: &Html) -> Result<RawRecord, ParseError> {
    let title = first_text(doc, &TITLE)
        .map(|t| t.replace(';', ","))
        .ok_or(ParseError::Missing("headline"))?;
    let base = Url::parse(url).map_err(|_| ParseError::Missing("valid url"))?;

    let rating = doc.select(&VERDICT).nth(1).map(text);
    let body = doc.select(&BODY).next();

    let record = RawRecord::new(SITE.id, &title, url)?
        .with_title(Some(title))
        .with_rating(rating)
        .with_date(first_attr(doc, &TIME, "datetime").and_then(|d| parse_date(&d, DateLocale::English)))
        .with_claim_author(first_text(doc, &CLAIMER))
        .with_review_author(first_text(doc, &REVIEWER))
        .with_body(body.and_then(body_text))
        .with_links(body.map(|b| links_in(b, &base)).unwrap_or_default())
        .with_language(SITE.language);
    Ok(record)
}
