//! [Fatabyyano](https://fatabyyano.net), Arabic-language fact checks.
//!
//! The verdict is an image whose `alt` text is the Arabic label. Pages whose
//! images carry no known label are not fact checks and yield nothing.

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
    id: "fatabyyano",
    name: "Fatabyyano",
    base_url: "https://fatabyyano.net",
    language: "ara",
};

const VOCABULARY: RatingVocabulary = &[
    ("زائف", False),
    ("زائف جزئياً", Mixture),
    ("صحيح", True),
    ("عنوان مضلل", Other),
    ("غير مؤهل", False),
    ("ساخر", Other),
    ("رأي", Other),
    ("خادع", False),
    ("محتوى ناقص", Mixture),
    ("مضلل", False),
];

/// Label of the "next page" pagination link.
const NEXT_LABEL: &str = "التالي";

static LISTING: Lazy<Selector> = Lazy::new(|| selector("div.w-grid-list > article > div > div > a[href]"));
static PAGE_NUMBERS: Lazy<Selector> = Lazy::new(|| selector("div.nav-links a.page-numbers span"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1.post_title"));
static IMAGES: Lazy<Selector> = Lazy::new(|| selector("img[alt]"));
static DATE: Lazy<Selector> = Lazy::new(|| selector("time.post_date[datetime]"));
static CONTENT: Lazy<Selector> =
    Lazy::new(|| selector(r#"section.l-section.wpb_row.height_small div[itemprop="text"]"#));
static TAGS: Lazy<Selector> = Lazy::new(|| selector(r#"div.post_taxonomy a[rel="tag"]"#));

#[derive(Debug, Clone, Copy, Default)]
pub struct Fatabyyano;

impl SourceExtractor for Fatabyyano {
    fn site(&self) -> &'static SiteInfo {
        &SITE
    }

    fn list_pages(&self) -> Box<dyn Iterator<Item = PageRef> + Send + '_> {
        Box::new(numbered_pages(0, 1, MAX_LISTING_PAGES, |n| {
            Request::get(format!("https://fatabyyano.net/newsface/0/page/{n}/"))
        }))
    }

    fn parse_listing(&self, page: &PageRef, body: &str) -> Listing {
        let doc = Html::parse_document(body);
        let base = Url::parse(SITE.base_url).expect("static url");
        let last_listed = doc
            .select(&PAGE_NUMBERS)
            .map(text)
            .filter(|t| t != NEXT_LABEL)
            .filter_map(|t| t.parse::<u32>().ok())
            .max();
        let last = last_listed.is_some_and(|last| page.page >= last);
        Listing::new(hrefs(&doc, &LISTING, &base)).last(last)
    }

    fn parse_page(&self, url: &str, body: &str) -> Vec<RawRecord> {
        let doc = Html::parse_document(body);
        keep_parsed(&SITE, url, [parse_review(url, &doc)])
    }

    fn rating_vocabulary(&self) -> RatingVocabulary {
        VOCABULARY
    }
}

/// First image `alt` that is a known verdict label.
fn verdict(doc: &Html) -> Option<String> {
    doc.select(&IMAGES)
        .filter_map(|img| img.value().attr("alt"))
        .map(str::trim)
        .find(|alt| VOCABULARY.iter().any(|(label, _)| label == alt))
        .map(str::to_string)
}

fn parse_review(url: &str, doc: &Html) -> Result<RawRecord, ParseError> {
    let claim = first_text(doc, &TITLE).ok_or(ParseError::Missing("post title"))?;
    let rating = verdict(doc).ok_or(ParseError::Missing("verdict image"))?;
    let base = Url::parse(url).map_err(|_| ParseError::Missing("valid url"))?;

    let content = doc.select(&CONTENT).next();
    let record = RawRecord::new(SITE.id, &claim, url)?
        .with_title(Some(claim))
        .with_rating(Some(rating))
        .with_review_author(Some(SITE.name.to_string()))
        .with_date(first_attr(doc, &DATE, "datetime").and_then(|d| parse_date(&d, DateLocale::English)))
        .with_body(content.and_then(body_text))
        .with_links(content.map(|c| links_in(c, &base)).unwrap_or_default())
        .with_tags(doc.select(&TAGS).map(text))
        .with_language(SITE.language);
    Ok(record)
}
