//! [Snopes](https://www.snopes.com) fact checks.
//!
//! Current pages carry the claim and verdict in dedicated blocks
//! (`div.claim_cont`, `div.rating_title_wrap`). Older archive pages only have
//! "Claim:" and "Status:" paragraphs inside the article, which are used as a
//! fallback. Tags live in the inline `window.snopes_config` script.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::dates::{DateLocale, parse_date};
use super::html::{body_text, first_text, hrefs, links_in, selector, text};
use super::{
    Listing, MAX_LISTING_PAGES, PageRef, RatingVocabulary, SiteInfo, SourceExtractor, keep_parsed,
    numbered_pages,
};
use crate::error::ParseError;
use crate::fetch::Request;
use crate::models::{CanonicalRating::*, RawRecord};
use crate::utils::clean_opt;

static SITE: SiteInfo = SiteInfo {
    id: "snopes",
    name: "Snopes",
    base_url: "https://www.snopes.com",
    language: "eng",
};

const VOCABULARY: RatingVocabulary = &[
    ("true", True),
    ("mostly true", True),
    ("correct attribution", True),
    ("legit", True),
    ("mixture", Mixture),
    ("mostly false", False),
    ("false", False),
    ("misattributed", False),
    ("miscaptioned", False),
    ("scam", False),
    ("fake", False),
    ("unproven", Other),
    ("unfounded", Other),
    ("outdated", Other),
    ("legend", Other),
    ("labeled satire", Other),
    ("originated as satire", Other),
    ("research in progress", Other),
    ("lost legend", Other),
];

static LISTING: Lazy<Selector> = Lazy::new(|| selector("a.outer_article_link_wrapper[href]"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("section.title-container h1"));
static AUTHOR: Lazy<Selector> = Lazy::new(|| selector("h3.author_name"));
static PUBLISHED: Lazy<Selector> = Lazy::new(|| selector("h3.publish_date"));
static CLAIM: Lazy<Selector> = Lazy::new(|| selector("div.claim_cont"));
static RATING: Lazy<Selector> = Lazy::new(|| selector("div.rating_title_wrap"));
static ARTICLE: Lazy<Selector> = Lazy::new(|| selector("article#article-content"));
static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| selector("p"));
static SCRIPTS: Lazy<Selector> = Lazy::new(|| selector("script"));

static CONFIG_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["']?(categories|tags)["']?\s*:\s*\[([^\]]*)\]"#).expect("static regex")
});
static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("static regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct Snopes;

impl SourceExtractor for Snopes {
    fn site(&self) -> &'static SiteInfo {
        &SITE
    }

    fn list_pages(&self) -> Box<dyn Iterator<Item = PageRef> + Send + '_> {
        Box::new(numbered_pages(0, 1, MAX_LISTING_PAGES, |n| {
            Request::get(format!("https://www.snopes.com/fact-check/?pagenum={n}"))
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

/// Text of the first article paragraph starting with `label`, label removed.
fn labelled_paragraph(doc: &Html, label: &str) -> Option<String> {
    let article = doc.select(&ARTICLE).next()?;
    article.select(&PARAGRAPHS).find_map(|p| {
        let t = text(p);
        t.strip_prefix(label).and_then(clean_opt)
    })
}

fn config_tags(doc: &Html) -> Vec<String> {
    let Some(script) = doc
        .select(&SCRIPTS)
        .map(|s| s.text().collect::<String>())
        .find(|s| s.contains("window.snopes_config"))
    else {
        return Vec::new();
    };
    CONFIG_LIST
        .captures_iter(&script)
        .flat_map(|c| {
            QUOTED
                .captures_iter(c.get(2).map_or("", |m| m.as_str()))
                .map(|q| q[1].to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

fn parse_review(url: &str, doc: &Html) -> Result<RawRecord, ParseError> {
    let claim = first_text(doc, &CLAIM)
        .or_else(|| labelled_paragraph(doc, "Claim:"))
        .ok_or(ParseError::Missing("claim"))?;
    let base = Url::parse(url).map_err(|_| ParseError::Missing("valid url"))?;

    let rating = first_text(doc, &RATING)
        .map(|r| r.replace("About this rating", ""))
        .and_then(|r| clean_opt(&r))
        .or_else(|| labelled_paragraph(doc, "Status:"));

    let date = first_text(doc, &PUBLISHED).and_then(|d| {
        let d = d.strip_prefix("Published").unwrap_or(&d);
        parse_date(d, DateLocale::English)
    });

    let article = doc.select(&ARTICLE).next();
    let record = RawRecord::new(SITE.id, claim, url)?
        .with_rating(rating)
        .with_title(first_text(doc, &TITLE))
        .with_review_author(first_text(doc, &AUTHOR))
        .with_date(date)
        .with_body(article.and_then(body_text))
        .with_links(article.map(|a| links_in(a, &base)).unwrap_or_default())
        .with_tags(config_tags(doc))
        .with_language(SITE.language);
    Ok(record)
}
