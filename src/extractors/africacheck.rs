//! [Africa Check](https://africacheck.org).
//!
//! Reports have changed layout several times. The claim comes from, in order
//! of preference:
//!
//! 1. the schema.org `ClaimReview` blocks (one per claim on newer reports)
//! 2. `p.claim-content` paragraphs paired with `report-verdict` badges
//! 3. the `field--name-field-claims` block
//! 4. the `og:title` of the page
//!
//! and the verdict, when the metadata does not carry it, from the verdict
//! badge, the rating class, the article tags or the name of the share image.
//! Like Full Fact, a report with several claims yields several records; the
//! first keeps the page URL and later ones get a `#claim-N` fragment.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use super::dates::{DateLocale, parse_date};
use super::html::{
    body_text, find_typed, first_text, hrefs, json_ld, json_str, links_in, meta, selector, text,
};
use super::{
    Listing, MAX_LISTING_PAGES, PageRef, RatingVocabulary, SiteInfo, SourceExtractor, keep_parsed,
    numbered_pages,
};
use crate::error::ParseError;
use crate::fetch::Request;
use crate::models::{CanonicalRating::*, RatingScale, RawRecord};
use crate::utils::clean_opt;

static SITE: SiteInfo = SiteInfo {
    id: "africacheck",
    name: "Africa Check",
    base_url: "https://africacheck.org",
    language: "eng",
};

const LISTING_URL: &str = "https://africacheck.org/search?rt_bef_combine=created_DESC&sort_by=created&sort_order=DESC&search_api_fulltext=&sort_bef_combine=created_DESC";

const VOCABULARY: RatingVocabulary = &[
    ("correct", True),
    ("mostly correct", True),
    ("true", True),
    ("partlytrue", Mixture),
    ("partly true", Mixture),
    ("partlyfalse", Mixture),
    ("partly false", Mixture),
    ("misleading", Mixture),
    ("exaggerated", Mixture),
    ("understated", Mixture),
    ("incorrect", False),
    ("false", False),
    ("fake", False),
    ("scam", False),
    ("hoax", False),
    ("unproven", Other),
    ("checked", Other),
    ("satire", Other),
];

/// Labels recognised in tags and image names. A label precedes every label
/// it contains ("Incorrect" before "Correct").
const BADGE_LABELS: [&str; 16] = [
    "Mostly Correct",
    "Partlyfalse",
    "Partlytrue",
    "Understated",
    "Exaggerated",
    "Misleading",
    "Incorrect",
    "Unproven",
    "Checked",
    "Correct",
    "Satire",
    "False",
    "True",
    "Fake",
    "Scam",
    "Hoax",
];

static CARD_CONTENT: Lazy<Selector> = Lazy::new(|| selector("div.node__content"));
static ANCHORS: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static AUTHOR: Lazy<Selector> = Lazy::new(|| selector("div.author-details a[href] h4"));
static AUTHOR_LINK: Lazy<Selector> = Lazy::new(|| selector("div.author-details a[href]"));
static CLAIM_PARAGRAPHS: Lazy<Selector> = Lazy::new(|| selector("p.claim-content"));
static VERDICT_BADGES: Lazy<Selector> = Lazy::new(|| selector("div.report-verdict.indicator span"));
static CLAIM_FIELD: Lazy<Selector> = Lazy::new(|| selector("div.field--name-field-claims"));
static RATING_CLASS: Lazy<Selector> = Lazy::new(|| selector("div.article-details__verdict div.rating"));
static ARTICLE_TAGS: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="article:tag"]"#));

#[derive(Debug, Clone, Copy, Default)]
pub struct AfricaCheck;

impl SourceExtractor for AfricaCheck {
    fn site(&self) -> &'static SiteInfo {
        &SITE
    }

    fn list_pages(&self) -> Box<dyn Iterator<Item = PageRef> + Send + '_> {
        // Drupal pagers count from zero.
        Box::new(numbered_pages(0, 0, MAX_LISTING_PAGES, |n| {
            Request::get(format!("{LISTING_URL}&page={n}"))
        }))
    }

    fn parse_listing(&self, _page: &PageRef, body: &str) -> Listing {
        let doc = Html::parse_document(body);
        let base = Url::parse(SITE.base_url).expect("static url");
        let mut reviews: Vec<String> = Vec::new();
        for card in doc.select(&CARD_CONTENT) {
            let Some(href) = card.select(&ANCHORS).find_map(|a| a.value().attr("href")) else {
                continue;
            };
            let Ok(link) = base.join(href.trim()) else {
                continue;
            };
            if link.host_str().is_some_and(|h| h.ends_with("africacheck.org"))
                && !reviews.contains(&link.to_string())
            {
                reviews.push(link.to_string());
            }
        }
        Listing::new(reviews)
    }

    fn parse_page(&self, url: &str, body: &str) -> Vec<RawRecord> {
        let doc = Html::parse_document(body);
        match parse_reviews(url, &doc) {
            Ok(items) => keep_parsed(&SITE, url, items),
            Err(e) => keep_parsed(&SITE, url, [Err(e)]),
        }
    }

    fn rating_vocabulary(&self) -> RatingVocabulary {
        VOCABULARY
    }
}

/// One claim found on a report, before page metadata is attached.
#[derive(Debug, Default)]
struct Verdict {
    claim: String,
    rating: Option<String>,
    scale: RatingScale,
}

fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn from_metadata(blocks: &[Value]) -> Vec<Verdict> {
    find_typed(blocks, "ClaimReview")
        .into_iter()
        .filter_map(|review| {
            Some(Verdict {
                claim: json_str(review, &["claimReviewed"])?,
                rating: json_str(review, &["reviewRating", "alternateName"]).map(|r| title_case(&r)),
                scale: RatingScale {
                    value: json_str(review, &["reviewRating", "ratingValue"]),
                    best: json_str(review, &["reviewRating", "bestRating"]),
                    worst: json_str(review, &["reviewRating", "worstRating"]),
                },
            })
        })
        .collect()
}

fn from_markup(doc: &Html) -> Vec<Verdict> {
    let paragraphs: Vec<String> = doc
        .select(&CLAIM_PARAGRAPHS)
        .map(text)
        .filter(|c| !c.is_empty())
        .collect();
    if !paragraphs.is_empty() {
        let badges: Vec<String> = doc.select(&VERDICT_BADGES).map(|b| title_case(&text(b))).collect();
        return paragraphs
            .into_iter()
            .enumerate()
            .map(|(i, claim)| Verdict {
                claim,
                rating: badges.get(i).cloned().filter(|b| !b.is_empty()),
                ..Verdict::default()
            })
            .collect();
    }
    first_text(doc, &CLAIM_FIELD)
        .or_else(|| og_title(doc))
        .map(|claim| Verdict {
            claim,
            ..Verdict::default()
        })
        .into_iter()
        .collect()
}

/// Page-wide verdict for layouts that show a single one.
fn page_verdict(doc: &Html) -> Option<String> {
    let from_class = doc.select(&RATING_CLASS).next().and_then(|el| {
        el.value()
            .classes()
            .find_map(|c| c.strip_prefix("rating--"))
            .and_then(|r| clean_opt(&r.replace('-', " ")))
            .map(|r| title_case(&r))
    });
    let badge_in = |haystack: &str| {
        let upper = haystack.to_uppercase();
        BADGE_LABELS
            .iter()
            .find(|label| upper.contains(&label.to_uppercase()))
            .map(|label| label.to_string())
    };
    from_class
        .or_else(|| {
            doc.select(&ARTICLE_TAGS)
                .filter_map(|m| m.value().attr("content"))
                .find_map(badge_in)
        })
        .or_else(|| {
            meta(doc, "og:image").and_then(|image| image.rsplit('/').next().and_then(badge_in))
        })
}

/// `og:title` without the site prefix ("Africa Check | Claim").
fn og_title(doc: &Html) -> Option<String> {
    meta(doc, "og:title").and_then(|t| t.rsplit('|').next().and_then(clean_opt))
}

fn parse_reviews(url: &str, doc: &Html) -> Result<Vec<Result<RawRecord, ParseError>>, ParseError> {
    let base = Url::parse(url).map_err(|_| ParseError::Missing("valid url"))?;
    let blocks = json_ld(doc);

    let mut verdicts = from_metadata(&blocks);
    if verdicts.is_empty() {
        verdicts = from_markup(doc);
    }
    if verdicts.is_empty() {
        return Err(ParseError::Missing("claim"));
    }
    if verdicts.iter().all(|v| v.rating.is_none()) {
        if let (Some(rating), Some(first)) = (page_verdict(doc), verdicts.first_mut()) {
            first.rating = Some(rating);
        }
    }

    let date = find_typed(&blocks, "NewsArticle")
        .into_iter()
        .find_map(|a| json_str(a, &["datePublished"]))
        .and_then(|d| parse_date(d.split(' ').next().unwrap_or_default(), DateLocale::English));
    let content = doc.select(&CARD_CONTENT).next();
    let body = content.and_then(body_text);
    let links = content.map(|c| links_in(c, &base)).unwrap_or_default();
    let tags: Vec<String> = doc
        .select(&ARTICLE_TAGS)
        .filter_map(|m| m.value().attr("content"))
        .filter_map(clean_opt)
        .collect();
    let title = og_title(doc);
    let author = first_text(doc, &AUTHOR);
    let author_url = hrefs(doc, &AUTHOR_LINK, &base).into_iter().next();

    Ok(verdicts
        .into_iter()
        .enumerate()
        .map(|(i, verdict)| {
            let record_url = if i == 0 {
                url.to_string()
            } else {
                format!("{}#claim-{}", url.trim_end_matches('#'), i + 1)
            };
            Ok(RawRecord::new(SITE.id, verdict.claim, record_url)?
                .with_rating(verdict.rating)
                .with_rating_scale(verdict.scale)
                .with_title(title.clone())
                .with_review_author(author.clone())
                .with_review_author_url(author_url.clone())
                .with_date(date)
                .with_body(body.clone())
                .with_links(links.iter().cloned())
                .with_tags(&tags)
                .with_language(SITE.language))
        })
        .collect())
}
