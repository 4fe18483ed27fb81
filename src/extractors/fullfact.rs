//! [Full Fact](https://fullfact.org).
//!
//! Full Fact is crawled through several topic listings, one series each. A
//! review page can check several claims: every `card-body-text` row with a
//! claim paragraph and a conclusion paragraph becomes its own record. The
//! first record keeps the page URL, later ones get a `#claim-N` fragment so
//! `(source, url)` stays unique per claim.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::dates::{DateLocale, parse_date};
use super::html::{absolutize, first_text_in, links_in, selector, text};
use super::{
    Listing, MAX_LISTING_PAGES, PageRef, RatingVocabulary, SiteInfo, SourceExtractor, keep_parsed,
    numbered_pages,
};
use crate::error::ParseError;
use crate::fetch::Request;
use crate::models::{CanonicalRating::*, RawRecord};
use crate::utils::clean_opt;

static SITE: SiteInfo = SiteInfo {
    id: "fullfact",
    name: "Full Fact",
    base_url: "https://fullfact.org",
    language: "eng",
};

/// Listing sections, in crawl order.
const SECTIONS: [&str; 7] = [
    "https://fullfact.org/latest/",
    "https://fullfact.org/health/all/",
    "https://fullfact.org/economy/all/",
    "https://fullfact.org/europe/all/",
    "https://fullfact.org/crime/all/",
    "https://fullfact.org/law/all/",
    "https://fullfact.org/education/all/",
];

const VOCABULARY: RatingVocabulary = &[
    ("correct", True),
    ("this is correct", True),
    ("accurate", True),
    ("right", True),
    ("incorrect", False),
    ("this is incorrect", False),
    ("wrong", False),
    ("false", False),
    ("inaccurate", False),
    ("untrue", False),
    ("misleading", Mixture),
    ("this is misleading", Mixture),
    ("not quite", Mixture),
    ("partly correct", Mixture),
    ("broadly correct", Mixture),
    ("unclear", Other),
    ("uncertain", Other),
    ("no evidence", Other),
    ("unsupported", Other),
];

static CARDS: Lazy<Selector> = Lazy::new(|| selector("div.card"));
static ANCHORS: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static ARTICLE: Lazy<Selector> = Lazy::new(|| selector("article"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1"));
static CLAIM_ROWS: Lazy<Selector> = Lazy::new(|| selector("div.row.no-gutters.card-body-text"));
static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| selector("p"));
static PUBLISHED: Lazy<Selector> = Lazy::new(|| selector("div.published-at"));
static CITES: Lazy<Selector> = Lazy::new(|| selector("section.social-media cite"));
static BREADCRUMBS: Lazy<Selector> = Lazy::new(|| selector("nav.breadcrumbs"));
static RELATED: Lazy<Selector> = Lazy::new(|| selector("section.related-factchecks"));

#[derive(Debug, Clone, Copy, Default)]
pub struct FullFact;

impl SourceExtractor for FullFact {
    fn site(&self) -> &'static SiteInfo {
        &SITE
    }

    fn list_pages(&self) -> Box<dyn Iterator<Item = PageRef> + Send + '_> {
        Box::new(SECTIONS.iter().enumerate().flat_map(|(series, base)| {
            numbered_pages(series as u16, 1, MAX_LISTING_PAGES, move |n| {
                Request::get(format!("{base}?page={n}"))
            })
        }))
    }

    fn parse_listing(&self, _page: &PageRef, body: &str) -> Listing {
        let doc = Html::parse_document(body);
        let base = Url::parse(SITE.base_url).expect("static url");
        let mut reviews: Vec<String> = Vec::new();
        for card in doc.select(&CARDS) {
            let link = card
                .select(&ANCHORS)
                .filter_map(|a| a.value().attr("href"))
                .find_map(|h| absolutize(&base, h));
            if let Some(link) = link {
                if !reviews.contains(&link) {
                    reviews.push(link);
                }
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

/// Shared metadata of a review page.
struct PageMeta {
    title: Option<String>,
    author: Option<String>,
    date: Option<chrono::NaiveDate>,
    body: Option<String>,
    links: Vec<String>,
    tags: Vec<String>,
}

fn page_meta(article: ElementRef<'_>, doc: &Html, base: &Url) -> PageMeta {
    // "12 March 2024 | Jane Smith"
    let published = first_text_in(article, &PUBLISHED);
    let (date_part, author_part) = match published.as_deref().and_then(|p| p.split_once('|')) {
        Some((d, a)) => (Some(d.to_string()), clean_opt(a)),
        None => (published.clone(), None),
    };
    let cited: Vec<String> = article.select(&CITES).map(text).filter(|c| !c.is_empty()).collect();
    let author = if cited.is_empty() {
        author_part
    } else {
        Some(cited.join(", "))
    };

    let body = clean_opt(
        &article
            .select(&PARAGRAPHS)
            .map(text)
            .collect::<Vec<_>>()
            .join("\n"),
    );

    let mut links: Vec<String> = links_in(article, base)
        .into_iter()
        .filter(|l| !l.contains("facebook.com/sharer") && !l.contains("twitter.com/intent/tweet"))
        .collect();
    if let Some(related) = doc.select(&RELATED).next() {
        links.extend(links_in(related, base));
    }

    let tags = doc
        .select(&BREADCRUMBS)
        .next()
        .map(|nav| {
            text(nav)
                .split('/')
                .filter_map(clean_opt)
                .filter(|c| !c.eq_ignore_ascii_case("home"))
                .collect()
        })
        .unwrap_or_default();

    PageMeta {
        title: first_text_in(article, &TITLE),
        author,
        date: date_part.and_then(|d| parse_date(&d, DateLocale::English)),
        body,
        links,
        tags,
    }
}

fn parse_reviews(url: &str, doc: &Html) -> Result<Vec<Result<RawRecord, ParseError>>, ParseError> {
    let article = doc.select(&ARTICLE).next().ok_or(ParseError::Missing("article"))?;
    let base = Url::parse(url).map_err(|_| ParseError::Missing("valid url"))?;

    let rows: Vec<Result<(String, String), ParseError>> = article
        .select(&CLAIM_ROWS)
        .map(|row| {
            let ps: Vec<String> = row.select(&PARAGRAPHS).map(text).collect();
            match ps.as_slice() {
                [claim, conclusion] => Ok((claim.clone(), conclusion.clone())),
                _ => Err(ParseError::Missing("claim/conclusion pair")),
            }
        })
        .collect();
    if !rows.iter().any(Result::is_ok) {
        return Err(ParseError::Missing("claim and conclusion row"));
    }

    let meta = page_meta(article, doc, &base);
    let mut claim_no = 0;
    Ok(rows
        .into_iter()
        .map(|row| {
            let (claim, conclusion) = row?;
            claim_no += 1;
            let record_url = if claim_no == 1 {
                url.to_string()
            } else {
                format!("{}#claim-{}", url.trim_end_matches('#'), claim_no)
            };
            Ok(RawRecord::new(SITE.id, claim, record_url)?
                .with_rating(Some(conclusion))
                .with_title(meta.title.clone())
                .with_review_author(meta.author.clone())
                .with_date(meta.date)
                .with_body(meta.body.clone())
                .with_links(meta.links.iter().cloned())
                .with_tags(&meta.tags)
                .with_language(SITE.language))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const REVIEW_PAGE: &str = r#"
        <html><body>
          <nav class="breadcrumbs">Home / Health / Vaccines</nav>
          <article>
            <h1>Claims about NHS waiting lists</h1>
            <div class="published-at">12 March 2024 | Grace Rahman</div>
            <div class="row no-gutters card-body-text"><div><p>Last winter, 10,000 patients waited on trolleys.</p></div><div><p>Incorrect. The figure was lower.</p></div></div>
            <div class="row no-gutters card-body-text"><div><p>Waiting lists doubled since 2010.</p></div><div><p>Correct.</p></div></div>
            <div class="row no-gutters card-body-text"><p>A row without a conclusion.</p></div>
            <p>NHS England <a href="https://www.england.nhs.uk/statistics/">publishes</a> the data.</p>
            <a href="https://www.facebook.com/sharer/sharer.php?u=x">Share</a>
          </article>
          <section class="related-factchecks"><a href="/health/other-check/">Other</a></section>
        </body></html>"#;

    #[test]
    fn test_sections_are_separate_series() {
        let pages: Vec<PageRef> = FullFact.list_pages().collect();
        assert_eq!(pages.len(), SECTIONS.len() * MAX_LISTING_PAGES as usize);
        assert_eq!(pages[0].request.url, "https://fullfact.org/latest/?page=1");
        assert_eq!(pages[0].series, 0);
        let health = &pages[MAX_LISTING_PAGES as usize];
        assert_eq!(health.series, 1);
        assert_eq!(health.request.url, "https://fullfact.org/health/all/?page=1");
    }

    #[test]
    fn test_listing_cards() {
        let page = FullFact.list_pages().next().unwrap();
        let listing = FullFact.parse_listing(
            &page,
            r#"<div class="card"><a href="/health/nhs-waiting/">NHS</a><a href="/health/">Health</a></div>
               <div class="card"><a href="https://fullfact.org/economy/tax/">Tax</a></div>"#,
        );
        assert_eq!(
            listing.reviews,
            vec![
                "https://fullfact.org/health/nhs-waiting/",
                "https://fullfact.org/economy/tax/",
            ]
        );
    }

    #[test]
    fn test_multi_claim_page() {
        let url = "https://fullfact.org/health/nhs-waiting/";
        let records = FullFact.parse_page(url, REVIEW_PAGE);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].url, url);
        assert_eq!(records[0].claim, "Last winter, 10,000 patients waited on trolleys.");
        assert_eq!(records[0].rating.as_deref(), Some("Incorrect"));
        assert_eq!(records[1].url, "https://fullfact.org/health/nhs-waiting/#claim-2");
        assert_eq!(records[1].rating.as_deref(), Some("Correct"));

        for r in &records {
            assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 12));
            assert_eq!(r.review_author.as_deref(), Some("Grace Rahman"));
            assert_eq!(r.title.as_deref(), Some("Claims about NHS waiting lists"));
            assert!(r.tags.contains("Vaccines"));
            assert!(!r.tags.contains("Home"));
            assert_eq!(
                r.referred_links,
                vec![
                    "https://www.england.nhs.uk/statistics/",
                    "https://fullfact.org/health/other-check/",
                ]
            );
        }
    }

    #[test]
    fn test_incomplete_row_is_reported_not_numbered() {
        let url = "https://fullfact.org/health/nhs-waiting/";
        let page = REVIEW_PAGE.replacen(
            r#"<div class="row no-gutters card-body-text"><div><p>Waiting"#,
            r#"<div class="row no-gutters card-body-text"><p>Orphan claim.</p></div>
            <div class="row no-gutters card-body-text"><div><p>Waiting"#,
            1,
        );
        let items = parse_reviews(url, &Html::parse_document(&page)).unwrap();
        assert_eq!(items.len(), 4);
        assert!(matches!(items[1], Err(ParseError::Missing("claim/conclusion pair"))));
        assert!(matches!(items[3], Err(ParseError::Missing("claim/conclusion pair"))));
        let second = items[2].as_ref().unwrap();
        assert_eq!(second.claim, "Waiting lists doubled since 2010.");
        assert_eq!(second.url, format!("{url}#claim-2"));
    }

    #[test]
    fn test_page_without_claim_rows_yields_nothing() {
        let records = FullFact.parse_page(
            "https://fullfact.org/blog/x/",
            "<html><body><article><h1>Blog</h1><p>Text</p></article></body></html>",
        );
        assert!(records.is_empty());
    }
}
