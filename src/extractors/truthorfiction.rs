//! [TruthOrFiction](https://www.truthorfiction.com).
//!
//! Recent reviews have explicit claim and rating blocks. Older ones only
//! encode both in the headline, `"<claim> - <rating>!"`, which is split on the
//! last dash.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::dates::{DateLocale, parse_date};
use super::html::{
    absolutize, body_text_excluding, first_text, json_ld, json_str, links_in, meta, selector,
};
use super::{
    Listing, MAX_LISTING_PAGES, PageRef, RatingVocabulary, SiteInfo, SourceExtractor, keep_parsed,
    numbered_pages,
};
use crate::error::ParseError;
use crate::fetch::Request;
use crate::models::{CanonicalRating::*, RawRecord};
use crate::utils::clean_opt;

static SITE: SiteInfo = SiteInfo {
    id: "truthorfiction",
    name: "TruthOrFiction",
    base_url: "https://www.truthorfiction.com",
    language: "eng",
};

const VOCABULARY: RatingVocabulary = &[
    ("truth", True),
    ("true", True),
    ("correct attribution", True),
    ("fiction", False),
    ("not true", False),
    ("false", False),
    ("incorrect attribution", False),
    ("misattributed", False),
    ("mixed", Mixture),
    ("truth and fiction", Mixture),
    ("partly true", Mixture),
    ("decontextualized", Mixture),
    ("unproven", Other),
    ("unknown", Other),
    ("reported as fiction", Other),
    ("satire", Other),
    ("commentary", Other),
    ("opinion", Other),
];

static ARTICLES: Lazy<Selector> = Lazy::new(|| selector("article.post"));
static ANCHORS: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static CLAIM: Lazy<Selector> = Lazy::new(|| selector("div.claim-description"));
static RATING: Lazy<Selector> = Lazy::new(|| selector("div.rating-description"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| selector("main#main h1"));
static MAIN: Lazy<Selector> = Lazy::new(|| selector("main#main"));
static TAGS: Lazy<Selector> = Lazy::new(|| selector("span.tags-links a, span.cat-links a"));

#[derive(Debug, Clone, Copy, Default)]
pub struct TruthOrFiction;

impl SourceExtractor for TruthOrFiction {
    fn site(&self) -> &'static SiteInfo {
        &SITE
    }

    fn list_pages(&self) -> Box<dyn Iterator<Item = PageRef> + Send + '_> {
        Box::new(numbered_pages(0, 1, MAX_LISTING_PAGES, |n| {
            Request::get(format!(
                "https://www.truthorfiction.com/category/fact-checks/page/{n}"
            ))
        }))
    }

    fn parse_listing(&self, _page: &PageRef, body: &str) -> Listing {
        let doc = Html::parse_document(body);
        let base = Url::parse(SITE.base_url).expect("static url");
        // Cards link to their category too; the first anchor is the permalink.
        let mut reviews: Vec<String> = Vec::new();
        for article in doc.select(&ARTICLES) {
            let permalink = article
                .select(&ANCHORS)
                .filter_map(|a| a.value().attr("href"))
                .find_map(|h| absolutize(&base, h));
            if let Some(link) = permalink {
                if !reviews.contains(&link) {
                    reviews.push(link);
                }
            }
        }
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

/// Split `"<claim> - <rating>!"` on the last dash.
fn split_headline(headline: &str) -> Option<(String, String)> {
    let normalized = headline.replace(['–', '—'], "-");
    let (claim, rating) = normalized.rsplit_once('-')?;
    let claim = clean_opt(claim)?;
    let rating = clean_opt(&rating.replace('!', ""))?;
    Some((claim, rating))
}

fn parse_review(url: &str, doc: &Html) -> Result<RawRecord, ParseError> {
    let headline = first_text(doc, &HEADLINE).and_then(|h| split_headline(&h));
    let claim = first_text(doc, &CLAIM)
        .or_else(|| headline.as_ref().map(|(c, _)| c.clone()))
        .ok_or(ParseError::Missing("claim"))?;
    let rating = first_text(doc, &RATING).or_else(|| headline.map(|(_, r)| r));
    let base = Url::parse(url).map_err(|_| ParseError::Missing("valid url"))?;

    let metadata = json_ld(doc);
    let item_reviewed = metadata
        .iter()
        .find_map(|v| v.get("@graph").and_then(|g| g.get(0)))
        .and_then(|n| n.get("itemReviewed"));

    let main = doc.select(&MAIN).next();
    let record = RawRecord::new(SITE.id, claim, url)?
        .with_rating(rating)
        .with_title(meta(doc, "og:title"))
        .with_review_author(meta(doc, "author"))
        .with_date(
            meta(doc, "article:published_time").and_then(|d| parse_date(&d, DateLocale::English)),
        )
        .with_claim_author(item_reviewed.and_then(|i| json_str(i, &["author", "name"])))
        .with_claim_date(
            item_reviewed
                .and_then(|i| json_str(i, &["datePublished"]))
                .and_then(|d| parse_date(&d, DateLocale::English)),
        )
        .with_body(main.and_then(|m| body_text_excluding(m, &["ezoic-ad", "entry-meta"])))
        .with_links(main.map(|m| links_in(m, &base)).unwrap_or_default())
        .with_tags(doc.select(&TAGS).map(super::html::text))
        .with_language(SITE.language);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const LISTING_PAGE: &str = r#"
        <article class="post"><a href="https://www.truthorfiction.com/eggs-10-dollars/"><img></a>
          <h2><a href="https://www.truthorfiction.com/eggs-10-dollars/">Eggs</a></h2>
          <a href="https://www.truthorfiction.com/category/fact-checks/">Fact Checks</a></article>
        <article class="post"><a href="/marines-white-house/">Marines</a></article>"#;

    const CURRENT_PAGE: &str = r#"
        <html><head>
          <meta property="og:title" content="Eggs Cost $10 a Dozen in 2023?">
          <meta name="author" content="Kim LaCapria">
          <meta property="article:published_time" content="2023-01-11T18:20:00+00:00">
          <script type="application/ld+json">{"@graph":[{"@type":"ClaimReview","itemReviewed":{"author":{"name":"Reddit user"},"datePublished":"2023-01-09"}}]}</script>
        </head><body><main id="main">
          <h1>Eggs Cost $10 a Dozen in 2023?</h1>
          <div class="entry-meta">Posted by Kim</div>
          <div class="claim-description">Someone dreamed eggs cost $10 a dozen in 2023.</div>
          <div class="rating-description">Decontextualized</div>
          <p>Prices did rise, per <a href="https://bls.gov/cpi">BLS</a>.</p>
          <span class="cat-links"><a href="/c/">Fact Checks</a></span>
          <span class="tags-links"><a href="/t/">eggs</a><a href="/t2/">inflation</a></span>
        </main></body></html>"#;

    const LEGACY_PAGE: &str = r#"
        <html><body><main id="main">
          <h1>13,000 Marines Applied for White House Detail – Fiction!</h1>
          <p>An email claims this.</p>
        </main></body></html>"#;

    #[test]
    fn test_listing_takes_one_link_per_article() {
        let page = TruthOrFiction.list_pages().next().unwrap();
        let listing = TruthOrFiction.parse_listing(&page, LISTING_PAGE);
        assert_eq!(
            listing.reviews,
            vec![
                "https://www.truthorfiction.com/eggs-10-dollars/",
                "https://www.truthorfiction.com/marines-white-house/",
            ]
        );
    }

    #[test]
    fn test_current_layout() {
        let url = "https://www.truthorfiction.com/eggs-10-dollars/";
        let r = TruthOrFiction.parse_page(url, CURRENT_PAGE).remove(0);
        assert_eq!(r.claim, "Someone dreamed eggs cost $10 a dozen in 2023.");
        assert_eq!(r.rating.as_deref(), Some("Decontextualized"));
        assert_eq!(r.review_author.as_deref(), Some("Kim LaCapria"));
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2023, 1, 11));
        assert_eq!(r.claim_author.as_deref(), Some("Reddit user"));
        assert_eq!(r.claim_date, NaiveDate::from_ymd_opt(2023, 1, 9));
        assert_eq!(r.referred_links[0], "https://bls.gov/cpi");
        assert!(r.tags.contains("inflation"));
        assert!(r.tags.contains("Fact Checks"));
        assert!(!r.body.as_deref().unwrap().contains("Posted by"));
    }

    #[test]
    fn test_legacy_headline_split() {
        let url = "https://www.truthorfiction.com/marines-white-house/";
        let r = TruthOrFiction.parse_page(url, LEGACY_PAGE).remove(0);
        assert_eq!(r.claim, "13,000 Marines Applied for White House Detail");
        assert_eq!(r.rating.as_deref(), Some("Fiction"));
        assert_eq!(r.date, None);
    }

    #[test]
    fn test_headline_without_dash_is_not_split() {
        assert_eq!(split_headline("No dash here"), None);
    }
}
