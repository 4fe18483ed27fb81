//! [Check Your Fact](https://checkyourfact.com).
//!
//! The claim is the first paragraph of the article body and the verdict is a
//! "Verdict: X" line inside it. Claimer, claim date and keywords come from
//! the page's schema.org metadata.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::dates::{DateLocale, parse_date};
use super::html::{
    body_text, first_attr, first_text, first_text_in, hrefs, json_ld, json_str, links_in, selector,
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
    id: "checkyourfact",
    name: "Check Your Fact",
    base_url: "https://checkyourfact.com",
    language: "eng",
};

const VOCABULARY: RatingVocabulary = &[
    ("true", True),
    ("false", False),
    ("misleading", Mixture),
    ("unsubstantiated", Other),
];

static LISTING: Lazy<Selector> = Lazy::new(|| selector("articles a[href]"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| selector("article h1"));
static READ_MORE: Lazy<Selector> = Lazy::new(|| selector("div#ob-read-more-selector"));
static FIRST_P: Lazy<Selector> = Lazy::new(|| selector("p"));
static ARTICLE: Lazy<Selector> = Lazy::new(|| selector("article"));
static BYLINE: Lazy<Selector> = Lazy::new(|| selector("article author"));
static TIME: Lazy<Selector> = Lazy::new(|| selector("article time"));

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckYourFact;

impl SourceExtractor for CheckYourFact {
    fn site(&self) -> &'static SiteInfo {
        &SITE
    }

    fn list_pages(&self) -> Box<dyn Iterator<Item = PageRef> + Send + '_> {
        Box::new(numbered_pages(0, 1, MAX_LISTING_PAGES, |n| {
            Request::get(format!("https://checkyourfact.com/page/{n}"))
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

fn verdict(doc: &Html) -> Option<String> {
    let text = body_text(doc.root_element())?;
    let line = text.lines().find(|l| l.contains("Verdict:"))?;
    line.rsplit(':').next().and_then(clean_opt)
}

fn parse_review(url: &str, doc: &Html) -> Result<RawRecord, ParseError> {
    let body_el = doc.select(&READ_MORE).next();
    let claim = body_el
        .and_then(|b| first_text_in(b, &FIRST_P))
        .ok_or(ParseError::Missing("first body paragraph"))?;
    let base = Url::parse(url).map_err(|_| ParseError::Missing("valid url"))?;

    let metadata = json_ld(doc);
    let graph_head = metadata
        .iter()
        .find_map(|v| v.get("@graph").and_then(|g| g.get(0)));
    let news_article = metadata
        .iter()
        .find(|v| v.get("@type").is_some_and(|t| t == "NewsArticle"));

    let claim_author = graph_head.and_then(|n| json_str(n, &["itemReviewed", "author", "name"]));
    let claim_date = graph_head
        .and_then(|n| json_str(n, &["itemReviewed", "datePublished"]))
        .and_then(|d| parse_date(&d, DateLocale::English));
    let review_author = news_article
        .and_then(|a| json_str(a, &["author", "name"]))
        .or_else(|| {
            first_text(doc, &BYLINE)
                .and_then(|b| b.split(['|', '\n']).next().and_then(clean_opt))
        });
    let review_author_url = first_attr(doc, &BYLINE, "data-slug")
        .and_then(|slug| clean_opt(&slug))
        .and_then(|slug| base.join(&format!("/author/{slug}")).ok())
        .map(String::from);
    let keywords: Vec<String> = metadata
        .iter()
        .find_map(|v| v.get("keywords"))
        .map(|k| match k {
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|i| i.as_str())
                .map(|s| s.replace('-', " "))
                .collect(),
            serde_json::Value::String(s) => s.split(',').map(|s| s.replace('-', " ")).collect(),
            _ => Vec::new(),
        })
        .unwrap_or_default();

    let date = first_attr(doc, &TIME, "datetime")
        .and_then(|d| parse_date(&d, DateLocale::English))
        .or_else(|| first_text(doc, &TIME).and_then(|d| parse_date(&d, DateLocale::English)));

    let title = first_text(doc, &HEADLINE).map(|t| t.replace("FACT CHECK: ", ""));

    let article = doc.select(&ARTICLE).next();
    let record = RawRecord::new(SITE.id, claim, url)?
        .with_rating(verdict(doc))
        .with_title(title)
        .with_review_author(review_author)
        .with_review_author_url(review_author_url)
        .with_claim_author(claim_author)
        .with_claim_date(claim_date)
        .with_date(date)
        .with_body(body_el.and_then(body_text))
        .with_links(article.map(|a| links_in(a, &base)).unwrap_or_default())
        .with_tags(keywords.iter().map(|k| k.trim()))
        .with_language(SITE.language);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const REVIEW_PAGE: &str = r#"
        <html><head>
          <script type="application/ld+json">{"@context":"https://schema.org","@type":"NewsArticle","author":{"name":"Ryan King"},"keywords":["fact-check","social-media"]}</script>
          <script type="application/ld+json">{"@context":"https://schema.org","@graph":[{"@type":"ClaimReview","itemReviewed":{"author":{"name":"Facebook user"},"datePublished":"2023-02-14"}}]}</script>
        </head><body>
          <article>
            <h1>FACT CHECK: Did A Senator Ban Chocolate?</h1>
            <author data-slug="ryan-king">Ryan King | Contributor</author>
            <time datetime="2023-02-17T09:54:00-05:00">9:54 AM 02/17/2023</time>
            <div id="ob-read-more-selector">
              <p>A viral post claims a senator banned chocolate.</p>
              <p>There is <a href="https://congress.gov/bill">no such bill</a>.</p>
              <p>Verdict: False</p>
              <script>ads()</script>
            </div>
          </article>
        </body></html>"#;

    #[test]
    fn test_listing_page_urls() {
        let page = CheckYourFact.list_pages().nth(4).unwrap();
        assert_eq!(page.request.url, "https://checkyourfact.com/page/5");
        let listing = CheckYourFact.parse_listing(
            &page,
            r#"<articles><a href="/2023/02/17/senator-chocolate/">a</a></articles><a href="/about">x</a>"#,
        );
        assert_eq!(
            listing.reviews,
            vec!["https://checkyourfact.com/2023/02/17/senator-chocolate/"]
        );
    }

    #[test]
    fn test_review_page_fields() {
        let url = "https://checkyourfact.com/2023/02/17/senator-chocolate/";
        let records = CheckYourFact.parse_page(url, REVIEW_PAGE);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.claim, "A viral post claims a senator banned chocolate.");
        assert_eq!(r.rating.as_deref(), Some("False"));
        assert_eq!(r.title.as_deref(), Some("Did A Senator Ban Chocolate?"));
        assert_eq!(r.review_author.as_deref(), Some("Ryan King"));
        assert_eq!(
            r.review_author_url.as_deref(),
            Some("https://checkyourfact.com/author/ryan-king")
        );
        assert_eq!(r.claim_author.as_deref(), Some("Facebook user"));
        assert_eq!(r.claim_date, NaiveDate::from_ymd_opt(2023, 2, 14));
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2023, 2, 17));
        assert!(r.tags.contains("social media"));
        assert_eq!(r.referred_links, vec!["https://congress.gov/bill"]);
        assert!(!r.body.as_deref().unwrap().contains("ads()"));
    }

    #[test]
    fn test_missing_verdict_is_absent() {
        let page = REVIEW_PAGE.replace("<p>Verdict: False</p>", "");
        let records = CheckYourFact.parse_page("https://checkyourfact.com/x/", &page);
        assert_eq!(records[0].rating, None);
    }
}
