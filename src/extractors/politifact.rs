//! [PolitiFact](https://www.politifact.com) fact checks.
//!
//! The listing is `/factchecks/?page=N`. The verdict is not printed as text:
//! it is the `alt` slug of the Truth-O-Meter image (`pants-fire`,
//! `barely-true`, ...), translated here to the label shown to readers.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::dates::{DateLocale, parse_date};
use super::html::{body_text_excluding, first_attr, first_text, hrefs, links_in, meta, selector};
use super::{
    Listing, MAX_LISTING_PAGES, PageRef, RatingVocabulary, SiteInfo, SourceExtractor, keep_parsed,
    numbered_pages,
};
use crate::error::ParseError;
use crate::fetch::Request;
use crate::models::{CanonicalRating::*, RawRecord};

static SITE: SiteInfo = SiteInfo {
    id: "politifact",
    name: "PolitiFact",
    base_url: "https://www.politifact.com",
    language: "eng",
};

const VOCABULARY: RatingVocabulary = &[
    ("true", True),
    ("mostly true", True),
    ("half true", Mixture),
    ("half false", Mixture),
    ("mostly false", False),
    ("barely true", False),
    ("false", False),
    ("pants on fire", False),
    ("full flop", Other),
    ("half flip", Other),
    ("no flip", Other),
];

static LISTING: Lazy<Selector> =
    Lazy::new(|| selector("article.m-statement div.m-statement__quote a[href]"));
static QUOTE: Lazy<Selector> = Lazy::new(|| selector("div.m-statement__quote"));
static RATING_IMG: Lazy<Selector> =
    Lazy::new(|| selector("div.m-statement__body img.c-image__original, div.m-statement__meter img.c-image__original"));
static CLAIMER: Lazy<Selector> = Lazy::new(|| selector("a.m-statement__name"));
static CLAIM_META: Lazy<Selector> = Lazy::new(|| selector("div.m-statement__meta"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h2.c-title"));
static AUTHOR: Lazy<Selector> = Lazy::new(|| selector("div.m-author__content a"));
static AUTHOR_DATE: Lazy<Selector> = Lazy::new(|| selector("span.m-author__date"));
static BODY: Lazy<Selector> = Lazy::new(|| selector("article.m-textblock"));
static TAGS: Lazy<Selector> = Lazy::new(|| selector("ul.m-list a"));

#[derive(Debug, Clone, Copy, Default)]
pub struct Politifact;

impl SourceExtractor for Politifact {
    fn site(&self) -> &'static SiteInfo {
        &SITE
    }

    fn list_pages(&self) -> Box<dyn Iterator<Item = PageRef> + Send + '_> {
        Box::new(numbered_pages(0, 1, MAX_LISTING_PAGES, |n| {
            Request::get(format!("https://www.politifact.com/factchecks/?page={n}"))
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

/// Label shown to readers for a Truth-O-Meter image slug.
fn translate_slug(slug: &str) -> Option<&'static str> {
    Some(match slug.trim() {
        "true" => "True",
        "mostly-true" => "Mostly True",
        "half-true" => "Half True",
        "barely-true" => "Mostly False",
        "false" => "False",
        "pants-fire" => "Pants on Fire",
        "full-flop" => "Full Flop",
        "half-flip" => "Half Flip",
        "no-flip" => "No Flip",
        _ => return None,
    })
}

/// Review date from `/factchecks/2024/mar/05/...` style URLs.
fn date_from_url(url: &str) -> Option<chrono::NaiveDate> {
    let path = Url::parse(url).ok()?;
    let mut segments = path.path_segments()?.skip_while(|s| *s != "factchecks").skip(1);
    let (year, month, day) = (segments.next()?, segments.next()?, segments.next()?);
    parse_date(&format!("{month} {day} {year}"), DateLocale::English)
}

fn parse_review(url: &str, doc: &Html) -> Result<RawRecord, ParseError> {
    let claim = first_text(doc, &QUOTE).ok_or(ParseError::Missing("statement quote"))?;
    let base = Url::parse(url).map_err(|_| ParseError::Missing("valid url"))?;

    let rating = first_attr(doc, &RATING_IMG, "alt")
        .map(|alt| translate_slug(&alt).map(str::to_string).unwrap_or(alt));

    let date = first_text(doc, &AUTHOR_DATE)
        .and_then(|d| parse_date(&d, DateLocale::English))
        .or_else(|| meta(doc, "og:url").and_then(|u| date_from_url(&u)))
        .or_else(|| date_from_url(url));

    // "stated on March 3, 2024 in a Facebook post:"
    let claim_date = first_text(doc, &CLAIM_META).and_then(|m| {
        let after = m.split(" on ").nth(1)?;
        let stated = after.split(" in ").next()?;
        parse_date(stated, DateLocale::English)
    });

    let article = doc.select(&BODY).next();
    let record = RawRecord::new(SITE.id, claim, url)?
        .with_rating(rating)
        .with_title(first_text(doc, &TITLE))
        .with_review_author(first_text(doc, &AUTHOR))
        .with_review_author_url(hrefs(doc, &AUTHOR, &base).into_iter().next())
        .with_claim_author(first_text(doc, &CLAIMER))
        .with_date(date)
        .with_claim_date(claim_date)
        .with_body(article.and_then(|a| body_text_excluding(a, &["factbox", "o-pick"])))
        .with_links(article.map(|a| links_in(a, &base)).unwrap_or_default())
        .with_tags(doc.select(&TAGS).map(super::html::text))
        .with_language(SITE.language);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const LISTING_PAGE: &str = r#"
        <ul class="o-listicle__list">
          <li><article class="m-statement">
            <div class="m-statement__quote"><a href="/factchecks/2024/mar/05/jane-doe/moon-cheese/">The moon is made of cheese</a></div>
          </article></li>
          <li><article class="m-statement">
            <div class="m-statement__quote"><a href="/factchecks/2024/mar/04/john-roe/tax-cut/">Taxes fell by half</a></div>
          </article></li>
        </ul>"#;

    const REVIEW_PAGE: &str = r#"
        <html><head><meta property="og:url" content="https://www.politifact.com/factchecks/2024/mar/05/jane-doe/moon-cheese/"></head>
        <body>
          <div class="m-statement">
            <a class="m-statement__name" href="/personalities/jane-doe/">Jane Doe</a>
            <div class="m-statement__desc">stated on March 3, 2024 in a Facebook post:</div>
            <div class="m-statement__meta">stated on March 3, 2024 in a Facebook post:</div>
            <div class="m-statement__body">
              <div class="m-statement__quote">
                “The moon is made of cheese.”
              </div>
              <div class="c-image"><picture><img class="c-image__original" src="/x.jpg" alt="pants-fire"></picture></div>
            </div>
          </div>
          <h2 class="c-title">No, the moon is rock</h2>
          <div class="m-author__content copy-xs u-color--chateau"><a href="/staff/sam/">Sam Writer</a><span class="m-author__date">March 5, 2024</span></div>
          <ul class="m-list m-list--horizontal"><li><a href="/facebook-fact-checks/">Facebook Fact-checks</a></li><li><a href="/science/">Science</a></li></ul>
          <article class="m-textblock">
            <p>Samples returned by <a href="https://nasa.gov/apollo">Apollo</a> are basalt.</p>
            <div class="factbox">Our sources</div>
            <section class="o-pick">Related</section>
            <script>track();</script>
            <p>See also <a href="/article/2023/jan/01/moon/">our earlier check</a>.</p>
          </article>
        </body></html>"#;

    #[test]
    fn test_listing_links_are_absolute() {
        let page = Politifact.list_pages().next().unwrap();
        assert_eq!(page.request.url, "https://www.politifact.com/factchecks/?page=1");
        let listing = Politifact.parse_listing(&page, LISTING_PAGE);
        assert_eq!(
            listing.reviews,
            vec![
                "https://www.politifact.com/factchecks/2024/mar/05/jane-doe/moon-cheese/",
                "https://www.politifact.com/factchecks/2024/mar/04/john-roe/tax-cut/",
            ]
        );
        assert!(!listing.last_page);
    }

    #[test]
    fn test_review_page_fields() {
        let url = "https://www.politifact.com/factchecks/2024/mar/05/jane-doe/moon-cheese/";
        let records = Politifact.parse_page(url, REVIEW_PAGE);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.source, "politifact");
        assert_eq!(r.claim, "The moon is made of cheese.");
        assert_eq!(r.rating.as_deref(), Some("Pants on Fire"));
        assert_eq!(r.claim_author.as_deref(), Some("Jane Doe"));
        assert_eq!(r.review_author.as_deref(), Some("Sam Writer"));
        assert_eq!(
            r.review_author_url.as_deref(),
            Some("https://www.politifact.com/staff/sam/")
        );
        assert_eq!(r.title.as_deref(), Some("No, the moon is rock"));
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(r.claim_date, NaiveDate::from_ymd_opt(2024, 3, 3));
        assert_eq!(
            r.referred_links,
            vec![
                "https://nasa.gov/apollo",
                "https://www.politifact.com/article/2023/jan/01/moon/",
            ]
        );
        assert!(r.tags.contains("Science"));
        let body = r.body.as_deref().unwrap();
        assert!(body.contains("are basalt."));
        assert!(!body.contains("Our sources"));
        assert!(!body.contains("track()"));
        assert_eq!(r.language.as_deref(), Some("eng"));
    }

    #[test]
    fn test_date_falls_back_to_url() {
        let url = "https://www.politifact.com/factchecks/2022/nov/14/someone/claim/";
        assert_eq!(date_from_url(url), NaiveDate::from_ymd_opt(2022, 11, 14));
        assert_eq!(date_from_url("https://www.politifact.com/about/"), None);
    }

    #[test]
    fn test_page_without_quote_yields_nothing() {
        let records = Politifact.parse_page(
            "https://www.politifact.com/factchecks/x/",
            "<html><body><h2 class=\"c-title\">Only a title</h2></body></html>",
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_unknown_slug_is_kept_verbatim() {
        assert_eq!(translate_slug("barely-true"), Some("Mostly False"));
        assert_eq!(translate_slug("something-new"), None);
    }
}
